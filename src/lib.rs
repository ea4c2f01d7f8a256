//! Event bridge between the AdColony ad SDK and a host scripting runtime.
//!
//! The SDK calls back on its own threads, in no particular order. The host runtime
//! consumes events on a single serialized context. This crate sits in between: it tracks
//! the state of every configured ad zone, turns SDK callbacks into [`HostEvent`]s and
//! delivers them on the host context, one at a time and in order.
//!
//! Start with [`AdBridge`].

pub mod bridge;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod executor;
pub mod host;
pub mod options;
pub mod sdk;
pub mod session;
pub mod zone;

pub use bridge::AdBridge;
pub use config::{BridgeConfig, BridgeConfigError};
pub use errors::{BridgeError, NotReadyReason, ValidationError};
pub use events::{AdKind, CanonicalEvent, HostEvent, Phase};
pub use executor::{ExecutionContext, SerialExecutor};
pub use host::HostListener;
pub use options::{LoadOptions, SessionConfig};
pub use zone::{ZoneId, ZoneStatus};
