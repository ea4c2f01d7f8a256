//! Ad zones.
//!
//! A zone is a named ad placement. The host refers to zones by name, the SDK by id;
//! the [`ZoneRegistry`] maps one to the other and owns the state of each zone.
//! [`ZoneLifecycle`] moves that state along as the host and the SDK act on it.

mod lifecycle;
mod listener;
mod registry;
mod state;

pub use lifecycle::ZoneLifecycle;
pub use listener::RequestId;
pub use registry::ZoneRegistry;
pub use state::{ZoneId, ZoneState, ZoneStatus};

pub(crate) use listener::{RewardRelay, ZoneListener};
pub(crate) use registry::lock_zone;
