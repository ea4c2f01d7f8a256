use std::fmt;

use crate::zone::ZoneId;

/// Reasons an option payload is rejected by the validator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} required")]
    MissingField { field: String },

    #[error("{field} ({expected}) expected, got: {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{field}. Invalid value '{value}'")]
    InvalidValue { field: String, value: String },

    #[error("Invalid option '{key}'")]
    UnknownOption { key: String },
}

/// Why an API call was refused by the session gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReadyReason {
    /// `init()` was never called (or the session was torn down)
    NotInitialized,
    /// `init()` was called but the SDK has not finished configuring
    InitInFlight,
}

impl fmt::Display for NotReadyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotReadyReason::NotInitialized => {
                write!(f, "init() must be called before calling other API functions")
            }
            NotReadyReason::InitInFlight => {
                write!(f, "Please wait for the 'init' event before calling other API functions")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("zoneName '{zone}' doesn't exist")]
    UnknownZone { zone: String },

    #[error("zone id '{id}' is already registered as '{existing}', cannot register it as '{name}'")]
    DuplicateZone {
        id: ZoneId,
        existing: String,
        name: String,
    },

    #[error("{api}: {reason}")]
    NotReady {
        api: &'static str,
        reason: NotReadyReason,
    },

    #[error("No ad available for zone '{zone}'")]
    NoAdAvailable { zone: String },

    #[error("init() should only be called once")]
    AlreadyInitialized,
}
