//! Error types for melee-netcode

use melee_core::Millis;
use thiserror::Error;

/// Netcode error type
#[derive(Debug, Error)]
pub enum Error {
    /// Snapshot older than one already applied
    #[error("Snapshot at {timestamp} is older than the last applied snapshot at {last}")]
    StaleSnapshot { timestamp: Millis, last: Millis },

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Core error
    #[error("core error: {0}")]
    Core(#[from] melee_core::Error),
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type for netcode operations
pub type Result<T> = std::result::Result<T, Error>;
