//! Error types for melee-session

use melee_core::JoinerIndex;
use thiserror::Error;

/// Session error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("core error: {0}")]
    Core(#[from] melee_core::Error),

    #[error("netcode error: {0}")]
    Netcode(#[from] melee_netcode::Error),

    #[error("draft error: {0}")]
    Draft(#[from] melee_draft::Error),

    #[error("lobby error: {0}")]
    Lobby(#[from] melee_lobby::Error),

    /// A message claims to come from a different joiner than the one that sent it
    #[error("{sender} sent a message claiming to be {claimed:?}")]
    SpoofedSender {
        sender: JoinerIndex,
        claimed: Option<JoinerIndex>,
    },

    #[error("Joiner slot out of range: {0}")]
    UnknownJoiner(JoinerIndex),

    #[error("{0} is already seated")]
    AlreadySeated(JoinerIndex),

    #[error("{0} has no seated participant")]
    NotSeated(JoinerIndex),

    #[error("Unexpected {0} message")]
    UnexpectedMessage(&'static str),

    #[error("The match has already started")]
    AlreadyStarted,

    #[error("Not connected to a host")]
    Disconnected,
}

impl Error {
    /// Check if this is a spoofing attempt rather than a stale or malformed message
    pub fn is_spoof(&self) -> bool {
        matches!(self, Error::SpoofedSender { .. })
    }
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, Error>;
