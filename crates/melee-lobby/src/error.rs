//! Error types for melee-lobby

use melee_core::{JoinerIndex, SeatIndex};
use thiserror::Error;

/// Lobby error type
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("Only the host may do this")]
    NotHost,

    #[error("Only a joiner may do this")]
    NotJoiner,

    #[error("Seat {0} is empty")]
    SeatEmpty(SeatIndex),

    #[error("Seat {0} is occupied by a bot")]
    BotSeat(SeatIndex),

    #[error("{joiner} does not own seat {seat}")]
    NotSeatOwner { seat: SeatIndex, joiner: JoinerIndex },

    #[error("This process has no seated participant")]
    NotSeated,

    #[error("Seats not ready: {0:?}")]
    NotAllReady(Vec<SeatIndex>),
}

/// Result type for lobby operations
pub type Result<T> = std::result::Result<T, Error>;
