//! Error types for melee-core

use crate::{ParticipantId, SeatIndex};
use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Seat {seat} is out of range (table has {count} seats)")]
    SeatOutOfRange { seat: SeatIndex, count: usize },

    #[error("Seat {seat} is already occupied by {occupant}")]
    SeatOccupied {
        seat: SeatIndex,
        occupant: ParticipantId,
    },

    #[error("Participant descriptor has no identity")]
    MissingIdentity,

    #[error("No free seat available")]
    NoFreeSeat,

    #[error("Participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    #[error("Seat 0 is reserved for the host's local participant")]
    HostSeatReserved,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
