//! Error types for melee-draft

use melee_core::{JoinerIndex, ParticipantId};
use melee_netcode::OfferKind;
use thiserror::Error;

/// Draft error type
///
/// Remote pick and hover rejections are reported with these variants so the
/// session can log why a message was dropped. None of them close the offer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("No offer is open")]
    NoOpenOffer,

    #[error("This process is not the chooser for the open offer")]
    NotLocalChooser,

    #[error("A pick was already sent, waiting for the host to confirm")]
    AwaitingConfirmation,

    #[error("Unknown choice: {0}")]
    UnknownChoice(String),

    #[error("Choice index {index} out of range ({len} choices)")]
    ChoiceOutOfRange { index: usize, len: usize },

    #[error("Offer kind mismatch: open offer is {open:?}, message names {got:?}")]
    KindMismatch { open: OfferKind, got: OfferKind },

    #[error("Responder mismatch: open offer expects {expected:?}, got {got}")]
    ResponderMismatch {
        expected: Option<JoinerIndex>,
        got: JoinerIndex,
    },

    #[error("Target mismatch: open offer targets {expected:?}, message names {got:?}")]
    TargetMismatch {
        expected: Option<ParticipantId>,
        got: Option<ParticipantId>,
    },

    #[error("Only the host may do this")]
    NotHost,

    #[error("Only a joiner may do this")]
    NotJoiner,

    #[error("Capability not configured: {0}")]
    CapabilityMissing(&'static str),

    #[error("Effect failed: {0}")]
    Effect(String),

    #[error("An offer needs at least one choice")]
    EmptyOffer,
}

/// Result type for draft operations
pub type Result<T> = std::result::Result<T, Error>;
