//! Wire protocol
//!
//! Every message exchanged between host and joiners over the reliable,
//! ordered channel. Encoded with bincode.

use crate::{Choice, EntityState, OfferKind, Result, Snapshot};
use melee_core::{JoinerIndex, ParticipantId, SeatIndex, ValueMap, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Layout for a fresh round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReset {
    pub obstacles: Vec<EntityState>,
    pub spawns: Vec<(ParticipantId, Vec2)>,
    pub settings: ValueMap,
}

/// Held movement keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveKeys {
    /// Unit-ish direction from the held keys
    pub fn direction(&self) -> Vec2 {
        let x = (self.right as i8 - self.left as i8) as f32;
        let y = (self.down as i8 - self.up as i8) as f32;
        Vec2::new(x, y)
    }
}

/// One frame of joiner input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    pub joiner: JoinerIndex,
    pub keys: MoveKeys,
    pub aim: Vec2,
    pub shoot: bool,
    pub dash: bool,
}

/// An offer being presented
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardOffer {
    pub kind: OfferKind,
    pub target: Option<ParticipantId>,
    pub choices: Vec<Choice>,
    /// Joiner allowed to respond; `None` means the host responds
    pub responder: Option<JoinerIndex>,
}

/// Hover/focus mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardHover {
    pub target: Option<ParticipantId>,
    pub index: Option<usize>,
    pub responder: Option<JoinerIndex>,
    /// Joiner the hover came from; `None` when the host originated it
    pub origin: Option<JoinerIndex>,
}

/// Pick request from a joiner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSelect {
    pub choice: String,
    pub target: Option<ParticipantId>,
    pub kind: OfferKind,
    pub joiner: JoinerIndex,
}

/// The host's final word on an offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardApply {
    pub choice: String,
    pub target: Option<ParticipantId>,
    pub kind: OfferKind,
}

/// Readiness traffic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadyState {
    /// A joiner asks to set its own seat's readiness
    Request {
        joiner: JoinerIndex,
        seat: SeatIndex,
        ready: bool,
    },
    /// The host's full seat → ready map
    Full(BTreeMap<SeatIndex, bool>),
}

/// A joiner renames its own participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rename {
    pub joiner: JoinerIndex,
    pub name: String,
}

/// Everything that crosses the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    StateUpdate(Snapshot),
    RoundReset(RoundReset),
    Input(InputFrame),
    CardOffer(CardOffer),
    CardHover(CardHover),
    CardSelect(CardSelect),
    CardApply(CardApply),
    ReadyState(ReadyState),
    Rename(Rename),
}

impl Message {
    /// Protocol name, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Message::StateUpdate(_) => "state-update",
            Message::RoundReset(_) => "round-reset",
            Message::Input(_) => "input",
            Message::CardOffer(_) => "card-offer",
            Message::CardHover(_) => "card-hover",
            Message::CardSelect(_) => "card-select",
            Message::CardApply(_) => "card-apply",
            Message::ReadyState(_) => "ready-state",
            Message::Rename(_) => "rename",
        }
    }

    /// Encode to bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
