//! Draft offer descriptors shared by the wire protocol and the arbiter

use melee_core::{JoinerIndex, ParticipantId, Value, ValueMap};
use serde::{Deserialize, Serialize};

/// What an offer rewards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferKind {
    /// A modifier for one participant
    ParticipantReward,
    /// A modifier affecting the whole arena
    WorldWide,
}

/// A normalized choice descriptor
///
/// Names and descriptive fields only; what picking it does is up to the
/// effect collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub name: String,
    pub description: String,
    pub fields: ValueMap,
}

impl Choice {
    /// Create a choice
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            fields: ValueMap::new(),
        }
    }

    /// Add a descriptive field (rarity, icon, stat deltas for display)
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Compact description of the open offer, carried on snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSummary {
    pub kind: OfferKind,
    pub target: Option<ParticipantId>,
    pub responder: Option<JoinerIndex>,
}
