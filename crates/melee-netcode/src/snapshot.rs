//! Snapshot data model
//!
//! A snapshot is produced by the host every broadcast interval and fully
//! describes the world. Snapshots are totally ordered by `timestamp`.

use crate::DraftSummary;
use melee_core::{Millis, ParticipantId, ParticipantState, Value, ValueMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State of an entity with no identity across snapshots
///
/// Projectiles, area effects and environmental objects are replaced
/// wholesale on every applied snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Entity kind, used to pick a codec
    pub kind: String,
    /// Codec-defined fields
    pub fields: ValueMap,
}

impl EntityState {
    /// Create an empty entity state of a kind
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: ValueMap::new(),
        }
    }

    /// Set a field
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Get a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a numeric field as f64
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_float)
    }
}

/// Round and match counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCounters {
    pub round: u32,
    pub match_number: u32,
    pub wins: BTreeMap<ParticipantId, u32>,
}

/// One authoritative, timestamped full-world description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Host-assigned timestamp
    pub timestamp: Millis,
    pub counters: MatchCounters,
    pub participants: Vec<ParticipantState>,
    pub projectiles: Vec<EntityState>,
    pub effects: Vec<EntityState>,
    pub obstacles: Vec<EntityState>,
    /// The offer open on the host, if any
    pub draft: Option<DraftSummary>,
    /// Whether the host's simulation is paused for a pick
    pub paused: bool,
}

impl Snapshot {
    /// Create an empty snapshot
    pub fn new(timestamp: Millis) -> Self {
        Self {
            timestamp,
            counters: MatchCounters::default(),
            participants: Vec::new(),
            projectiles: Vec::new(),
            effects: Vec::new(),
            obstacles: Vec::new(),
            draft: None,
            paused: false,
        }
    }

    /// Set the participant list
    pub fn with_participants(mut self, participants: Vec<ParticipantState>) -> Self {
        self.participants = participants;
        self
    }

    /// Find a participant descriptor
    pub fn participant(&self, id: ParticipantId) -> Option<&ParticipantState> {
        self.participants.iter().find(|p| p.id == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use melee_core::SeatIndex;

    #[test]
    fn test_entity_state_fields() {
        let bullet = EntityState::new("projectile")
            .with("x", 12.5f64)
            .with("owner", 3i64);
        assert_eq!(bullet.get_number("x"), Some(12.5));
        assert_eq!(bullet.get_number("owner"), Some(3.0));
        assert!(bullet.get("missing").is_none());
    }

    #[test]
    fn test_participant_lookup() {
        let snapshot = Snapshot::new(100).with_participants(vec![ParticipantState::new(
            ParticipantId::new(1),
            "Host",
            SeatIndex::HOST,
        )]);
        assert!(snapshot.participant(ParticipantId::new(1)).is_some());
        assert!(snapshot.participant(ParticipantId::new(2)).is_none());
    }
}
