//! Participants: the named, colored combatants occupying seats

use crate::{JoinerIndex, Motion, OccupantKind, ParticipantId, SeatIndex, Value, ValueMap, Vec2};
use serde::{Deserialize, Serialize};

/// Well-known metadata keys
pub mod meta {
    /// Whether the participant is driven by something other than this process's human
    pub const REMOTE: &str = "remote";
    /// Index of the joiner that owns the participant
    pub const JOINER_INDEX: &str = "joiner_index";
    /// Whether the participant is AI-controlled
    pub const BOT: &str = "bot";
}

/// Wire description of a participant, as carried by snapshots
///
/// `id` is optional because descriptors arrive from the network; entries
/// without an identity are skipped during reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantState {
    pub id: Option<ParticipantId>,
    pub name: String,
    pub color: String,
    pub seat: SeatIndex,
    pub alive: bool,
    pub position: Vec2,
    pub metadata: ValueMap,
}

impl ParticipantState {
    /// Create a live descriptor at the origin
    pub fn new(id: ParticipantId, name: impl Into<String>, seat: SeatIndex) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            color: String::from("#ffffff"),
            seat,
            alive: true,
            position: Vec2::ZERO,
            metadata: ValueMap::new(),
        }
    }

    /// Set the display color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Tag the participant as owned by a joiner
    pub fn owned_by(mut self, joiner: JoinerIndex) -> Self {
        self.metadata
            .insert(meta::JOINER_INDEX.to_string(), Value::from(joiner.raw()));
        self
    }

    /// Tag the participant as AI-controlled
    pub fn as_bot(mut self) -> Self {
        self.metadata.insert(meta::BOT.to_string(), Value::Flag(true));
        self
    }

    /// Set the authoritative position
    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Owning joiner, read from metadata
    pub fn joiner_index(&self) -> Option<JoinerIndex> {
        joiner_from_meta(&self.metadata)
    }

    /// Check the bot marker
    pub fn is_bot(&self) -> bool {
        is_bot_meta(&self.metadata)
    }
}

/// A participant as known to the local roster
///
/// Carries the locally-owned [`Motion`] so that updates in place keep
/// interpolation continuous.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub color: String,
    pub seat: SeatIndex,
    pub alive: bool,
    pub metadata: ValueMap,
    pub motion: Motion,
}

impl Participant {
    /// Build a participant from a descriptor, stamping the locally computed remote flag
    pub fn from_state(id: ParticipantId, state: &ParticipantState, remote: bool) -> Self {
        let mut metadata = state.metadata.clone();
        metadata.insert(meta::REMOTE.to_string(), Value::Flag(remote));
        Self {
            id,
            name: state.name.clone(),
            color: state.color.clone(),
            seat: state.seat,
            alive: state.alive,
            metadata,
            motion: Motion::new(),
        }
    }

    /// Merge a newer descriptor into this participant
    ///
    /// The locally computed remote marker and the motion state are never
    /// overwritten. `name_override` replaces the descriptor's name (pending
    /// local rename). Returns true if anything visible changed.
    pub fn merge(&mut self, state: &ParticipantState, name_override: Option<&str>) -> bool {
        let mut changed = false;

        let name = name_override.unwrap_or(&state.name);
        if self.name != name {
            self.name = name.to_string();
            changed = true;
        }
        if self.color != state.color {
            self.color = state.color.clone();
            changed = true;
        }
        if self.alive != state.alive {
            self.alive = state.alive;
            changed = true;
        }
        if self.seat != state.seat {
            self.seat = state.seat;
            changed = true;
        }
        for (key, value) in state.metadata.iter() {
            if key == meta::REMOTE {
                continue;
            }
            if self.metadata.get(key) != Some(value) {
                self.metadata.insert(key.clone(), value.clone());
                changed = true;
            }
        }

        changed
    }

    /// Owning joiner, read from metadata
    pub fn joiner_index(&self) -> Option<JoinerIndex> {
        joiner_from_meta(&self.metadata)
    }

    /// Check the bot marker
    pub fn is_bot(&self) -> bool {
        is_bot_meta(&self.metadata)
    }

    /// Check the locally computed remote marker
    pub fn is_remote(&self) -> bool {
        self.metadata
            .get(meta::REMOTE)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Seat occupant kind derived from the markers
    pub fn kind(&self) -> OccupantKind {
        if self.is_bot() {
            OccupantKind::Bot
        } else if self.is_remote() {
            OccupantKind::HumanRemote
        } else {
            OccupantKind::HumanLocal
        }
    }

    /// Describe this participant for a snapshot
    ///
    /// The local remote marker is not part of the wire description.
    pub fn to_state(&self) -> ParticipantState {
        let mut metadata = self.metadata.clone();
        metadata.shift_remove(meta::REMOTE);
        ParticipantState {
            id: Some(self.id),
            name: self.name.clone(),
            color: self.color.clone(),
            seat: self.seat,
            alive: self.alive,
            position: self.motion.target(),
            metadata,
        }
    }
}

fn joiner_from_meta(metadata: &ValueMap) -> Option<JoinerIndex> {
    metadata
        .get(meta::JOINER_INDEX)
        .and_then(Value::as_int)
        .and_then(|i| u8::try_from(i).ok())
        .map(JoinerIndex::new)
}

fn is_bot_meta(metadata: &ValueMap) -> bool {
    metadata
        .get(meta::BOT)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_markers() {
        let state = ParticipantState::new(ParticipantId::new(3), "Vex", SeatIndex::new(1))
            .owned_by(JoinerIndex::new(0));
        assert_eq!(state.joiner_index(), Some(JoinerIndex::new(0)));
        assert!(!state.is_bot());

        let bot = ParticipantState::new(ParticipantId::new(4), "Bot", SeatIndex::new(2)).as_bot();
        assert!(bot.is_bot());
        assert_eq!(bot.joiner_index(), None);
    }

    #[test]
    fn test_kind() {
        let state = ParticipantState::new(ParticipantId::new(1), "Host", SeatIndex::HOST);
        assert_eq!(
            Participant::from_state(ParticipantId::new(1), &state, false).kind(),
            OccupantKind::HumanLocal
        );
        assert_eq!(
            Participant::from_state(ParticipantId::new(1), &state, true).kind(),
            OccupantKind::HumanRemote
        );
        let bot = state.clone().as_bot();
        assert_eq!(
            Participant::from_state(ParticipantId::new(1), &bot, true).kind(),
            OccupantKind::Bot
        );
    }

    #[test]
    fn test_merge_keeps_local_remote_flag() {
        let id = ParticipantId::new(7);
        let state = ParticipantState::new(id, "Ash", SeatIndex::new(2));
        let mut participant = Participant::from_state(id, &state, true);

        let mut newer = state.clone().with_color("#ff0000");
        newer
            .metadata
            .insert(meta::REMOTE.to_string(), Value::Flag(false));

        assert!(participant.merge(&newer, None));
        assert!(participant.is_remote());
        assert_eq!(participant.color, "#ff0000");

        // Same descriptor again is not a change
        assert!(!participant.merge(&newer, None));
    }

    #[test]
    fn test_merge_name_override() {
        let id = ParticipantId::new(7);
        let state = ParticipantState::new(id, "Player 2", SeatIndex::new(1));
        let mut participant = Participant::from_state(id, &state, false);
        participant.name = "Kestrel".to_string();

        assert!(!participant.merge(&state, Some("Kestrel")));
        assert_eq!(participant.name, "Kestrel");
    }

    #[test]
    fn test_to_state_strips_remote_marker() {
        let id = ParticipantId::new(2);
        let state = ParticipantState::new(id, "Rook", SeatIndex::new(3)).owned_by(JoinerIndex::new(1));
        let participant = Participant::from_state(id, &state, true);

        let described = participant.to_state();
        assert!(!described.metadata.contains_key(meta::REMOTE));
        assert_eq!(described.joiner_index(), Some(JoinerIndex::new(1)));
    }

    #[test]
    fn test_descriptor_ron_shape() {
        let state = ParticipantState::new(ParticipantId::new(5), "Nia", SeatIndex::new(1))
            .owned_by(JoinerIndex::new(0));
        let text = ron::to_string(&state).unwrap();
        let back: ParticipantState = ron::from_str(&text).unwrap();
        assert_eq!(back, state);
    }
}
