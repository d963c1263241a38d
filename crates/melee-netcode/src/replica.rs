//! The joiner's local copy of the world
//!
//! Fed exclusively by the interpolator (snapshots) and by round resets. The
//! roster keeps identity-bearing participants; everything else is replaced
//! wholesale.

use crate::{DraftSummary, EntityState, Error, MatchCounters, Result, RoundReset, Snapshot};
use melee_core::{
    Millis, OccupantKind, ParticipantId, Role, Roster, SeatChange, SeatIndex, ValueMap, Vec2,
};
use std::collections::HashSet;
use tracing::debug;

/// A participant as it should be drawn this frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedParticipant {
    pub id: ParticipantId,
    pub seat: SeatIndex,
    pub name: String,
    pub color: String,
    pub alive: bool,
    pub kind: OccupantKind,
    pub position: Vec2,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderFrame {
    pub participants: Vec<RenderedParticipant>,
    pub projectiles: Vec<EntityState>,
    pub effects: Vec<EntityState>,
    pub obstacles: Vec<EntityState>,
    pub paused: bool,
}

/// Draws a frame. Implemented by the presentation layer.
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame);
}

/// Joiner-side world state
#[derive(Debug)]
pub struct Replica {
    roster: Roster,
    projectiles: Vec<EntityState>,
    effects: Vec<EntityState>,
    obstacles: Vec<EntityState>,
    counters: MatchCounters,
    draft: Option<DraftSummary>,
    paused: bool,
    settings: ValueMap,
    last_timestamp: Option<Millis>,
}

impl Replica {
    /// Create an empty replica
    pub fn new(role: Role, seat_count: u8) -> Self {
        Self {
            roster: Roster::new(role, seat_count),
            projectiles: Vec::new(),
            effects: Vec::new(),
            obstacles: Vec::new(),
            counters: MatchCounters::default(),
            draft: None,
            paused: false,
            settings: ValueMap::new(),
            last_timestamp: None,
        }
    }

    /// Apply one snapshot
    ///
    /// With `defer_positions`, known participants blend from their rendered
    /// position to the new one over `blend` milliseconds; otherwise (and for
    /// participants seen for the first time) they snap.
    pub fn apply_snapshot(
        &mut self,
        snapshot: Snapshot,
        defer_positions: bool,
        now: Millis,
        blend: Millis,
    ) -> Result<Vec<SeatChange>> {
        if let Some(last) = self.last_timestamp {
            if snapshot.timestamp < last {
                return Err(Error::StaleSnapshot {
                    timestamp: snapshot.timestamp,
                    last,
                });
            }
        }

        let changes = self.roster.reconcile(&snapshot.participants);

        let mut positioned = HashSet::new();
        for state in &snapshot.participants {
            let Some(id) = state.id else {
                continue;
            };
            if !positioned.insert(id) {
                continue;
            }
            let Some(participant) = self.roster.get_mut(id) else {
                continue;
            };
            if participant.seat != state.seat {
                continue;
            }
            if defer_positions {
                participant.motion.blend_to(state.position, now, blend);
            } else {
                participant.motion.snap(state.position);
            }
        }

        self.projectiles = snapshot.projectiles;
        self.effects = snapshot.effects;
        self.obstacles = snapshot.obstacles;
        self.counters = snapshot.counters;
        self.draft = snapshot.draft;
        self.paused = snapshot.paused;
        self.last_timestamp = Some(snapshot.timestamp);

        Ok(changes)
    }

    /// Lay out a new round: new obstacles, participants snapped to spawn
    pub fn apply_round_reset(&mut self, reset: &RoundReset) {
        self.obstacles = reset.obstacles.clone();
        self.projectiles.clear();
        self.effects.clear();
        self.settings = reset.settings.clone();
        for (id, position) in &reset.spawns {
            match self.roster.get_mut(*id) {
                Some(participant) => participant.motion.snap(*position),
                None => debug!(%id, "round reset names an unknown participant"),
            }
        }
    }

    /// Interpolated view for drawing at `now`
    pub fn render_frame(&self, now: Millis) -> RenderFrame {
        RenderFrame {
            participants: self
                .roster
                .by_seat()
                .filter(|participant| participant.motion.is_initialized())
                .map(|participant| RenderedParticipant {
                    id: participant.id,
                    seat: participant.seat,
                    name: participant.name.clone(),
                    color: participant.color.clone(),
                    alive: participant.alive,
                    kind: participant.kind(),
                    position: participant.motion.sample(now),
                })
                .collect(),
            projectiles: self.projectiles.clone(),
            effects: self.effects.clone(),
            obstacles: self.obstacles.clone(),
            paused: self.paused,
        }
    }

    /// Forget when the last snapshot was applied and mark all motion stale
    pub fn invalidate(&mut self) {
        self.last_timestamp = None;
        self.roster.invalidate_motion();
    }

    /// Drop all world state (host departure)
    pub fn clear(&mut self) {
        self.roster.reset();
        self.projectiles.clear();
        self.effects.clear();
        self.obstacles.clear();
        self.counters = MatchCounters::default();
        self.draft = None;
        self.paused = false;
        self.settings.clear();
        self.last_timestamp = None;
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    pub fn projectiles(&self) -> &[EntityState] {
        &self.projectiles
    }

    pub fn effects(&self) -> &[EntityState] {
        &self.effects
    }

    pub fn obstacles(&self) -> &[EntityState] {
        &self.obstacles
    }

    pub fn counters(&self) -> &MatchCounters {
        &self.counters
    }

    /// The offer the host reported open in the last applied snapshot
    pub fn draft(&self) -> Option<&DraftSummary> {
        self.draft.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Settings from the last round reset
    pub fn settings(&self) -> &ValueMap {
        &self.settings
    }

    /// Host timestamp of the last applied snapshot
    pub fn last_timestamp(&self) -> Option<Millis> {
        self.last_timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use melee_core::{JoinerIndex, ParticipantState, Value};

    fn role() -> Role {
        Role::Joiner(JoinerIndex::new(0))
    }

    fn snapshot(timestamp: Millis, x: f32) -> Snapshot {
        let mut snapshot = Snapshot::new(timestamp).with_participants(vec![
            ParticipantState::new(ParticipantId::new(1), "Host", SeatIndex::HOST)
                .at(Vec2::new(x, 0.0)),
        ]);
        snapshot
            .projectiles
            .push(EntityState::new("projectile").with("t", timestamp as i64));
        snapshot
    }

    #[test]
    fn test_first_apply_snaps_then_blends() {
        let mut replica = Replica::new(role(), 4);
        replica.apply_snapshot(snapshot(0, 0.0), false, 0, 20).unwrap();
        replica.apply_snapshot(snapshot(50, 10.0), true, 100, 20).unwrap();

        let frame = replica.render_frame(110);
        assert_eq!(frame.participants[0].position, Vec2::new(5.0, 0.0));
        let frame = replica.render_frame(130);
        assert_eq!(frame.participants[0].position, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_transients_replaced_wholesale() {
        let mut replica = Replica::new(role(), 4);
        replica.apply_snapshot(snapshot(0, 0.0), false, 0, 20).unwrap();
        replica.apply_snapshot(snapshot(50, 0.0), true, 50, 20).unwrap();

        assert_eq!(replica.projectiles().len(), 1);
        assert_eq!(
            replica.projectiles()[0].get("t").and_then(Value::as_int),
            Some(50)
        );
    }

    #[test]
    fn test_stale_snapshot_rejected() {
        let mut replica = Replica::new(role(), 4);
        replica.apply_snapshot(snapshot(100, 1.0), false, 0, 20).unwrap();

        let err = replica
            .apply_snapshot(snapshot(50, 9.0), true, 10, 20)
            .unwrap_err();
        assert!(matches!(err, Error::StaleSnapshot { timestamp: 50, last: 100 }));
        assert_eq!(
            replica.roster().get(ParticipantId::new(1)).unwrap().motion.target(),
            Vec2::new(1.0, 0.0)
        );
    }

    #[test]
    fn test_round_reset_snaps_to_spawn() {
        let mut replica = Replica::new(role(), 4);
        replica.apply_snapshot(snapshot(0, 0.0), false, 0, 20).unwrap();
        replica.apply_snapshot(snapshot(50, 10.0), true, 50, 20).unwrap();

        let mut settings = ValueMap::new();
        settings.insert("round_time".into(), Value::Int(60));
        replica.apply_round_reset(&RoundReset {
            obstacles: vec![EntityState::new("pillar")],
            spawns: vec![(ParticipantId::new(1), Vec2::new(-20.0, 5.0))],
            settings,
        });

        let frame = replica.render_frame(55);
        assert_eq!(frame.participants[0].position, Vec2::new(-20.0, 5.0));
        assert!(frame.projectiles.is_empty());
        assert_eq!(frame.obstacles.len(), 1);
        assert!(replica.settings().contains_key("round_time"));
    }

    #[test]
    fn test_clear() {
        let mut replica = Replica::new(role(), 4);
        replica.apply_snapshot(snapshot(10, 0.0), false, 0, 20).unwrap();
        replica.clear();

        assert!(replica.roster().is_empty());
        assert!(replica.projectiles().is_empty());
        assert_eq!(replica.last_timestamp(), None);
        assert!(replica.render_frame(0).participants.is_empty());
    }
}
