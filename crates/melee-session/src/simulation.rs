//! The host's simulation, as seen by the session
//!
//! Physics, collisions and entity behavior live behind this trait. The
//! session only steps it, feeds it input and reads back what a snapshot
//! needs.

use melee_core::{Millis, ParticipantId, Roster, Vec2};
use melee_netcode::{InputFrame, Snapshot};

/// Authoritative match simulation
pub trait Simulation {
    /// Advance one step. Skipped while a draft offer is open.
    fn step(&mut self, now: Millis, roster: &Roster);

    /// Feed one frame of input for a participant
    fn apply_input(&mut self, participant: ParticipantId, input: &InputFrame);

    /// Authoritative position of a participant
    fn participant_position(&self, participant: ParticipantId) -> Option<Vec2>;

    /// Liveness of a participant, if the simulation tracks it
    fn participant_alive(&self, _participant: ParticipantId) -> Option<bool> {
        None
    }

    /// Fill transient entities and counters into an outgoing snapshot
    fn fill_snapshot(&self, snapshot: &mut Snapshot);
}
