//! Buffered snapshot interpolation
//!
//! Smooths irregular snapshot arrival at the cost of a small, fixed visual
//! lag. Each local tick applies every buffered snapshot that arrived at
//! least `delay` ago, in arrival order. Positions blend towards the new
//! targets over the same delay instead of snapping.

use crate::{Replica, Snapshot, SnapshotBuffer};
use melee_core::{Millis, SeatChange};
use tracing::debug;

/// What one interpolator tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Host timestamps of the snapshots applied, in order
    pub applied: Vec<Millis>,
    /// Seat changes produced while applying them
    pub changes: Vec<SeatChange>,
    /// Snapshots discarded as older than one already applied
    pub rejected: usize,
}

/// Snapshot buffer plus the policy that drains it
#[derive(Debug)]
pub struct Interpolator {
    buffer: SnapshotBuffer,
    delay: Millis,
    has_applied: bool,
}

impl Interpolator {
    /// Create an interpolator with the given delay and maximum buffer depth
    pub fn new(delay: Millis, depth: usize) -> Self {
        Self {
            buffer: SnapshotBuffer::new(depth),
            delay,
            has_applied: false,
        }
    }

    /// Queue a snapshot received at local time `now`
    ///
    /// Returns the host timestamp of a snapshot dropped by overflow.
    pub fn receive(&mut self, snapshot: Snapshot, now: Millis) -> Option<Millis> {
        self.buffer
            .push(snapshot, now)
            .map(|evicted| evicted.snapshot.timestamp)
    }

    /// Apply every due snapshot to the replica
    ///
    /// The very first snapshot is applied immediately and snaps positions;
    /// later ones wait out the delay and blend.
    pub fn tick(&mut self, now: Millis, replica: &mut Replica) -> TickReport {
        let mut report = TickReport::default();

        while let Some(entry) = self.buffer.pop_due(now, self.delay, !self.has_applied) {
            let timestamp = entry.snapshot.timestamp;
            match replica.apply_snapshot(entry.snapshot, self.has_applied, now, self.delay) {
                Ok(changes) => {
                    self.has_applied = true;
                    report.applied.push(timestamp);
                    report.changes.extend(changes);
                }
                Err(err) => {
                    debug!(%err, "discarding snapshot");
                    report.rejected += 1;
                }
            }
        }

        report
    }

    /// Full state reset
    ///
    /// Clears the buffer and marks every participant's motion uninitialized
    /// so the next snapshot snaps rather than blends.
    pub fn reset(&mut self, replica: &mut Replica) {
        self.buffer.clear();
        self.has_applied = false;
        replica.invalidate();
    }

    /// Check if any snapshot has been applied since the last reset
    pub fn has_applied(&self) -> bool {
        self.has_applied
    }

    /// Interpolation delay in milliseconds
    pub fn delay(&self) -> Millis {
        self.delay
    }

    /// The underlying buffer
    pub fn buffer(&self) -> &SnapshotBuffer {
        &self.buffer
    }
}
