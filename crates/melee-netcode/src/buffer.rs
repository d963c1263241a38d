//! Snapshot buffering
//!
//! Holds received snapshots, stamped with local receipt time, until the
//! interpolator decides they are due.

use crate::Snapshot;
use melee_core::Millis;
use std::collections::VecDeque;
use tracing::debug;

/// A snapshot waiting in the buffer
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedSnapshot {
    /// Local time the snapshot arrived
    pub received_at: Millis,
    /// The snapshot itself
    pub snapshot: Snapshot,
}

/// Bounded FIFO of received snapshots (oldest first)
///
/// When full, pushing drops the oldest entry.
#[derive(Debug)]
pub struct SnapshotBuffer {
    queue: VecDeque<BufferedSnapshot>,
    capacity: usize,
    dropped: u64,
}

impl SnapshotBuffer {
    /// Create a buffer holding at most `capacity` snapshots (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Append a snapshot
    ///
    /// Returns the snapshot evicted to make room, if any.
    pub fn push(&mut self, snapshot: Snapshot, received_at: Millis) -> Option<BufferedSnapshot> {
        self.queue.push_back(BufferedSnapshot {
            received_at,
            snapshot,
        });
        if self.queue.len() > self.capacity {
            let evicted = self.queue.pop_front();
            if let Some(evicted) = &evicted {
                self.dropped += 1;
                debug!(
                    timestamp = evicted.snapshot.timestamp,
                    "snapshot buffer full, dropped oldest"
                );
            }
            return evicted;
        }
        None
    }

    /// Pop the head if it arrived at least `delay` ago, or unconditionally when `force` is set
    pub fn pop_due(&mut self, now: Millis, delay: Millis, force: bool) -> Option<BufferedSnapshot> {
        let front = self.queue.front()?;
        if force || front.received_at.saturating_add(delay) <= now {
            self.queue.pop_front()
        } else {
            None
        }
    }

    /// Peek at the oldest buffered snapshot
    pub fn front(&self) -> Option<&BufferedSnapshot> {
        self.queue.front()
    }

    /// Iterate buffered snapshots, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &BufferedSnapshot> {
        self.queue.iter()
    }

    /// Number of buffered snapshots
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Maximum depth
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshots evicted by overflow since creation
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Discard everything buffered
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_len() {
        let mut buffer = SnapshotBuffer::new(10);
        buffer.push(Snapshot::new(1), 0);
        buffer.push(Snapshot::new(2), 5);

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.front().unwrap().snapshot.timestamp, 1);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let mut buffer = SnapshotBuffer::new(10);
        for i in 0..10 {
            assert!(buffer.push(Snapshot::new(i), i).is_none());
        }

        let evicted = buffer.push(Snapshot::new(10), 10).unwrap();
        assert_eq!(evicted.snapshot.timestamp, 0);
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.dropped(), 1);
        assert_eq!(buffer.front().unwrap().snapshot.timestamp, 1);
    }

    #[test]
    fn test_pop_due() {
        let mut buffer = SnapshotBuffer::new(10);
        buffer.push(Snapshot::new(1), 10);

        assert!(buffer.pop_due(25, 20, false).is_none());
        assert!(buffer.pop_due(30, 20, false).is_some());
        assert!(buffer.pop_due(100, 20, false).is_none());
    }

    #[test]
    fn test_pop_forced() {
        let mut buffer = SnapshotBuffer::new(10);
        buffer.push(Snapshot::new(1), 10);
        assert!(buffer.pop_due(0, 20, true).is_some());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut buffer = SnapshotBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
        buffer.push(Snapshot::new(1), 0);
        buffer.push(Snapshot::new(2), 0);
        assert_eq!(buffer.len(), 1);
    }
}
