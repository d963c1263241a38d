//! Identity types for participants, seats and joiner processes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a participant
///
/// Assigned once by the host and never reused while the session lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub u64);

impl ParticipantId {
    /// Create a new participant ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "participant:{}", self.0)
    }
}

/// Index of one of the fixed roster positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatIndex(pub u8);

impl SeatIndex {
    /// The seat reserved for the host's local participant
    pub const HOST: SeatIndex = SeatIndex(0);

    /// Create a new seat index
    pub fn new(index: u8) -> Self {
        Self(index)
    }

    /// Get the index as a `usize` for table lookups
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }

    /// Check if this is the host seat
    pub fn is_host(&self) -> bool {
        *self == Self::HOST
    }
}

impl fmt::Display for SeatIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat:{}", self.0)
    }
}

/// Small integer identifying a connected joiner process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JoinerIndex(pub u8);

impl JoinerIndex {
    /// Create a new joiner index
    pub fn new(index: u8) -> Self {
        Self(index)
    }

    /// Get the raw index value
    pub fn raw(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for JoinerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "joiner:{}", self.0)
    }
}

/// Hands out participant IDs that are never reused
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Create an allocator starting at ID 1
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate the next unused ID
    pub fn allocate(&mut self) -> ParticipantId {
        let id = ParticipantId::new(self.next);
        self.next += 1;
        id
    }

    /// Make sure IDs at or below `id` are never handed out
    pub fn reserve_through(&mut self, id: ParticipantId) {
        self.next = self.next.max(id.raw() + 1);
    }

    /// Peek at the ID the next call to `allocate` will return
    pub fn peek(&self) -> ParticipantId {
        ParticipantId::new(self.next)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
