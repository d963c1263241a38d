//! Fixed-size seat table

use crate::{Error, ParticipantId, Result, SeatIndex};
use serde::{Deserialize, Serialize};

/// What kind of occupant sits in a seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OccupantKind {
    /// Driven by this process's human
    HumanLocal,
    /// Driven by a human on another process
    HumanRemote,
    /// AI-controlled
    Bot,
    /// Nobody sits here
    #[default]
    Empty,
}

/// One roster position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub index: SeatIndex,
    pub occupant: Option<ParticipantId>,
    pub kind: OccupantKind,
}

impl Seat {
    fn empty(index: SeatIndex) -> Self {
        Self {
            index,
            occupant: None,
            kind: OccupantKind::Empty,
        }
    }

    /// Check if nobody sits here
    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }
}

/// N fixed seats, at most one occupant each
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatTable {
    seats: Vec<Seat>,
}

impl SeatTable {
    /// Create a table with `count` empty seats
    pub fn new(count: u8) -> Self {
        Self {
            seats: (0..count).map(|i| Seat::empty(SeatIndex::new(i))).collect(),
        }
    }

    /// Number of seats
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// Check if the table has no seats at all
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Check if an index names a seat in this table
    pub fn contains(&self, index: SeatIndex) -> bool {
        index.as_usize() < self.seats.len()
    }

    /// Get a seat
    pub fn get(&self, index: SeatIndex) -> Option<&Seat> {
        self.seats.get(index.as_usize())
    }

    /// Occupant of a seat
    pub fn occupant(&self, index: SeatIndex) -> Option<ParticipantId> {
        self.get(index).and_then(|seat| seat.occupant)
    }

    /// Put a participant in a seat
    ///
    /// Re-assigning the same occupant only refreshes its kind.
    pub fn assign(&mut self, index: SeatIndex, id: ParticipantId, kind: OccupantKind) -> Result<()> {
        let count = self.seats.len();
        let seat = self
            .seats
            .get_mut(index.as_usize())
            .ok_or(Error::SeatOutOfRange { seat: index, count })?;
        match seat.occupant {
            Some(occupant) if occupant != id => Err(Error::SeatOccupied {
                seat: index,
                occupant,
            }),
            _ => {
                seat.occupant = Some(id);
                seat.kind = kind;
                Ok(())
            }
        }
    }

    /// Change the recorded kind of a seated participant
    ///
    /// Returns false when the participant holds no seat.
    pub fn set_kind(&mut self, id: ParticipantId, kind: OccupantKind) -> bool {
        match self.seats.iter_mut().find(|seat| seat.occupant == Some(id)) {
            Some(seat) => {
                seat.kind = kind;
                true
            }
            None => false,
        }
    }

    /// Empty a seat, returning whoever sat there
    pub fn clear(&mut self, index: SeatIndex) -> Option<ParticipantId> {
        let seat = self.seats.get_mut(index.as_usize())?;
        seat.kind = OccupantKind::Empty;
        seat.occupant.take()
    }

    /// Find the seat a participant occupies
    pub fn seat_of(&self, id: ParticipantId) -> Option<SeatIndex> {
        self.seats
            .iter()
            .find(|seat| seat.occupant == Some(id))
            .map(|seat| seat.index)
    }

    /// First empty seat other than the host seat
    pub fn first_free(&self) -> Option<SeatIndex> {
        self.seats
            .iter()
            .filter(|seat| !seat.index.is_host())
            .find(|seat| seat.is_empty())
            .map(|seat| seat.index)
    }

    /// Iterate all seats in index order
    pub fn iter(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter()
    }

    /// Iterate occupied seats
    pub fn occupied(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter(|seat| !seat.is_empty())
    }

    /// Empty every seat
    pub fn clear_all(&mut self) {
        for seat in self.seats.iter_mut() {
            seat.occupant = None;
            seat.kind = OccupantKind::Empty;
        }
    }
}
