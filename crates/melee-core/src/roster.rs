//! Roster reconciliation
//!
//! Maps the flat participant list carried by every snapshot onto the fixed
//! seat table. Known participants are updated in place so their motion
//! state survives; new ones are created; absent ones vacate their seat.

use crate::{
    Error, Notifier, OccupantKind, Participant, ParticipantId, ParticipantState, Result, Role,
    SeatIndex, SeatTable, SubscriptionId,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// A single seat mutation produced by reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatChange {
    /// A participant took a seat
    Added { seat: SeatIndex, id: ParticipantId },
    /// A seated participant's name, color, liveness or metadata changed
    Updated { seat: SeatIndex, id: ParticipantId },
    /// A known participant changed seats
    Moved {
        from: SeatIndex,
        to: SeatIndex,
        id: ParticipantId,
    },
    /// A seat was vacated
    Removed { seat: SeatIndex, id: ParticipantId },
}

impl SeatChange {
    /// The participant this change concerns
    pub fn id(&self) -> ParticipantId {
        match self {
            SeatChange::Added { id, .. }
            | SeatChange::Updated { id, .. }
            | SeatChange::Moved { id, .. }
            | SeatChange::Removed { id, .. } => *id,
        }
    }
}

/// The local view of who sits where
///
/// Constructed once per match session with the process role. The host uses
/// it as the authoritative participant list; joiners feed it snapshots.
#[derive(Debug)]
pub struct Roster {
    role: Role,
    seats: SeatTable,
    participants: IndexMap<ParticipantId, Participant>,
    /// Participants that left, kept by identity so a reappearance reuses the record
    departed: IndexMap<ParticipantId, Participant>,
    /// Our own display name, set locally and not yet echoed by the host
    pending_name: Option<String>,
    notifier: Notifier<SeatChange>,
}

impl Roster {
    /// Create an empty roster with `seat_count` seats
    pub fn new(role: Role, seat_count: u8) -> Self {
        Self {
            role,
            seats: SeatTable::new(seat_count),
            participants: IndexMap::new(),
            departed: IndexMap::new(),
            pending_name: None,
            notifier: Notifier::new(),
        }
    }

    /// Bring the roster in line with an authoritative participant list
    ///
    /// Never fails: malformed entries are skipped and inconsistent seats are
    /// cleared. Running it twice with the same input yields no changes the
    /// second time.
    pub fn reconcile(&mut self, states: &[ParticipantState]) -> Vec<SeatChange> {
        let accepted = self.accept(states);
        let mut changes = Vec::new();

        // Vacate seats whose occupant is absent or moving elsewhere
        let indices: Vec<SeatIndex> = self.seats.iter().map(|seat| seat.index).collect();
        for index in indices {
            let Some(occupant) = self.seats.occupant(index) else {
                continue;
            };
            match accepted.get(&occupant) {
                Some(state) if state.seat == index => {}
                Some(_) => {
                    self.seats.clear(index);
                }
                None => {
                    self.seats.clear(index);
                    match self.participants.shift_remove(&occupant) {
                        Some(participant) => {
                            self.departed.insert(occupant, participant);
                        }
                        None => {
                            warn!(%index, %occupant, "seat referenced an unknown participant, clearing");
                        }
                    }
                    changes.push(SeatChange::Removed {
                        seat: index,
                        id: occupant,
                    });
                }
            }
        }

        let unseated: Vec<ParticipantId> = self
            .participants
            .keys()
            .filter(|id| !accepted.contains_key(*id))
            .copied()
            .collect();
        for id in unseated {
            if let Some(participant) = self.participants.shift_remove(&id) {
                self.departed.insert(id, participant);
            }
        }

        for (id, state) in accepted {
            let name_override = self.name_override(state);
            let remote = self.is_remote(state);

            let change = match self.participants.get_mut(&id) {
                Some(participant) => {
                    let from = participant.seat;
                    let changed = participant.merge(state, name_override.as_deref());
                    let kind = participant.kind();
                    let seated = self.seats.occupant(state.seat) == Some(id);

                    if !seated {
                        if let Err(err) = self.seats.assign(state.seat, id, kind) {
                            warn!(%id, %err, "could not seat participant");
                            continue;
                        }
                        if from != state.seat {
                            SeatChange::Moved {
                                from,
                                to: state.seat,
                                id,
                            }
                        } else {
                            SeatChange::Added {
                                seat: state.seat,
                                id,
                            }
                        }
                    } else if changed {
                        if !self.seats.set_kind(id, kind) {
                            warn!(%id, seat = %state.seat, "updated participant holds no seat");
                        }
                        SeatChange::Updated {
                            seat: state.seat,
                            id,
                        }
                    } else {
                        continue;
                    }
                }
                None => {
                    let participant = match self.departed.shift_remove(&id) {
                        Some(mut participant) => {
                            participant.merge(state, name_override.as_deref());
                            participant
                        }
                        None => {
                            let mut participant = Participant::from_state(id, state, remote);
                            if let Some(name) = name_override {
                                participant.name = name;
                            }
                            participant
                        }
                    };
                    if let Err(err) = self.seats.assign(state.seat, id, participant.kind()) {
                        warn!(%id, %err, "could not seat participant");
                        self.departed.insert(id, participant);
                        continue;
                    }
                    self.participants.insert(id, participant);
                    SeatChange::Added {
                        seat: state.seat,
                        id,
                    }
                }
            };
            changes.push(change);
        }

        for change in &changes {
            self.notifier.publish(change);
        }
        changes
    }

    /// Filter a descriptor list down to well-formed, non-conflicting entries
    fn accept<'a>(
        &self,
        states: &'a [ParticipantState],
    ) -> IndexMap<ParticipantId, &'a ParticipantState> {
        let mut accepted = IndexMap::new();
        let mut claimed = HashSet::new();

        for state in states {
            let Some(id) = state.id else {
                debug!(name = %state.name, "skipping participant without identity");
                continue;
            };
            if !self.seats.contains(state.seat) {
                debug!(%id, seat = %state.seat, "skipping participant with out-of-range seat");
                continue;
            }
            if state.seat.is_host() && state.joiner_index().is_some() {
                warn!(%id, "skipping joiner-owned participant on the host seat");
                continue;
            }
            if accepted.contains_key(&id) || !claimed.insert(state.seat) {
                debug!(%id, seat = %state.seat, "skipping duplicate participant or seat claim");
                continue;
            }
            accepted.insert(id, state);
        }

        accepted
    }

    /// Remote flag for a participant seen for the first time
    fn is_remote(&self, state: &ParticipantState) -> bool {
        match self.role {
            Role::Joiner(own) => state.joiner_index() != Some(own),
            Role::Host => !state.seat.is_host(),
        }
    }

    /// Check if a descriptor names this process's own participant
    fn is_own(&self, state: &ParticipantState) -> bool {
        match self.role {
            Role::Joiner(own) => state.joiner_index() == Some(own),
            Role::Host => state.seat.is_host(),
        }
    }

    /// Name to keep instead of the descriptor's, while a local rename is pending
    fn name_override(&mut self, state: &ParticipantState) -> Option<String> {
        if !self.is_own(state) {
            return None;
        }
        let pending = self.pending_name.as_ref()?;
        if *pending == state.name {
            // Round-tripped through the host
            self.pending_name = None;
            return None;
        }
        Some(pending.clone())
    }

    /// Record a local rename of our own participant
    ///
    /// On a joiner the new name is kept until a snapshot echoes it back.
    /// On the host the rename is authoritative immediately.
    pub fn set_local_name(&mut self, name: impl Into<String>) -> Option<ParticipantId> {
        let name = name.into();
        let id = self.local_participant();
        if let Some(participant) = id.and_then(|id| self.participants.get_mut(&id)) {
            participant.name = name.clone();
        }
        if !self.role.is_host() {
            self.pending_name = Some(name);
        }
        id
    }

    /// The local rename not yet confirmed by the host
    pub fn pending_name(&self) -> Option<&str> {
        self.pending_name.as_deref()
    }

    /// Seat a new participant (host side membership change)
    pub fn admit(&mut self, state: ParticipantState) -> Result<SeatChange> {
        let id = state.id.ok_or(Error::MissingIdentity)?;
        if !self.seats.contains(state.seat) {
            return Err(Error::SeatOutOfRange {
                seat: state.seat,
                count: self.seats.len(),
            });
        }
        if state.seat.is_host() && state.joiner_index().is_some() {
            return Err(Error::HostSeatReserved);
        }
        if let Some(occupant) = self.seats.occupant(state.seat) {
            if occupant != id {
                return Err(Error::SeatOccupied {
                    seat: state.seat,
                    occupant,
                });
            }
        }

        let seat = state.seat;
        let mut states = self.states();
        states.retain(|existing| existing.id != Some(id));
        states.push(state);
        let changes = self.reconcile(&states);
        Ok(changes
            .into_iter()
            .find(|change| change.id() == id)
            .unwrap_or(SeatChange::Updated { seat, id }))
    }

    /// Remove a participant (host side membership change)
    pub fn remove(&mut self, id: ParticipantId) -> Option<SeatChange> {
        if !self.participants.contains_key(&id) {
            return None;
        }
        let states: Vec<ParticipantState> = self
            .states()
            .into_iter()
            .filter(|state| state.id != Some(id))
            .collect();
        self.reconcile(&states)
            .into_iter()
            .find(|change| matches!(change, SeatChange::Removed { id: removed, .. } if *removed == id))
    }

    /// Rename any participant (host side)
    pub fn rename(&mut self, id: ParticipantId, name: impl Into<String>) -> Result<()> {
        let participant = self
            .participants
            .get_mut(&id)
            .ok_or(Error::ParticipantNotFound(id))?;
        participant.name = name.into();
        Ok(())
    }

    /// Describe every seated participant, in seat order
    pub fn states(&self) -> Vec<ParticipantState> {
        self.by_seat().map(Participant::to_state).collect()
    }

    /// This process's own participant
    ///
    /// The seat-0 occupant on the host; the participant tagged with our
    /// joiner index on a joiner.
    pub fn local_participant(&self) -> Option<ParticipantId> {
        match self.role {
            Role::Host => self.seats.occupant(SeatIndex::HOST),
            Role::Joiner(own) => self
                .participants
                .values()
                .find(|participant| participant.joiner_index() == Some(own))
                .map(|participant| participant.id),
        }
    }

    /// Seats whose occupant is a human
    pub fn non_bot_seats(&self) -> impl Iterator<Item = SeatIndex> + '_ {
        self.seats
            .occupied()
            .filter(|seat| seat.kind != OccupantKind::Bot)
            .map(|seat| seat.index)
    }

    /// Participant occupying a seat
    pub fn participant_at(&self, seat: SeatIndex) -> Option<&Participant> {
        self.seats
            .occupant(seat)
            .and_then(|id| self.participants.get(&id))
    }

    /// Seated participants in seat order
    pub fn by_seat(&self) -> impl Iterator<Item = &Participant> {
        self.seats
            .occupied()
            .filter_map(|seat| seat.occupant.and_then(|id| self.participants.get(&id)))
    }

    /// Mark every participant's motion uninitialized so the next update snaps
    pub fn invalidate_motion(&mut self) {
        for participant in self
            .participants
            .values_mut()
            .chain(self.departed.values_mut())
        {
            participant.motion.invalidate();
        }
    }

    /// Forget everyone
    pub fn reset(&mut self) {
        self.seats.clear_all();
        self.participants.clear();
        self.departed.clear();
        self.pending_name = None;
    }

    /// Register for seat change notifications
    pub fn subscribe(&mut self, callback: impl FnMut(&SeatChange) + 'static) -> SubscriptionId {
        self.notifier.subscribe(callback)
    }

    /// Stop receiving seat change notifications
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// The role this roster was built for
    pub fn role(&self) -> Role {
        self.role
    }

    /// The seat table
    pub fn seats(&self) -> &SeatTable {
        &self.seats
    }

    /// Get a participant
    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    /// Get a participant mutably
    pub fn get_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.get_mut(&id)
    }

    /// Check if a participant is seated
    pub fn contains(&self, id: ParticipantId) -> bool {
        self.participants.contains_key(&id)
    }

    /// All seated participants, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    /// All seated participants, mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Participant> {
        self.participants.values_mut()
    }

    /// Number of seated participants
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Check if nobody is seated
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JoinerIndex, Vec2};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn pid(id: u64) -> ParticipantId {
        ParticipantId::new(id)
    }

    fn seat(index: u8) -> SeatIndex {
        SeatIndex::new(index)
    }

    fn lobby() -> Vec<ParticipantState> {
        vec![
            ParticipantState::new(pid(1), "Host", seat(0)),
            ParticipantState::new(pid(2), "Vex", seat(1)).owned_by(JoinerIndex::new(0)),
            ParticipantState::new(pid(3), "Rook", seat(2)).owned_by(JoinerIndex::new(1)),
            ParticipantState::new(pid(4), "Bot", seat(3)).as_bot(),
        ]
    }

    #[test]
    fn test_reconcile_populates_seats() {
        let mut roster = Roster::new(Role::Joiner(JoinerIndex::new(0)), 4);
        let changes = roster.reconcile(&lobby());

        assert_eq!(changes.len(), 4);
        assert!(changes
            .iter()
            .all(|change| matches!(change, SeatChange::Added { .. })));
        for (i, id) in [1, 2, 3, 4].into_iter().enumerate() {
            assert_eq!(roster.seats().occupant(seat(i as u8)), Some(pid(id)));
        }
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut roster = Roster::new(Role::Joiner(JoinerIndex::new(1)), 4);
        roster.reconcile(&lobby());
        let seats_once = roster.seats().clone();
        let names_once: Vec<String> = roster.by_seat().map(|p| p.name.clone()).collect();

        let changes = roster.reconcile(&lobby());
        assert!(changes.is_empty());
        assert_eq!(roster.seats(), &seats_once);
        let names_twice: Vec<String> = roster.by_seat().map(|p| p.name.clone()).collect();
        assert_eq!(names_once, names_twice);
    }

    #[test]
    fn test_remote_flag_on_joiner() {
        let mut roster = Roster::new(Role::Joiner(JoinerIndex::new(0)), 4);
        roster.reconcile(&lobby());

        assert!(roster.get(pid(1)).unwrap().is_remote());
        assert!(!roster.get(pid(2)).unwrap().is_remote());
        assert!(roster.get(pid(3)).unwrap().is_remote());
        assert_eq!(roster.get(pid(2)).unwrap().kind(), OccupantKind::HumanLocal);
        assert_eq!(roster.get(pid(4)).unwrap().kind(), OccupantKind::Bot);
        assert_eq!(roster.local_participant(), Some(pid(2)));
    }

    #[test]
    fn test_remote_flag_on_host() {
        let mut roster = Roster::new(Role::Host, 4);
        roster.reconcile(&lobby());

        assert!(!roster.get(pid(1)).unwrap().is_remote());
        assert!(roster.get(pid(2)).unwrap().is_remote());
        assert_eq!(roster.local_participant(), Some(pid(1)));
        assert_eq!(
            roster.seats().get(seat(2)).unwrap().kind,
            OccupantKind::HumanRemote
        );
    }

    #[test]
    fn test_updates_in_place_preserve_motion() {
        let mut roster = Roster::new(Role::Joiner(JoinerIndex::new(0)), 4);
        roster.reconcile(&lobby());
        roster
            .get_mut(pid(3))
            .unwrap()
            .motion
            .snap(Vec2::new(40.0, 12.0));

        let mut next = lobby();
        next[2].color = "#00ff00".to_string();
        next[2].alive = false;
        let changes = roster.reconcile(&next);

        assert_eq!(
            changes,
            vec![SeatChange::Updated {
                seat: seat(2),
                id: pid(3)
            }]
        );
        let rook = roster.get(pid(3)).unwrap();
        assert!(!rook.alive);
        assert!(rook.motion.is_initialized());
        assert_eq!(rook.motion.target(), Vec2::new(40.0, 12.0));
    }

    #[test]
    fn test_absent_then_present_is_one_add() {
        let mut roster = Roster::new(Role::Joiner(JoinerIndex::new(0)), 4);
        roster.reconcile(&lobby());
        roster.get_mut(pid(3)).unwrap().motion.snap(Vec2::new(7.0, 7.0));

        let without: Vec<ParticipantState> = lobby()
            .into_iter()
            .filter(|state| state.id != Some(pid(3)))
            .collect();
        let changes = roster.reconcile(&without);
        assert_eq!(
            changes,
            vec![SeatChange::Removed {
                seat: seat(2),
                id: pid(3)
            }]
        );

        let changes = roster.reconcile(&lobby());
        assert_eq!(
            changes,
            vec![SeatChange::Added {
                seat: seat(2),
                id: pid(3)
            }]
        );
        // The same record came back, motion intact
        assert_eq!(
            roster.get(pid(3)).unwrap().motion.target(),
            Vec2::new(7.0, 7.0)
        );
    }

    #[test]
    fn test_move_between_seats() {
        let mut roster = Roster::new(Role::Host, 4);
        roster.reconcile(&lobby());

        // Rook and Bot swap seats
        let mut next = lobby();
        next[2].seat = seat(3);
        next[3].seat = seat(2);
        let changes = roster.reconcile(&next);

        assert_eq!(changes.len(), 2);
        assert!(changes.contains(&SeatChange::Moved {
            from: seat(2),
            to: seat(3),
            id: pid(3)
        }));
        assert!(changes.contains(&SeatChange::Moved {
            from: seat(3),
            to: seat(2),
            id: pid(4)
        }));
        assert_eq!(roster.seats().occupant(seat(3)), Some(pid(3)));
        assert_eq!(roster.seats().occupant(seat(2)), Some(pid(4)));
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let mut roster = Roster::new(Role::Joiner(JoinerIndex::new(0)), 4);
        let mut states = lobby();
        states[1].id = None;
        states.push(ParticipantState::new(pid(9), "Ghost", seat(7)));
        states.push(ParticipantState::new(pid(10), "Squatter", seat(2)));
        states.push(ParticipantState::new(pid(11), "Usurper", seat(0)).owned_by(JoinerIndex::new(1)));

        let changes = roster.reconcile(&states);

        assert_eq!(changes.len(), 3);
        assert!(roster.get(pid(2)).is_none());
        assert!(roster.get(pid(9)).is_none());
        assert!(roster.get(pid(10)).is_none());
        assert!(roster.get(pid(11)).is_none());
        assert_eq!(roster.seats().occupant(seat(0)), Some(pid(1)));
        assert_eq!(roster.seats().occupant(seat(2)), Some(pid(3)));
    }

    #[test]
    fn test_seat_with_unknown_occupant_self_heals() {
        let mut roster = Roster::new(Role::Joiner(JoinerIndex::new(0)), 4);
        roster.reconcile(&lobby()[..2]);
        roster
            .seats
            .assign(seat(3), pid(99), OccupantKind::HumanRemote)
            .unwrap();

        let changes = roster.reconcile(&lobby()[..2]);
        assert_eq!(
            changes,
            vec![SeatChange::Removed {
                seat: seat(3),
                id: pid(99)
            }]
        );
        assert!(roster.seats().get(seat(3)).unwrap().is_empty());
    }

    #[test]
    fn test_pending_local_rename_survives_stale_snapshot() {
        let mut roster = Roster::new(Role::Joiner(JoinerIndex::new(0)), 4);
        roster.reconcile(&lobby());

        assert_eq!(roster.set_local_name("Kestrel"), Some(pid(2)));
        roster.reconcile(&lobby());
        assert_eq!(roster.get(pid(2)).unwrap().name, "Kestrel");
        assert_eq!(roster.pending_name(), Some("Kestrel"));

        // Host echoes the rename
        let mut echoed = lobby();
        echoed[1].name = "Kestrel".to_string();
        roster.reconcile(&echoed);
        assert_eq!(roster.pending_name(), None);
        assert_eq!(roster.get(pid(2)).unwrap().name, "Kestrel");

        // Later authoritative renames apply again
        echoed[1].name = "Kes".to_string();
        roster.reconcile(&echoed);
        assert_eq!(roster.get(pid(2)).unwrap().name, "Kes");
    }

    #[test]
    fn test_rename_does_not_touch_others() {
        let mut roster = Roster::new(Role::Joiner(JoinerIndex::new(0)), 4);
        roster.reconcile(&lobby());
        roster.set_local_name("Kestrel");

        let mut next = lobby();
        next[2].name = "Rook II".to_string();
        roster.reconcile(&next);
        assert_eq!(roster.get(pid(3)).unwrap().name, "Rook II");
    }

    #[test]
    fn test_admit_and_remove() {
        let mut roster = Roster::new(Role::Host, 4);
        roster
            .admit(ParticipantState::new(pid(1), "Host", seat(0)))
            .unwrap();
        let change = roster
            .admit(ParticipantState::new(pid(2), "Vex", seat(1)).owned_by(JoinerIndex::new(0)))
            .unwrap();
        assert_eq!(
            change,
            SeatChange::Added {
                seat: seat(1),
                id: pid(2)
            }
        );

        let err = roster
            .admit(ParticipantState::new(pid(3), "Late", seat(1)))
            .unwrap_err();
        assert!(matches!(err, Error::SeatOccupied { .. }));

        let err = roster
            .admit(ParticipantState::new(pid(4), "Sneak", seat(0)).owned_by(JoinerIndex::new(1)))
            .unwrap_err();
        assert_eq!(err, Error::HostSeatReserved);

        assert_eq!(
            roster.remove(pid(2)),
            Some(SeatChange::Removed {
                seat: seat(1),
                id: pid(2)
            })
        );
        assert_eq!(roster.remove(pid(2)), None);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_non_bot_seats() {
        let mut roster = Roster::new(Role::Host, 4);
        roster.reconcile(&lobby());
        let seats: Vec<SeatIndex> = roster.non_bot_seats().collect();
        assert_eq!(seats, vec![seat(0), seat(1), seat(2)]);
    }

    #[test]
    fn test_notifications_are_pushed() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut roster = Roster::new(Role::Host, 4);
        let sink = Rc::clone(&seen);
        roster.subscribe(move |change| sink.borrow_mut().push(*change));

        roster.reconcile(&lobby()[..1]);
        assert_eq!(
            *seen.borrow(),
            vec![SeatChange::Added {
                seat: seat(0),
                id: pid(1)
            }]
        );
    }

    #[test]
    fn test_reset_and_invalidate() {
        let mut roster = Roster::new(Role::Joiner(JoinerIndex::new(0)), 4);
        roster.reconcile(&lobby());
        roster.get_mut(pid(1)).unwrap().motion.snap(Vec2::new(1.0, 1.0));

        roster.invalidate_motion();
        assert!(!roster.get(pid(1)).unwrap().motion.is_initialized());

        roster.reset();
        assert!(roster.is_empty());
        assert_eq!(roster.seats().occupied().count(), 0);
    }
}
