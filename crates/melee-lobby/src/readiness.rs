//! Readiness coordination
//!
//! The host owns the seat → ready map. Joiners ask the host to toggle
//! their own seat and mirror the map it broadcasts back.

use crate::{Error, Result};
use melee_core::{JoinerIndex, Notifier, Role, Roster, SeatIndex, SubscriptionId};
use melee_netcode::{Message, Outbound, ReadyState};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// A change to the readiness map
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyEvent {
    /// One seat toggled
    Changed { seat: SeatIndex, ready: bool },
    /// A seat's entry was dropped because its occupant left
    Cleared { seat: SeatIndex },
    /// The whole map was replaced by a host broadcast
    Replaced,
}

/// Tracks per-seat readiness before a match starts
#[derive(Debug)]
pub struct ReadinessCoordinator {
    role: Role,
    ready: BTreeMap<SeatIndex, bool>,
    notifier: Notifier<ReadyEvent>,
}

impl ReadinessCoordinator {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            ready: BTreeMap::new(),
            notifier: Notifier::new(),
        }
    }

    /// Toggle this process's own seat
    ///
    /// On the host this updates the map and broadcasts it. On a joiner it
    /// produces a request to the host; the local mirror changes only when
    /// the host answers.
    pub fn set_local_ready(&mut self, ready: bool, roster: &Roster) -> Result<Outbound> {
        let own = roster.local_participant().ok_or(Error::NotSeated)?;
        let seat = roster.seats().seat_of(own).ok_or(Error::NotSeated)?;

        match self.role {
            Role::Host => {
                self.set(seat, ready);
                Ok(self.broadcast())
            }
            Role::Joiner(joiner) => Ok(Outbound::to_host(Message::ReadyState(
                ReadyState::Request {
                    joiner,
                    seat,
                    ready,
                },
            ))),
        }
    }

    /// Handle a joiner's request to toggle a seat
    ///
    /// The seat must hold a human participant owned by the requesting joiner.
    pub fn on_request(
        &mut self,
        joiner: JoinerIndex,
        seat: SeatIndex,
        ready: bool,
        roster: &Roster,
    ) -> Result<Outbound> {
        if !self.role.is_host() {
            return Err(Error::NotHost);
        }
        let occupant = roster.participant_at(seat).ok_or(Error::SeatEmpty(seat))?;
        if occupant.is_bot() {
            return Err(Error::BotSeat(seat));
        }
        if occupant.joiner_index() != Some(joiner) {
            return Err(Error::NotSeatOwner { seat, joiner });
        }

        self.set(seat, ready);
        Ok(self.broadcast())
    }

    /// Replace the local mirror with the host's map
    pub fn on_broadcast(&mut self, map: BTreeMap<SeatIndex, bool>) -> Result<()> {
        if self.role.is_host() {
            return Err(Error::NotJoiner);
        }
        if map != self.ready {
            self.ready = map;
            self.notifier.publish(&ReadyEvent::Replaced);
        }
        Ok(())
    }

    /// Forget a seat's readiness after its occupant left
    ///
    /// On the host the updated map is rebroadcast.
    pub fn on_seat_vacated(&mut self, seat: SeatIndex) -> Option<Outbound> {
        self.ready.remove(&seat)?;
        debug!(%seat, "readiness cleared");
        self.notifier.publish(&ReadyEvent::Cleared { seat });
        self.role.is_host().then(|| self.broadcast())
    }

    /// Seats that hold a human and are not ready, in seat order
    pub fn waiting_on(&self, roster: &Roster) -> Vec<SeatIndex> {
        roster
            .non_bot_seats()
            .filter(|seat| !self.is_ready(*seat))
            .collect()
    }

    /// Check if every human seat is ready
    ///
    /// True when there are no human seats at all.
    pub fn can_start(&self, roster: &Roster) -> bool {
        self.waiting_on(roster).is_empty()
    }

    /// Gate for the host's start-match action
    pub fn start_match(&self, roster: &Roster) -> Result<()> {
        if !self.role.is_host() {
            return Err(Error::NotHost);
        }
        let waiting = self.waiting_on(roster);
        if !waiting.is_empty() {
            return Err(Error::NotAllReady(waiting));
        }
        info!(seats = roster.non_bot_seats().count(), "all seats ready, starting match");
        Ok(())
    }

    /// The full-map broadcast for the current state
    pub fn broadcast(&self) -> Outbound {
        Outbound::broadcast(Message::ReadyState(ReadyState::Full(self.ready.clone())))
    }

    pub fn is_ready(&self, seat: SeatIndex) -> bool {
        self.ready.get(&seat).copied().unwrap_or(false)
    }

    /// The seat → ready map
    pub fn map(&self) -> &BTreeMap<SeatIndex, bool> {
        &self.ready
    }

    /// Forget all readiness
    pub fn reset(&mut self) {
        self.ready.clear();
        self.notifier.publish(&ReadyEvent::Replaced);
    }

    /// Register for readiness change notifications
    pub fn subscribe(&mut self, callback: impl FnMut(&ReadyEvent) + 'static) -> SubscriptionId {
        self.notifier.subscribe(callback)
    }

    /// Stop receiving readiness change notifications
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    fn set(&mut self, seat: SeatIndex, ready: bool) {
        if self.ready.insert(seat, ready) != Some(ready) {
            debug!(%seat, ready, "readiness changed");
            self.notifier.publish(&ReadyEvent::Changed { seat, ready });
        }
    }
}
