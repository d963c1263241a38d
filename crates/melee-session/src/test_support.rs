//! Shared doubles for session tests

use crate::{HostSession, JoinerSession, Simulation};
use melee_core::{Millis, ParticipantId, Roster, Vec2};
use melee_netcode::{Choice, EntityState, InputFrame, Message, OfferKind, Outbound, Snapshot};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Participants walk in the direction of their held keys, one unit per step
#[derive(Debug, Default)]
pub struct ArenaSim {
    pub positions: BTreeMap<ParticipantId, Vec2>,
    pub headings: BTreeMap<ParticipantId, Vec2>,
    pub steps: u32,
}

impl Simulation for ArenaSim {
    fn step(&mut self, _now: Millis, roster: &Roster) {
        self.steps += 1;
        for participant in roster.iter() {
            let heading = self
                .headings
                .get(&participant.id)
                .copied()
                .unwrap_or(Vec2::ZERO);
            let position = self
                .positions
                .entry(participant.id)
                .or_insert(Vec2::new(participant.seat.0 as f32 * 10.0, 0.0));
            position.x += heading.x;
            position.y += heading.y;
        }
    }

    fn apply_input(&mut self, participant: ParticipantId, input: &InputFrame) {
        self.headings.insert(participant, input.keys.direction());
    }

    fn participant_position(&self, participant: ParticipantId) -> Option<Vec2> {
        self.positions.get(&participant).copied()
    }

    fn fill_snapshot(&self, snapshot: &mut Snapshot) {
        snapshot.counters.round = 1;
        snapshot
            .projectiles
            .push(EntityState::new("projectile").with("step", self.steps as i64));
    }
}

pub type Applied = Rc<RefCell<Vec<(Option<ParticipantId>, String)>>>;

/// A host whose applied effects are recorded
pub fn host() -> (HostSession<ArenaSim>, Applied) {
    let applied: Applied = Rc::default();
    let log = applied.clone();
    let host = HostSession::new(Default::default(), ArenaSim::default()).with_applier(
        move |_kind: OfferKind, target: Option<ParticipantId>, choice: &Choice| -> melee_draft::Result<()> {
            log.borrow_mut().push((target, choice.name.clone()));
            Ok(())
        },
    );
    (host, applied)
}

pub fn choices() -> Vec<Choice> {
    vec![
        Choice::new("Glass Cannon", "More damage, less health"),
        Choice::new("Quickstep", "Shorter dash cooldown"),
        Choice::new("Bulwark", "Block the first hit each round"),
    ]
}

/// Deliver the host's queued messages to the joiners, through the wire codec
pub fn host_to_joiners(
    host: &mut HostSession<ArenaSim>,
    joiners: &mut [&mut JoinerSession],
    now: Millis,
) {
    for outbound in host.take_outbound() {
        let bytes = outbound.message.encode().unwrap();
        for joiner in joiners.iter_mut() {
            if outbound.to.includes(joiner.joiner()) {
                joiner.receive(&bytes, now);
            }
        }
    }
}

/// Deliver a joiner's queued messages to the host, through the wire codec
pub fn joiner_to_host(joiner: &mut JoinerSession, host: &mut HostSession<ArenaSim>, now: Millis) {
    for outbound in joiner.take_outbound() {
        let bytes = outbound.message.encode().unwrap();
        host.receive(joiner.joiner(), &bytes, now);
    }
}

/// Messages of one kind among a batch
pub fn named<'a>(outbound: &'a [Outbound], name: &str) -> Vec<&'a Message> {
    outbound
        .iter()
        .map(|outbound| &outbound.message)
        .filter(|message| message.name() == name)
        .collect()
}
