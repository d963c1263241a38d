//! Host session
//!
//! Owns the authoritative roster, the draft arbiter, the readiness map and
//! the simulation. Remote messages pass through a guard that drops (and
//! logs) anything malformed, stale or spoofed without affecting the
//! messages that follow.

use crate::{Error, Result, SessionConfig, Simulation};
use melee_core::{
    IdAllocator, JoinerIndex, Millis, ParticipantId, ParticipantState, Role, Roster, SeatChange,
    SeatIndex, ValueMap, Vec2,
};
use melee_draft::{BotDecider, DraftArbiter, DraftEvent, DraftOutput, EffectApplier, Offer};
use melee_lobby::ReadinessCoordinator;
use melee_netcode::{
    send_message, CardSelect, Choice, Connection, EntityState, InputFrame, Message, Outbound,
    ReadyState, RoundReset, Snapshot,
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// The authoritative side of a match
pub struct HostSession<S> {
    config: SessionConfig,
    roster: Roster,
    ids: IdAllocator,
    draft: DraftArbiter,
    lobby: ReadinessCoordinator,
    simulation: S,
    joiners: BTreeMap<JoinerIndex, ParticipantId>,
    started: bool,
    last_snapshot: Option<Millis>,
    outbox: Vec<Outbound>,
    draft_events: Vec<DraftEvent>,
}

impl<S: Simulation> HostSession<S> {
    /// Create a session around a simulation
    pub fn new(config: SessionConfig, simulation: S) -> Self {
        let config = config.clamped();
        let draft =
            DraftArbiter::new(Role::Host).with_pacing(config.bot_pacing(), config.bot_seed);
        Self {
            roster: Roster::new(Role::Host, config.seat_count),
            ids: IdAllocator::new(),
            draft,
            lobby: ReadinessCoordinator::new(Role::Host),
            simulation,
            joiners: BTreeMap::new(),
            started: false,
            last_snapshot: None,
            outbox: Vec::new(),
            draft_events: Vec::new(),
            config,
        }
    }

    /// Set the card effect collaborator
    pub fn with_applier(mut self, applier: impl EffectApplier + 'static) -> Self {
        self.draft.set_applier(applier);
        self
    }

    /// Set the bot decision collaborator
    pub fn with_decider(mut self, decider: impl BotDecider + 'static) -> Self {
        self.draft.set_decider(decider);
        self
    }

    // ========================================================================
    // Membership
    // ========================================================================

    /// Seat the host's own participant in seat 0
    pub fn seat_host(&mut self, name: &str, color: &str) -> Result<ParticipantId> {
        let id = self.ids.allocate();
        self.roster
            .admit(ParticipantState::new(id, name, SeatIndex::HOST).with_color(color))?;
        info!(%id, name, "host seated");
        Ok(id)
    }

    /// Seat a newly connected joiner in the first free seat
    pub fn join(&mut self, joiner: JoinerIndex, name: &str, color: &str) -> Result<ParticipantId> {
        if joiner.raw() >= self.config.joiner_slots() {
            return Err(Error::UnknownJoiner(joiner));
        }
        if self.joiners.contains_key(&joiner) {
            return Err(Error::AlreadySeated(joiner));
        }
        let seat = self
            .roster
            .seats()
            .first_free()
            .ok_or(melee_core::Error::NoFreeSeat)?;

        let id = self.ids.allocate();
        self.roster.admit(
            ParticipantState::new(id, name, seat)
                .with_color(color)
                .owned_by(joiner),
        )?;
        self.joiners.insert(joiner, id);
        info!(%joiner, %id, %seat, name, "joiner seated");

        // Bring the newcomer up to date on state that is not in snapshots
        self.outbox.push(Outbound::to_joiner(
            joiner,
            Message::ReadyState(ReadyState::Full(self.lobby.map().clone())),
        ));
        if let Some(offer) = self.draft.open_offer_ref() {
            self.outbox
                .push(Outbound::to_joiner(joiner, Message::CardOffer(offer.to_message())));
        }
        Ok(id)
    }

    /// Seat a bot in the first free seat
    pub fn add_bot(&mut self, name: &str, color: &str) -> Result<ParticipantId> {
        let seat = self
            .roster
            .seats()
            .first_free()
            .ok_or(melee_core::Error::NoFreeSeat)?;
        let id = self.ids.allocate();
        self.roster
            .admit(ParticipantState::new(id, name, seat).with_color(color).as_bot())?;
        info!(%id, %seat, name, "bot seated");
        Ok(id)
    }

    /// Remove a bot
    pub fn remove_bot(&mut self, id: ParticipantId) -> Result<()> {
        let participant = self
            .roster
            .get(id)
            .ok_or(melee_core::Error::ParticipantNotFound(id))?;
        if !participant.is_bot() {
            return Err(melee_core::Error::ParticipantNotFound(id).into());
        }
        self.vacate(id);
        Ok(())
    }

    /// A joiner disconnected
    ///
    /// Its seat, readiness and participant go away. An open offer waiting
    /// on it stays open.
    pub fn leave(&mut self, joiner: JoinerIndex) -> Result<()> {
        let id = self
            .joiners
            .remove(&joiner)
            .ok_or(Error::NotSeated(joiner))?;
        if self
            .draft
            .summary()
            .is_some_and(|summary| summary.responder == Some(joiner))
        {
            warn!(%joiner, "chooser left with an offer open, the draft will wait");
        }
        self.vacate(id);
        info!(%joiner, %id, "joiner left");
        Ok(())
    }

    fn vacate(&mut self, id: ParticipantId) {
        if let Some(SeatChange::Removed { seat, .. }) = self.roster.remove(id) {
            if let Some(broadcast) = self.lobby.on_seat_vacated(seat) {
                self.outbox.push(broadcast);
            }
        }
        self.draft.forget_participant(id);
    }

    /// Rename the host's own participant
    pub fn rename_local(&mut self, name: &str) -> Option<ParticipantId> {
        self.roster.set_local_name(name)
    }

    // ========================================================================
    // Remote messages
    // ========================================================================

    /// Decode and handle bytes from a joiner
    ///
    /// Never fails: a bad message is logged and dropped.
    pub fn receive(&mut self, sender: JoinerIndex, bytes: &[u8], now: Millis) {
        let result = Message::decode(bytes)
            .map_err(Error::from)
            .and_then(|message| self.handle_message(sender, message, now));
        if let Err(err) = result {
            if err.is_spoof() {
                warn!(%sender, %err, "dropping spoofed message");
            } else {
                debug!(%sender, %err, "dropping message");
            }
        }
    }

    /// Handle one message from a joiner
    pub fn handle_message(
        &mut self,
        sender: JoinerIndex,
        message: Message,
        now: Millis,
    ) -> Result<()> {
        match message {
            Message::Input(input) => self.on_input(sender, &input),
            Message::CardHover(hover) => {
                check_sender(sender, hover.origin)?;
                let id = self.participant_of(sender)?;
                let output = self.draft.on_hover(&hover, Some(id))?;
                self.absorb(output);
                Ok(())
            }
            Message::CardSelect(select) => self.on_pick_request(sender, &select, now),
            Message::ReadyState(ReadyState::Request {
                joiner,
                seat,
                ready,
            }) => {
                check_sender(sender, Some(joiner))?;
                let broadcast = self.lobby.on_request(joiner, seat, ready, &self.roster)?;
                self.outbox.push(broadcast);
                Ok(())
            }
            Message::Rename(rename) => {
                check_sender(sender, Some(rename.joiner))?;
                let id = self.participant_of(sender)?;
                self.roster.rename(id, rename.name.as_str())?;
                debug!(%sender, %id, name = %rename.name, "renamed");
                Ok(())
            }
            other => Err(Error::UnexpectedMessage(other.name())),
        }
    }

    fn on_input(&mut self, sender: JoinerIndex, input: &InputFrame) -> Result<()> {
        check_sender(sender, Some(input.joiner))?;
        let id = self.participant_of(sender)?;
        self.simulation.apply_input(id, input);
        Ok(())
    }

    fn on_pick_request(
        &mut self,
        sender: JoinerIndex,
        select: &CardSelect,
        now: Millis,
    ) -> Result<()> {
        check_sender(sender, Some(select.joiner))?;
        let id = self.participant_of(sender)?;
        let output = self.draft.on_pick_request(select, id, &self.roster, now)?;
        self.absorb(output);
        Ok(())
    }

    fn participant_of(&self, joiner: JoinerIndex) -> Result<ParticipantId> {
        self.joiners
            .get(&joiner)
            .copied()
            .ok_or(Error::NotSeated(joiner))
    }

    // ========================================================================
    // Draft and lobby
    // ========================================================================

    /// Offer a reward to one participant
    pub fn offer_reward(
        &mut self,
        target: ParticipantId,
        choices: Vec<Choice>,
        now: Millis,
    ) -> Result<()> {
        let offer = Offer::reward(target, choices, &self.roster);
        let output = self.draft.offer(offer, &self.roster, now)?;
        self.absorb(output);
        Ok(())
    }

    /// Offer an arena-wide modifier, chosen by the host
    pub fn offer_world(&mut self, choices: Vec<Choice>, now: Millis) -> Result<()> {
        let output = self.draft.offer(Offer::world(choices), &self.roster, now)?;
        self.absorb(output);
        Ok(())
    }

    /// Move the host's own hover
    pub fn hover(&mut self, index: Option<usize>) -> Result<()> {
        let output = self.draft.hover(index)?;
        self.absorb(output);
        Ok(())
    }

    /// Commit the host's own pick
    pub fn pick(&mut self, name: &str, now: Millis) -> Result<()> {
        let output = self.draft.pick(name, &self.roster, now)?;
        self.absorb(output);
        Ok(())
    }

    /// Toggle the host's own readiness
    pub fn set_ready(&mut self, ready: bool) -> Result<()> {
        let broadcast = self.lobby.set_local_ready(ready, &self.roster)?;
        self.outbox.push(broadcast);
        Ok(())
    }

    /// Start the match once every human seat is ready
    pub fn start_match(&mut self) -> Result<()> {
        if self.started {
            return Err(Error::AlreadyStarted);
        }
        self.lobby.start_match(&self.roster)?;
        self.started = true;
        Ok(())
    }

    /// Lay out a new round and tell the joiners
    pub fn round_reset(
        &mut self,
        obstacles: Vec<EntityState>,
        spawns: Vec<(ParticipantId, Vec2)>,
        settings: ValueMap,
    ) {
        for (id, position) in &spawns {
            if let Some(participant) = self.roster.get_mut(*id) {
                participant.motion.snap(*position);
            }
        }
        info!(spawns = spawns.len(), "round reset");
        self.outbox.push(Outbound::broadcast(Message::RoundReset(RoundReset {
            obstacles,
            spawns,
            settings,
        })));
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Run one host tick
    ///
    /// Advances any bot pick, steps the simulation unless a draft offer is
    /// open, and queues a snapshot when one is due.
    pub fn tick(&mut self, now: Millis) {
        let output = self.draft.tick(now, &self.roster);
        self.absorb(output);

        if self.started && !self.draft.waiting_for_card() {
            self.simulation.step(now, &self.roster);
            self.sync_from_simulation();
        }

        let due = self
            .last_snapshot
            .map_or(true, |last| now.saturating_sub(last) >= self.config.snapshot_interval_ms);
        if due {
            let snapshot = self.snapshot(now);
            self.outbox.push(Outbound::broadcast(Message::StateUpdate(snapshot)));
            self.last_snapshot = Some(now);
        }
    }

    fn sync_from_simulation(&mut self) {
        let simulation = &self.simulation;
        for participant in self.roster.iter_mut() {
            if let Some(position) = simulation.participant_position(participant.id) {
                participant.motion.snap(position);
            }
            if let Some(alive) = simulation.participant_alive(participant.id) {
                participant.alive = alive;
            }
        }
    }

    /// Describe the world as it is now
    pub fn snapshot(&self, now: Millis) -> Snapshot {
        let mut snapshot = Snapshot::new(now).with_participants(self.roster.states());
        self.simulation.fill_snapshot(&mut snapshot);
        snapshot.draft = self.draft.summary();
        snapshot.paused = self.draft.waiting_for_card();
        snapshot
    }

    fn absorb(&mut self, output: DraftOutput) {
        self.outbox.extend(output.outbound);
        self.draft_events.extend(output.events);
    }

    // ========================================================================
    // Delivery
    // ========================================================================

    /// Take every queued outbound message
    pub fn take_outbound(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    /// Take the draft events produced since the last call
    pub fn take_draft_events(&mut self) -> Vec<DraftEvent> {
        std::mem::take(&mut self.draft_events)
    }

    /// Send every queued message to the joiners it is addressed to
    ///
    /// Returns the number of sends that succeeded. A failed send is logged
    /// and does not stop delivery to the others.
    pub fn flush<C: Connection>(&mut self, peers: &BTreeMap<JoinerIndex, C>) -> usize {
        let mut sent = 0;
        for outbound in self.take_outbound() {
            for (joiner, connection) in peers {
                if !outbound.to.includes(*joiner) {
                    continue;
                }
                match send_message(connection, &outbound.message) {
                    Ok(()) => sent += 1,
                    Err(err) => {
                        warn!(%joiner, message = outbound.message.name(), %err, "send failed")
                    }
                }
            }
        }
        sent
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn draft(&self) -> &DraftArbiter {
        &self.draft
    }

    pub fn lobby(&self) -> &ReadinessCoordinator {
        &self.lobby
    }

    pub fn simulation(&self) -> &S {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut S {
        &mut self.simulation
    }

    /// Check if the match has started
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Check if the simulation is paused for a pick
    pub fn waiting_for_card(&self) -> bool {
        self.draft.waiting_for_card()
    }

    /// Participant seated for a joiner
    pub fn participant_for(&self, joiner: JoinerIndex) -> Option<ParticipantId> {
        self.joiners.get(&joiner).copied()
    }
}

/// Reject a message whose embedded joiner index is not its transport sender
fn check_sender(sender: JoinerIndex, claimed: Option<JoinerIndex>) -> Result<()> {
    if claimed == Some(sender) {
        Ok(())
    } else {
        Err(Error::SpoofedSender { sender, claimed })
    }
}
