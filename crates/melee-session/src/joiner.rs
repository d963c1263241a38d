//! Joiner session
//!
//! Renders the host's world through the snapshot buffer and interpolator,
//! mirrors the open draft offer and the readiness map, and sends input,
//! hovers, picks and readiness requests to the host.

use crate::{Error, Result, SessionConfig};
use melee_core::{JoinerIndex, Millis, Role, Vec2};
use melee_draft::{DraftArbiter, DraftEvent, DraftOutput};
use melee_lobby::ReadinessCoordinator;
use melee_netcode::{
    send_message, Connection, InputFrame, Interpolator, Message, MoveKeys, Outbound, ReadyState,
    Rename, Renderer, Replica, TickReport,
};
use tracing::{debug, info, warn};

/// Something the joiner's UI must tell the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionNotice {
    /// The host went away; the session is back to its pre-match state
    HostLeft,
}

/// The rendering side of a match
#[derive(Debug)]
pub struct JoinerSession {
    config: SessionConfig,
    joiner: JoinerIndex,
    replica: Replica,
    interpolator: Interpolator,
    draft: DraftArbiter,
    lobby: ReadinessCoordinator,
    connected: bool,
    outbox: Vec<Outbound>,
    draft_events: Vec<DraftEvent>,
}

impl JoinerSession {
    /// Create a session for joiner slot `joiner`
    pub fn new(config: SessionConfig, joiner: JoinerIndex) -> Self {
        let config = config.clamped();
        let role = Role::Joiner(joiner);
        Self {
            joiner,
            replica: Replica::new(role, config.seat_count),
            interpolator: Interpolator::new(
                config.interpolation_delay_ms,
                config.snapshot_buffer_depth,
            ),
            draft: DraftArbiter::new(role),
            lobby: ReadinessCoordinator::new(role),
            connected: true,
            outbox: Vec::new(),
            draft_events: Vec::new(),
            config,
        }
    }

    // ========================================================================
    // Host messages
    // ========================================================================

    /// Decode and handle bytes from the host
    ///
    /// Never fails: a bad message is logged and dropped.
    pub fn receive(&mut self, bytes: &[u8], now: Millis) {
        let result = Message::decode(bytes)
            .map_err(Error::from)
            .and_then(|message| self.handle_message(message, now));
        if let Err(err) = result {
            debug!(joiner = %self.joiner, %err, "dropping message");
        }
    }

    /// Handle one message from the host
    pub fn handle_message(&mut self, message: Message, now: Millis) -> Result<()> {
        if !self.connected {
            return Err(Error::Disconnected);
        }
        match message {
            Message::StateUpdate(snapshot) => {
                if let Some(dropped) = self.interpolator.receive(snapshot, now) {
                    debug!(joiner = %self.joiner, dropped, "snapshot buffer overflow");
                }
                Ok(())
            }
            Message::RoundReset(reset) => {
                self.replica.apply_round_reset(&reset);
                Ok(())
            }
            Message::CardOffer(offer) => {
                let output = self.draft.on_offer(offer, self.replica.roster(), now)?;
                self.absorb(output);
                Ok(())
            }
            Message::CardHover(hover) => {
                let output = self.draft.on_hover(&hover, None)?;
                self.absorb(output);
                Ok(())
            }
            Message::CardApply(apply) => {
                let output = self.draft.on_apply(&apply)?;
                self.absorb(output);
                Ok(())
            }
            Message::ReadyState(ReadyState::Full(map)) => {
                self.lobby.on_broadcast(map)?;
                Ok(())
            }
            other => Err(Error::UnexpectedMessage(other.name())),
        }
    }

    /// Tear everything down after the host left
    pub fn on_host_departed(&mut self) -> SessionNotice {
        self.interpolator.reset(&mut self.replica);
        self.replica.clear();
        self.draft.reset();
        self.lobby.reset();
        self.outbox.clear();
        self.draft_events.clear();
        self.connected = false;
        info!(joiner = %self.joiner, "host left, session reset");
        SessionNotice::HostLeft
    }

    /// Reconnected to a host: start over from the next snapshot
    pub fn rejoin(&mut self) {
        self.interpolator.reset(&mut self.replica);
        self.replica.clear();
        self.draft.reset();
        self.lobby.reset();
        self.connected = true;
        info!(joiner = %self.joiner, "rejoined");
    }

    // ========================================================================
    // Local actions
    // ========================================================================

    /// Apply due snapshots
    pub fn tick(&mut self, now: Millis) -> TickReport {
        let report = self.interpolator.tick(now, &mut self.replica);
        if report.rejected > 0 {
            warn!(joiner = %self.joiner, rejected = report.rejected, "snapshots out of order");
        }
        report
    }

    /// Draw the current interpolated frame
    pub fn render(&self, now: Millis, renderer: &mut impl Renderer) {
        renderer.render(&self.replica.render_frame(now));
    }

    /// Send one frame of input
    pub fn send_input(&mut self, keys: MoveKeys, aim: Vec2, shoot: bool, dash: bool) {
        self.outbox.push(Outbound::to_host(Message::Input(InputFrame {
            joiner: self.joiner,
            keys,
            aim,
            shoot,
            dash,
        })));
    }

    /// Move our hover on an offer we are choosing
    pub fn hover(&mut self, index: Option<usize>) -> Result<()> {
        let output = self.draft.hover(index)?;
        self.absorb(output);
        Ok(())
    }

    /// Ask the host to apply a choice
    pub fn pick(&mut self, name: &str, now: Millis) -> Result<()> {
        let output = self.draft.pick(name, self.replica.roster(), now)?;
        self.absorb(output);
        Ok(())
    }

    /// Ask the host to toggle our readiness
    pub fn set_ready(&mut self, ready: bool) -> Result<()> {
        let request = self.lobby.set_local_ready(ready, self.replica.roster())?;
        self.outbox.push(request);
        Ok(())
    }

    /// Rename our participant
    ///
    /// Shown locally at once and kept through snapshots until the host
    /// echoes it.
    pub fn rename(&mut self, name: &str) {
        self.replica.roster_mut().set_local_name(name);
        self.outbox.push(Outbound::to_host(Message::Rename(Rename {
            joiner: self.joiner,
            name: name.to_string(),
        })));
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

    /// Send every queued message to the host
    ///
    /// Stops at the first failed send. That message and everything behind it
    /// stay queued, in order, for the next flush.
    pub fn flush<C: Connection>(&mut self, host: &C) -> Result<usize> {
        let mut pending = self.take_outbound().into_iter();
        let mut sent = 0;
        while let Some(outbound) = pending.next() {
            if let Err(err) = send_message(host, &outbound.message) {
                warn!(message = outbound.message.name(), %err, "send to host failed");
                self.outbox = std::iter::once(outbound).chain(pending).collect();
                return Err(err.into());
            }
            sent += 1;
        }
        Ok(sent)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn joiner(&self) -> JoinerIndex {
        self.joiner
    }

    pub fn replica(&self) -> &Replica {
        &self.replica
    }

    pub fn draft(&self) -> &DraftArbiter {
        &self.draft
    }

    pub fn lobby(&self) -> &ReadinessCoordinator {
        &self.lobby
    }

    pub fn interpolator(&self) -> &Interpolator {
        &self.interpolator
    }

    /// Check if the host reports the match paused for a pick
    pub fn waiting_for_card(&self) -> bool {
        self.draft.waiting_for_card() || self.replica.is_paused()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}
