//! The draft arbiter
//!
//! One instance per process per match session. The host issues offers,
//! validates joiner picks against the open offer and broadcasts the single
//! authoritative apply. Joiners mirror the open offer for display and send
//! hover and pick requests when they are the chooser.
//!
//! ```text
//! IDLE ──offer──▶ OFFERED ──hover──▶ HOVERING ──pick──▶ APPLIED ──▶ IDLE
//!                                                          │
//!                                                          └──▶ next queued offer
//! ```

use crate::pacing::{BotAction, BotPacing, BotPlan};
use crate::{is_local_chooser, BotDecider, EffectApplier, Error, Offer, Result};
use melee_core::{GameRng, JoinerIndex, Millis, ParticipantId, Role, Roster};
use melee_netcode::{
    CardApply, CardHover, CardOffer, CardSelect, DraftSummary, Message, OfferKind, Outbound,
};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, info, warn};

/// Where the open offer stands, from this process's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftPhase {
    Idle,
    Offered,
    Hovering,
    /// A pick was sent to the host and awaits its apply
    Committed,
}

/// Something the UI should reflect
#[derive(Debug, Clone, PartialEq)]
pub enum DraftEvent {
    /// An offer is now open
    Opened {
        summary: DraftSummary,
        local_chooser: bool,
    },
    /// An offer was queued behind the open one
    Queued { summary: DraftSummary },
    /// The mirrored hover changed
    Hovered { index: Option<usize> },
    /// Our pick is on its way to the host
    Committed { choice: String },
    /// A choice is final
    Applied {
        kind: OfferKind,
        target: Option<ParticipantId>,
        choice: String,
    },
}

/// Messages to send and events to show after an arbiter call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftOutput {
    pub outbound: Vec<Outbound>,
    pub events: Vec<DraftEvent>,
}

impl DraftOutput {
    /// Append another output
    pub fn extend(&mut self, other: DraftOutput) {
        self.outbound.extend(other.outbound);
        self.events.extend(other.events);
    }

    /// Check if nothing happened
    pub fn is_empty(&self) -> bool {
        self.outbound.is_empty() && self.events.is_empty()
    }
}

#[derive(Debug)]
struct Selection {
    offer: Offer,
    local_chooser: bool,
    hover: Option<usize>,
    hover_origin: Option<JoinerIndex>,
    committed: bool,
    bot: Option<BotPlan>,
}

impl Selection {
    fn check_index(&self, index: Option<usize>) -> Result<()> {
        match index {
            Some(index) if index >= self.offer.choices.len() => Err(Error::ChoiceOutOfRange {
                index,
                len: self.offer.choices.len(),
            }),
            _ => Ok(()),
        }
    }

    fn hover_message(&self) -> Message {
        Message::CardHover(CardHover {
            target: self.offer.target,
            index: self.hover,
            responder: self.offer.responder,
            origin: self.hover_origin,
        })
    }
}

/// Coordinates the offer → hover → pick → apply protocol
pub struct DraftArbiter {
    role: Role,
    open: Option<Selection>,
    queue: VecDeque<Offer>,
    applier: Option<Box<dyn EffectApplier>>,
    decider: Option<Box<dyn BotDecider>>,
    pacing: BotPacing,
    rng: GameRng,
}

impl DraftArbiter {
    /// Create an arbiter with no collaborators configured
    pub fn new(role: Role) -> Self {
        Self {
            role,
            open: None,
            queue: VecDeque::new(),
            applier: None,
            decider: None,
            pacing: BotPacing::default(),
            rng: GameRng::new(1),
        }
    }

    /// Set the effect collaborator (host)
    pub fn with_applier(mut self, applier: impl EffectApplier + 'static) -> Self {
        self.set_applier(applier);
        self
    }

    /// Set the bot decision collaborator (host)
    pub fn with_decider(mut self, decider: impl BotDecider + 'static) -> Self {
        self.set_decider(decider);
        self
    }

    /// Set bot pacing and the seed its jitter draws from
    pub fn with_pacing(mut self, pacing: BotPacing, seed: u64) -> Self {
        self.set_pacing(pacing, seed);
        self
    }

    pub fn set_applier(&mut self, applier: impl EffectApplier + 'static) {
        self.applier = Some(Box::new(applier));
    }

    pub fn set_decider(&mut self, decider: impl BotDecider + 'static) {
        self.decider = Some(Box::new(decider));
    }

    pub fn set_pacing(&mut self, pacing: BotPacing, seed: u64) {
        self.pacing = pacing;
        self.rng = GameRng::new(seed);
    }

    // ========================================================================
    // Host operations
    // ========================================================================

    /// Issue an offer, or queue it if one is already open
    pub fn offer(&mut self, offer: Offer, roster: &Roster, now: Millis) -> Result<DraftOutput> {
        self.require_host()?;
        offer.validate()?;

        let mut output = DraftOutput::default();
        if self.open.is_some() {
            info!(kind = ?offer.kind, target = ?offer.target, "offer queued");
            output.events.push(DraftEvent::Queued {
                summary: offer.summary(),
            });
            self.queue.push_back(offer);
            return Ok(output);
        }

        self.open_offer(offer, roster, now, &mut output);
        Ok(output)
    }

    /// Validate a joiner's pick request and apply it
    ///
    /// `sender` is the participant the transport attributes the request to.
    /// Any mismatch with the open offer is rejected and leaves it untouched.
    pub fn on_pick_request(
        &mut self,
        select: &CardSelect,
        sender: ParticipantId,
        roster: &Roster,
        now: Millis,
    ) -> Result<DraftOutput> {
        self.require_host()?;
        let selection = self.open.as_ref().ok_or(Error::NoOpenOffer)?;
        let offer = &selection.offer;

        if select.kind != offer.kind {
            return Err(Error::KindMismatch {
                open: offer.kind,
                got: select.kind,
            });
        }
        if offer.responder != Some(select.joiner) {
            return Err(Error::ResponderMismatch {
                expected: offer.responder,
                got: select.joiner,
            });
        }
        if offer.target.is_some() && select.target != offer.target {
            return Err(Error::TargetMismatch {
                expected: offer.target,
                got: select.target,
            });
        }
        if offer.target.is_some() && offer.target != Some(sender) {
            return Err(Error::TargetMismatch {
                expected: offer.target,
                got: Some(sender),
            });
        }
        if offer.choice(&select.choice).is_none() {
            return Err(Error::UnknownChoice(select.choice.clone()));
        }

        info!(joiner = %select.joiner, choice = %select.choice, "pick request accepted");
        self.finalize(&select.choice, roster, now)
    }

    /// Advance a bot-driven pick
    pub fn tick(&mut self, now: Millis, roster: &Roster) -> DraftOutput {
        let mut output = DraftOutput::default();

        loop {
            let Some(selection) = self.open.as_mut() else {
                break;
            };
            let Some(action) = selection.bot.as_mut().and_then(|plan| plan.due(now)) else {
                break;
            };

            match action {
                BotAction::Hover(index) => {
                    selection.hover = Some(index);
                    selection.hover_origin = None;
                    output.outbound.push(Outbound::broadcast(selection.hover_message()));
                    output.events.push(DraftEvent::Hovered { index: Some(index) });
                }
                BotAction::Commit(index) => {
                    let Some(name) = selection.offer.choices.get(index).map(|c| c.name.clone())
                    else {
                        selection.bot = None;
                        break;
                    };
                    match self.finalize(&name, roster, now) {
                        Ok(applied) => output.extend(applied),
                        Err(err) => {
                            warn!(%err, "bot pick failed, offer stays open");
                            if let Some(selection) = self.open.as_mut() {
                                selection.bot = None;
                            }
                            break;
                        }
                    }
                }
            }
        }

        output
    }

    /// Drop queued offers for a participant that left
    ///
    /// An open offer waiting on them stays open but no longer names a
    /// responder, so whoever takes over the joiner slot cannot answer it.
    pub fn forget_participant(&mut self, id: ParticipantId) -> usize {
        if let Some(selection) = self.open.as_mut() {
            if selection.offer.target == Some(id) {
                if let Some(joiner) = selection.offer.responder.take() {
                    debug!(%id, %joiner, "responder detached from open offer");
                }
            }
        }
        let before = self.queue.len();
        self.queue.retain(|offer| offer.target != Some(id));
        before - self.queue.len()
    }

    // ========================================================================
    // Joiner operations
    // ========================================================================

    /// Mirror an offer broadcast by the host
    ///
    /// A new offer supersedes whatever was open.
    pub fn on_offer(&mut self, offer: CardOffer, roster: &Roster, now: Millis) -> Result<DraftOutput> {
        if self.role.is_host() {
            return Err(Error::NotJoiner);
        }
        let offer = Offer::from(offer);
        offer.validate()?;

        if let Some(previous) = &self.open {
            debug!(kind = ?previous.offer.kind, target = ?previous.offer.target, "offer superseded");
        }

        let mut output = DraftOutput::default();
        self.open_offer(offer, roster, now, &mut output);
        Ok(output)
    }

    /// Close the open offer on the host's word
    pub fn on_apply(&mut self, apply: &CardApply) -> Result<DraftOutput> {
        if self.role.is_host() {
            return Err(Error::NotJoiner);
        }
        let selection = self.open.as_ref().ok_or(Error::NoOpenOffer)?;
        if selection.offer.kind != apply.kind {
            return Err(Error::KindMismatch {
                open: selection.offer.kind,
                got: apply.kind,
            });
        }
        if selection.offer.target != apply.target {
            return Err(Error::TargetMismatch {
                expected: selection.offer.target,
                got: apply.target,
            });
        }

        info!(choice = %apply.choice, target = ?apply.target, "choice applied by host");
        self.open = None;
        Ok(DraftOutput {
            outbound: Vec::new(),
            events: vec![DraftEvent::Applied {
                kind: apply.kind,
                target: apply.target,
                choice: apply.choice.clone(),
            }],
        })
    }

    // ========================================================================
    // Both sides
    // ========================================================================

    /// Move the local chooser's hover
    pub fn hover(&mut self, index: Option<usize>) -> Result<DraftOutput> {
        let role = self.role;
        let selection = self.open.as_mut().ok_or(Error::NoOpenOffer)?;
        if !selection.local_chooser {
            return Err(Error::NotLocalChooser);
        }
        if selection.committed {
            return Err(Error::AwaitingConfirmation);
        }
        selection.check_index(index)?;
        if selection.hover == index {
            return Ok(DraftOutput::default());
        }

        selection.hover = index;
        selection.hover_origin = role.joiner_index();
        let message = selection.hover_message();
        let outbound = match role {
            Role::Host => Outbound::broadcast(message),
            Role::Joiner(_) => Outbound::to_host(message),
        };
        Ok(DraftOutput {
            outbound: vec![outbound],
            events: vec![DraftEvent::Hovered { index }],
        })
    }

    /// Commit the local chooser's pick
    ///
    /// The host applies immediately. A joiner sends a pick request and locks
    /// its own interaction until the host answers.
    pub fn pick(&mut self, name: &str, roster: &Roster, now: Millis) -> Result<DraftOutput> {
        let role = self.role;
        let selection = self.open.as_mut().ok_or(Error::NoOpenOffer)?;
        if !selection.local_chooser {
            return Err(Error::NotLocalChooser);
        }
        if selection.committed {
            return Err(Error::AwaitingConfirmation);
        }
        if selection.offer.choice(name).is_none() {
            return Err(Error::UnknownChoice(name.to_string()));
        }

        match role {
            Role::Host => self.finalize(name, roster, now),
            Role::Joiner(own) => {
                selection.committed = true;
                let request = CardSelect {
                    choice: name.to_string(),
                    target: selection.offer.target,
                    kind: selection.offer.kind,
                    joiner: own,
                };
                Ok(DraftOutput {
                    outbound: vec![Outbound::to_host(Message::CardSelect(request))],
                    events: vec![DraftEvent::Committed {
                        choice: name.to_string(),
                    }],
                })
            }
        }
    }

    /// Handle a hover from the other side
    ///
    /// The host accepts hovers only from the open offer's responder, sent by
    /// the offer's target participant, and rebroadcasts them tagged with
    /// their origin. A joiner passes `None` for `sender` and ignores the echo
    /// of its own hover.
    pub fn on_hover(
        &mut self,
        hover: &CardHover,
        sender: Option<ParticipantId>,
    ) -> Result<DraftOutput> {
        let role = self.role;
        let selection = self.open.as_mut().ok_or(Error::NoOpenOffer)?;
        if hover.target != selection.offer.target {
            return Err(Error::TargetMismatch {
                expected: selection.offer.target,
                got: hover.target,
            });
        }
        selection.check_index(hover.index)?;

        match role {
            Role::Host => {
                let origin = hover.origin.ok_or(Error::NotLocalChooser)?;
                if selection.offer.responder != Some(origin) {
                    return Err(Error::ResponderMismatch {
                        expected: selection.offer.responder,
                        got: origin,
                    });
                }
                if selection.offer.target.is_some() && selection.offer.target != sender {
                    return Err(Error::TargetMismatch {
                        expected: selection.offer.target,
                        got: sender,
                    });
                }
                selection.hover = hover.index;
                selection.hover_origin = Some(origin);
                Ok(DraftOutput {
                    outbound: vec![Outbound::broadcast(selection.hover_message())],
                    events: vec![DraftEvent::Hovered { index: hover.index }],
                })
            }
            Role::Joiner(own) => {
                if hover.origin == Some(own) {
                    debug!(%own, "ignoring echo of own hover");
                    return Ok(DraftOutput::default());
                }
                selection.hover = hover.index;
                selection.hover_origin = hover.origin;
                Ok(DraftOutput {
                    outbound: Vec::new(),
                    events: vec![DraftEvent::Hovered { index: hover.index }],
                })
            }
        }
    }

    /// Check if the simulation should be paused for a pick
    pub fn waiting_for_card(&self) -> bool {
        self.open.is_some()
    }

    /// Summary of the open offer for snapshots
    pub fn summary(&self) -> Option<DraftSummary> {
        self.open.as_ref().map(|selection| selection.offer.summary())
    }

    /// The open offer
    pub fn open_offer_ref(&self) -> Option<&Offer> {
        self.open.as_ref().map(|selection| &selection.offer)
    }

    /// Check if this process may interact with the open offer
    pub fn is_local_chooser(&self) -> bool {
        self.open
            .as_ref()
            .is_some_and(|selection| selection.local_chooser)
    }

    /// Most recent hover index
    pub fn hover_index(&self) -> Option<usize> {
        self.open.as_ref().and_then(|selection| selection.hover)
    }

    /// Number of offers waiting behind the open one
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn phase(&self) -> DraftPhase {
        match &self.open {
            None => DraftPhase::Idle,
            Some(selection) if selection.committed => DraftPhase::Committed,
            Some(selection) if selection.hover.is_some() => DraftPhase::Hovering,
            Some(_) => DraftPhase::Offered,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Drop the open offer and the queue
    pub fn reset(&mut self) {
        if self.open.take().is_some() {
            info!("open offer cleared");
        }
        self.queue.clear();
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn require_host(&self) -> Result<()> {
        if self.role.is_host() {
            Ok(())
        } else {
            Err(Error::NotHost)
        }
    }

    fn open_offer(&mut self, offer: Offer, roster: &Roster, now: Millis, output: &mut DraftOutput) {
        let local_chooser = is_local_chooser(self.role, &offer, roster);
        let bot_target = match (self.role, offer.kind, offer.target) {
            (Role::Host, OfferKind::ParticipantReward, Some(target)) => roster
                .get(target)
                .filter(|participant| participant.is_bot())
                .map(|participant| participant.id),
            _ => None,
        };
        let bot = bot_target.map(|target| self.plan_bot(target, &offer, now));

        info!(
            role = %self.role,
            kind = ?offer.kind,
            target = ?offer.target,
            responder = ?offer.responder,
            local_chooser,
            bot = bot.is_some(),
            "offer opened"
        );

        if self.role.is_host() {
            output
                .outbound
                .push(Outbound::broadcast(Message::CardOffer(offer.to_message())));
        }
        output.events.push(DraftEvent::Opened {
            summary: offer.summary(),
            local_chooser,
        });

        self.open = Some(Selection {
            offer,
            local_chooser,
            hover: None,
            hover_origin: None,
            committed: false,
            bot,
        });
    }

    fn plan_bot(&mut self, target: ParticipantId, offer: &Offer, now: Millis) -> BotPlan {
        let decided = match self.decider.as_mut() {
            Some(decider) => match decider.decide(target, &offer.choices) {
                Some(name) => match offer.choices.iter().position(|choice| choice.name == name) {
                    Some(index) => index,
                    None => {
                        warn!(%target, choice = %name, "bot chose an unknown card, taking the first");
                        0
                    }
                },
                None => 0,
            },
            None => {
                debug!(%target, "no bot decider configured, taking the first card");
                0
            }
        };
        BotPlan::schedule(&self.pacing, offer.choices.len(), decided, now, &mut self.rng)
    }

    /// Apply a validated choice, broadcast it and open the next queued offer
    fn finalize(&mut self, name: &str, roster: &Roster, now: Millis) -> Result<DraftOutput> {
        let applier = self
            .applier
            .as_mut()
            .ok_or(Error::CapabilityMissing("effect applier"))?;
        let selection = self.open.as_ref().ok_or(Error::NoOpenOffer)?;
        let offer = &selection.offer;
        let choice = offer
            .choice(name)
            .ok_or_else(|| Error::UnknownChoice(name.to_string()))?;

        if let Err(err) = applier.apply(offer.kind, offer.target, choice) {
            warn!(%err, choice = %name, "effect failed, the pick still stands");
        }
        info!(kind = ?offer.kind, target = ?offer.target, choice = %name, "choice applied");

        let apply = CardApply {
            choice: name.to_string(),
            target: offer.target,
            kind: offer.kind,
        };
        let mut output = DraftOutput {
            outbound: vec![Outbound::broadcast(Message::CardApply(apply.clone()))],
            events: vec![DraftEvent::Applied {
                kind: apply.kind,
                target: apply.target,
                choice: apply.choice,
            }],
        };

        self.open = None;
        if let Some(next) = self.queue.pop_front() {
            self.open_offer(next, roster, now, &mut output);
        }
        Ok(output)
    }
}

impl fmt::Debug for DraftArbiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraftArbiter")
            .field("role", &self.role)
            .field("open", &self.open)
            .field("queue", &self.queue.len())
            .field("applier", &self.applier.is_some())
            .field("decider", &self.decider.is_some())
            .field("pacing", &self.pacing)
            .finish()
    }
}
