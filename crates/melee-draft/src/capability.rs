//! Collaborators the arbiter calls into
//!
//! Both are injected at construction. What a choice does and how a bot
//! chooses are outside this crate.

use crate::Result;
use melee_core::ParticipantId;
use melee_netcode::{Choice, OfferKind};

/// Executes the effect of a finalized choice
pub trait EffectApplier {
    /// Apply `choice` to `target` (or to the whole arena for world-wide offers)
    fn apply(&mut self, kind: OfferKind, target: Option<ParticipantId>, choice: &Choice)
        -> Result<()>;
}

/// Chooses on behalf of a bot participant
pub trait BotDecider {
    /// Name of the choice the bot takes, or None to defer to the default
    fn decide(&mut self, target: ParticipantId, choices: &[Choice]) -> Option<String>;
}

impl<F> EffectApplier for F
where
    F: FnMut(OfferKind, Option<ParticipantId>, &Choice) -> Result<()>,
{
    fn apply(
        &mut self,
        kind: OfferKind,
        target: Option<ParticipantId>,
        choice: &Choice,
    ) -> Result<()> {
        self(kind, target, choice)
    }
}
