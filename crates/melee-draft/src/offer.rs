//! Offers and the local chooser rule

use crate::{Error, Result};
use melee_core::{JoinerIndex, ParticipantId, Role, Roster, SeatIndex};
use melee_netcode::{CardOffer, Choice, DraftSummary, OfferKind};

/// A set of named choices presented for one pick
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub kind: OfferKind,
    pub target: Option<ParticipantId>,
    pub choices: Vec<Choice>,
    /// Joiner allowed to respond; `None` means the host responds
    pub responder: Option<JoinerIndex>,
}

impl Offer {
    /// A reward for one participant
    ///
    /// The responder is the joiner that owns the target, if any.
    pub fn reward(target: ParticipantId, choices: Vec<Choice>, roster: &Roster) -> Self {
        let responder = roster
            .get(target)
            .and_then(|participant| participant.joiner_index());
        Self {
            kind: OfferKind::ParticipantReward,
            target: Some(target),
            choices,
            responder,
        }
    }

    /// An arena-wide modifier, always chosen by the host
    pub fn world(choices: Vec<Choice>) -> Self {
        Self {
            kind: OfferKind::WorldWide,
            target: None,
            choices,
            responder: None,
        }
    }

    /// Reject offers with nothing to pick
    pub fn validate(&self) -> Result<()> {
        if self.choices.is_empty() {
            return Err(Error::EmptyOffer);
        }
        Ok(())
    }

    /// Find a choice by name
    pub fn choice(&self, name: &str) -> Option<&Choice> {
        self.choices.iter().find(|choice| choice.name == name)
    }

    /// Compact description for snapshots
    pub fn summary(&self) -> DraftSummary {
        DraftSummary {
            kind: self.kind,
            target: self.target,
            responder: self.responder,
        }
    }

    /// Wire form
    pub fn to_message(&self) -> CardOffer {
        CardOffer {
            kind: self.kind,
            target: self.target,
            choices: self.choices.clone(),
            responder: self.responder,
        }
    }
}

impl From<CardOffer> for Offer {
    fn from(offer: CardOffer) -> Self {
        Self {
            kind: offer.kind,
            target: offer.target,
            choices: offer.choices,
            responder: offer.responder,
        }
    }
}

/// Decide whether this process may interact with `offer`
///
/// World-wide offers belong to the host. Participant rewards belong to the
/// host when the target sits in seat 0; on a joiner they belong to the
/// named responder, falling back to the target's owner metadata. Everyone
/// else spectates.
pub fn is_local_chooser(role: Role, offer: &Offer, roster: &Roster) -> bool {
    match (offer.kind, role) {
        (OfferKind::WorldWide, role) => role.is_host(),
        (OfferKind::ParticipantReward, Role::Host) => {
            offer.target.is_some() && offer.target == roster.seats().occupant(SeatIndex::HOST)
        }
        (OfferKind::ParticipantReward, Role::Joiner(own)) => {
            if offer.responder == Some(own) {
                return true;
            }
            offer
                .target
                .and_then(|target| roster.get(target))
                .and_then(|participant| participant.joiner_index())
                == Some(own)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use melee_core::ParticipantState;

    fn roster(role: Role) -> Roster {
        let mut roster = Roster::new(role, 4);
        roster.reconcile(&[
            ParticipantState::new(ParticipantId::new(1), "Host", SeatIndex::HOST),
            ParticipantState::new(ParticipantId::new(2), "Vex", SeatIndex::new(1))
                .owned_by(JoinerIndex::new(0)),
            ParticipantState::new(ParticipantId::new(3), "Rook", SeatIndex::new(2))
                .owned_by(JoinerIndex::new(1)),
            ParticipantState::new(ParticipantId::new(4), "Bot", SeatIndex::new(3)).as_bot(),
        ]);
        roster
    }

    fn choices() -> Vec<Choice> {
        vec![Choice::new("Quickstep", "Shorter dash cooldown")]
    }

    #[test]
    fn test_reward_responder_from_owner() {
        let roster = roster(Role::Host);
        assert_eq!(
            Offer::reward(ParticipantId::new(3), choices(), &roster).responder,
            Some(JoinerIndex::new(1))
        );
        assert_eq!(
            Offer::reward(ParticipantId::new(1), choices(), &roster).responder,
            None
        );
        assert_eq!(
            Offer::reward(ParticipantId::new(4), choices(), &roster).responder,
            None
        );
    }

    #[test]
    fn test_world_offer_chosen_by_host_only() {
        let offer = Offer::world(choices());
        assert!(is_local_chooser(Role::Host, &offer, &roster(Role::Host)));

        let joiner = Role::Joiner(JoinerIndex::new(0));
        assert!(!is_local_chooser(joiner, &offer, &roster(joiner)));
    }

    #[test]
    fn test_host_chooses_for_seat_zero_only() {
        let roster = roster(Role::Host);
        let own = Offer::reward(ParticipantId::new(1), choices(), &roster);
        let remote = Offer::reward(ParticipantId::new(2), choices(), &roster);
        let bot = Offer::reward(ParticipantId::new(4), choices(), &roster);

        assert!(is_local_chooser(Role::Host, &own, &roster));
        assert!(!is_local_chooser(Role::Host, &remote, &roster));
        assert!(!is_local_chooser(Role::Host, &bot, &roster));
    }

    #[test]
    fn test_joiner_chooser_by_responder_or_metadata() {
        let role = Role::Joiner(JoinerIndex::new(1));
        let roster = roster(role);

        let mut offer = Offer::reward(ParticipantId::new(3), choices(), &roster);
        assert!(is_local_chooser(role, &offer, &roster));

        // Responder missing from the message, owner metadata still names us
        offer.responder = None;
        assert!(is_local_chooser(role, &offer, &roster));

        let other = Offer::reward(ParticipantId::new(2), choices(), &roster);
        assert!(!is_local_chooser(role, &other, &roster));
    }

    #[test]
    fn test_empty_offer_rejected() {
        assert_eq!(Offer::world(Vec::new()).validate(), Err(Error::EmptyOffer));
        assert!(Offer::world(choices()).validate().is_ok());
    }

    #[test]
    fn test_wire_conversion() {
        let roster = roster(Role::Host);
        let offer = Offer::reward(ParticipantId::new(2), choices(), &roster);
        assert_eq!(Offer::from(offer.to_message()), offer);
        assert_eq!(offer.summary().responder, Some(JoinerIndex::new(0)));
    }
}
