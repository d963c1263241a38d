//! Bot pick pacing
//!
//! A bot's pick is played out as the same hover-then-commit sequence a
//! human produces, spread over short artificial delays, so spectators see
//! equivalent pacing.

use melee_core::{GameRng, Millis};
use std::collections::VecDeque;

/// Delays between the steps of a bot pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotPacing {
    /// Delay before each hover
    pub hover_delay: Millis,
    /// Delay between the final hover and the commit
    pub pick_delay: Millis,
    /// Upper bound of random extra delay added to every step
    pub jitter: Millis,
}

impl BotPacing {
    fn delay(&self, base: Millis, rng: &mut GameRng) -> Millis {
        if self.jitter == 0 {
            return base;
        }
        base + rng.up_to(self.jitter)
    }
}

impl Default for BotPacing {
    fn default() -> Self {
        Self {
            hover_delay: 450,
            pick_delay: 700,
            jitter: 150,
        }
    }
}

/// One step of a bot pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    Hover(usize),
    Commit(usize),
}

/// Scheduled steps of one bot pick
#[derive(Debug, Clone, PartialEq)]
pub struct BotPlan {
    steps: VecDeque<(Millis, BotAction)>,
}

impl BotPlan {
    /// Plan a pick of `decided` out of `len` choices starting at `now`
    ///
    /// With more than one choice the bot first browses a different card,
    /// then settles on the decided one, then commits.
    pub fn schedule(
        pacing: &BotPacing,
        len: usize,
        decided: usize,
        now: Millis,
        rng: &mut GameRng,
    ) -> Self {
        let mut steps = VecDeque::new();
        let mut at = now;

        if len > 1 {
            let offset = rng.up_to(len as u64 - 2) as usize;
            let browse = (decided + 1 + offset) % len;
            at += pacing.delay(pacing.hover_delay, rng);
            steps.push_back((at, BotAction::Hover(browse)));
        }

        at += pacing.delay(pacing.hover_delay, rng);
        steps.push_back((at, BotAction::Hover(decided)));
        at += pacing.delay(pacing.pick_delay, rng);
        steps.push_back((at, BotAction::Commit(decided)));

        Self { steps }
    }

    /// Take the next step if it is due
    pub fn due(&mut self, now: Millis) -> Option<BotAction> {
        match self.steps.front() {
            Some((at, _)) if *at <= now => self.steps.pop_front().map(|(_, action)| action),
            _ => None,
        }
    }

    /// When the next step is due
    pub fn next_at(&self) -> Option<Millis> {
        self.steps.front().map(|(at, _)| *at)
    }

    /// Check if every step has been taken
    pub fn is_done(&self) -> bool {
        self.steps.is_empty()
    }
}
