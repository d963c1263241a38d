//! Melee Draft - Turn-based card draft arbitration
//!
//! Offers a set of named choices to one chooser, mirrors the chooser's
//! hover to every other process and resolves the offer to exactly one
//! applied choice. The host is the tie-breaker: a joiner's pick is only a
//! request until the host broadcasts the apply.
//!
//! - **Offer**: what is being chosen and who may choose it
//! - **DraftArbiter**: the offer → hover → pick → apply state machine, with a FIFO of queued offers
//! - **EffectApplier** / **BotDecider**: injected collaborators for effects and bot choices
//! - **BotPacing**: hover-then-commit timing for bot picks
//!
//! # Example
//!
//! ```rust,ignore
//! use melee_draft::{DraftArbiter, Offer};
//!
//! let mut arbiter = DraftArbiter::new(Role::Host).with_applier(effects);
//! let output = arbiter.offer(Offer::reward(target, choices, &roster), &roster, now)?;
//! deliver(output.outbound);
//!
//! // later, from the network
//! let output = arbiter.on_pick_request(&select, sender_id, &roster, now)?;
//! ```

mod arbiter;
mod capability;
mod error;
mod offer;
mod pacing;

pub use arbiter::{DraftArbiter, DraftEvent, DraftOutput, DraftPhase};
pub use capability::{BotDecider, EffectApplier};
pub use error::{Error, Result};
pub use offer::{is_local_chooser, Offer};
pub use pacing::{BotAction, BotPacing, BotPlan};
