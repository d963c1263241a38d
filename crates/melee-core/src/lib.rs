//! Melee Core - Shared types for the authoritative-host synchronization layer
//!
//! This crate provides the leaf types every other melee crate builds on:
//! - Stable identities (`ParticipantId`, `SeatIndex`, `JoinerIndex`)
//! - The explicit process `Role` (host or a numbered joiner)
//! - Dynamic metadata values (`Value`, `ValueMap`)
//! - Participants, seats and the `Roster` reconciler
//! - Render-side `Motion` blending between authoritative positions
//! - Time sources, deterministic RNG and a small publish/subscribe `Notifier`
//!
//! ## Roster Reconciliation
//!
//! ```text
//! Snapshot participants ──▶ Roster::reconcile ──▶ Vec<SeatChange>
//!                              │
//!                              ├── known id   → update in place (motion kept)
//!                              ├── new id     → create, compute remote flag
//!                              └── absent id  → clear seat, keep in departed cache
//! ```
//!
//! Reconciliation is best-effort and idempotent: malformed descriptors are
//! skipped, inconsistent seats are cleared, and nothing is ever returned as
//! an error.

mod error;
mod identity;
mod math;
mod motion;
mod notify;
mod participant;
mod rng;
mod role;
mod roster;
mod seat;
pub mod time;
mod value;

pub use error::{Error, Result};
pub use identity::{IdAllocator, JoinerIndex, ParticipantId, SeatIndex};
pub use math::Vec2;
pub use motion::{Blend, Motion};
pub use notify::{Notifier, SubscriptionId};
pub use participant::{meta, Participant, ParticipantState};
pub use rng::GameRng;
pub use role::Role;
pub use roster::{Roster, SeatChange};
pub use seat::{OccupantKind, Seat, SeatTable};
pub use time::{Clock, ManualClock, Millis, SystemClock};
pub use value::{Value, ValueMap};
