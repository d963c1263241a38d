//! Melee Netcode - Snapshot synchronization for joiner processes
//!
//! This crate carries everything that crosses the wire and everything a
//! joiner does with it:
//!
//! - **Snapshot**: Immutable, timestamped full-world description from the host
//! - **Wire**: The `Message` enum and its binary codec
//! - **Snapshot Buffer**: Bounded FIFO of received snapshots stamped with receipt time
//! - **Interpolation**: Drains due snapshots on a fixed delay and blends positions
//! - **Replica**: The joiner's local copy of the world, fed by the interpolator
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Joiner                               │
//! │  ┌────────────┐  ┌─────────────────┐  ┌──────────────────┐   │
//! │  │  Network   │─▶│ Snapshot Buffer │─▶│   Interpolator   │   │
//! │  └────────────┘  └─────────────────┘  └──────────────────┘   │
//! │                                              │               │
//! │                                              ▼               │
//! │                   ┌────────────────┐  ┌──────────────────┐   │
//! │                   │    Renderer    │◀─│ Replica + Roster │   │
//! │                   └────────────────┘  └──────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use melee_netcode::{Interpolator, Replica};
//!
//! let mut interpolator = Interpolator::new(20, 10);
//! let mut replica = Replica::new(role, 4);
//!
//! loop {
//!     while let Some(snapshot) = receive_snapshot() {
//!         interpolator.receive(snapshot, clock.now());
//!     }
//!     interpolator.tick(clock.now(), &mut replica);
//!     renderer.render(&replica.render_frame(clock.now()));
//! }
//! ```

mod buffer;
mod card;
mod codec;
mod error;
mod interpolation;
mod replica;
mod snapshot;
mod transport;
mod wire;

pub use buffer::{BufferedSnapshot, SnapshotBuffer};
pub use card::{Choice, DraftSummary, OfferKind};
pub use codec::{decode_entities, encode_entities, StateCodec};
pub use error::{Error, Result};
pub use interpolation::{Interpolator, TickReport};
pub use replica::{RenderFrame, RenderedParticipant, Renderer, Replica};
pub use snapshot::{EntityState, MatchCounters, Snapshot};
pub use transport::{send_message, Connection, Destination, Outbound};
pub use wire::{
    CardApply, CardHover, CardOffer, CardSelect, InputFrame, Message, MoveKeys, ReadyState,
    Rename, RoundReset,
};
