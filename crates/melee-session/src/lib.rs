//! Melee Session - Host and joiner match sessions
//!
//! Wires the roster, snapshot interpolation, draft arbiter and readiness
//! coordinator to a transport and to the host's simulation. One session is
//! constructed per match; components are handed to each other explicitly.
//!
//! # Architecture
//!
//! ```text
//!        Host                                          Joiner
//! ┌──────────────────────┐    state-update     ┌──────────────────────┐
//! │ Simulation           │ ──────────────────▶ │ Interpolator         │
//! │ Roster (authority)   │    card-offer/apply │ Replica + Roster     │
//! │ DraftArbiter         │ ──────────────────▶ │ DraftArbiter (mirror)│
//! │ ReadinessCoordinator │    ready-state      │ Readiness (mirror)   │
//! │                      │ ◀────────────────── │                      │
//! └──────────────────────┘ input, card-select  └──────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use melee_session::{HostSession, SessionConfig};
//!
//! let config = SessionConfig::load("session.ron")?;
//! let mut host = HostSession::new(config, arena).with_applier(effects);
//! host.seat_host("Ash", "#e07a5f")?;
//!
//! loop {
//!     for (joiner, bytes) in network.poll() {
//!         host.receive(joiner, &bytes, clock.now());
//!     }
//!     host.tick(clock.now());
//!     host.flush(&peers);
//! }
//! ```

mod config;
mod error;
mod host;
mod joiner;
mod simulation;

#[cfg(test)]
mod test_support;

pub use config::SessionConfig;
pub use error::{Error, Result};
pub use host::HostSession;
pub use joiner::{JoinerSession, SessionNotice};
pub use simulation::Simulation;
