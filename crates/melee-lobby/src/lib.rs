//! Melee Lobby - Pre-match readiness
//!
//! The host holds the single authoritative seat → ready map and may start
//! the match only once every human seat is ready. Joiners request changes
//! to their own seat and display the map the host broadcasts.

mod error;
mod readiness;

pub use error::{Error, Result};
pub use readiness::{ReadinessCoordinator, ReadyEvent};
