//! Session configuration
//!
//! Loaded from RON. Every field has a default, so a partial file (or an
//! empty `()`) is valid. Out-of-range values are clamped on load.

use crate::Result;
use melee_core::Millis;
use melee_draft::BotPacing;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration shared by host and joiner sessions
///
/// # Example
///
/// ```
/// use melee_session::SessionConfig;
///
/// let config = SessionConfig::from_ron("(seat_count: 2)").unwrap();
/// assert_eq!(config.seat_count, 2);
/// assert_eq!(config.interpolation_delay_ms, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of roster seats, seat 0 being the host's
    ///
    /// Clamped to `[1, MAX_SEATS]`.
    pub seat_count: u8,
    /// Intentional render lag used to smooth snapshot jitter
    pub interpolation_delay_ms: Millis,
    /// Maximum buffered snapshots before the oldest is dropped
    ///
    /// Clamped to at least 1.
    pub snapshot_buffer_depth: usize,
    /// Time between host snapshots (50 ms is 20 Hz)
    ///
    /// Clamped to at least 1.
    pub snapshot_interval_ms: Millis,
    /// Bot delay before each hover
    pub bot_hover_delay_ms: Millis,
    /// Bot delay between settling on a card and committing it
    pub bot_pick_delay_ms: Millis,
    /// Upper bound of random extra bot delay per step
    pub bot_delay_jitter_ms: Millis,
    /// Seed for bot pacing jitter
    pub bot_seed: u64,
}

impl SessionConfig {
    /// Largest supported seat table
    pub const MAX_SEATS: u8 = 8;

    /// Parse a RON document
    pub fn from_ron(source: &str) -> Result<Self> {
        let config: SessionConfig = ron::from_str(source)?;
        Ok(config.clamped())
    }

    /// Read and parse a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron(&source)
    }

    /// Bring every field into its valid range
    pub fn clamped(mut self) -> Self {
        self.seat_count = self.seat_count.clamp(1, Self::MAX_SEATS);
        self.snapshot_buffer_depth = self.snapshot_buffer_depth.max(1);
        self.snapshot_interval_ms = self.snapshot_interval_ms.max(1);
        self
    }

    /// Number of joiner slots (every seat but the host's)
    pub fn joiner_slots(&self) -> u8 {
        self.seat_count.saturating_sub(1)
    }

    /// Bot pacing for the draft arbiter
    pub fn bot_pacing(&self) -> BotPacing {
        BotPacing {
            hover_delay: self.bot_hover_delay_ms,
            pick_delay: self.bot_pick_delay_ms,
            jitter: self.bot_delay_jitter_ms,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seat_count: 4,
            interpolation_delay_ms: 20,
            snapshot_buffer_depth: 10,
            snapshot_interval_ms: 50,
            bot_hover_delay_ms: 450,
            bot_pick_delay_ms: 700,
            bot_delay_jitter_ms: 150,
            bot_seed: 0x5eed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.seat_count, 4);
        assert_eq!(config.joiner_slots(), 3);
        assert_eq!(config.snapshot_buffer_depth, 10);
        assert_eq!(config.bot_pacing(), BotPacing::default());
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(SessionConfig::from_ron("()").unwrap(), SessionConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = SessionConfig::from_ron(
            "(interpolation_delay_ms: 35, bot_seed: 7)",
        )
        .unwrap();
        assert_eq!(config.interpolation_delay_ms, 35);
        assert_eq!(config.bot_seed, 7);
        assert_eq!(config.seat_count, 4);
    }

    #[test]
    fn test_values_clamped() {
        let config = SessionConfig::from_ron(
            "(seat_count: 40, snapshot_buffer_depth: 0, snapshot_interval_ms: 0)",
        )
        .unwrap();
        assert_eq!(config.seat_count, SessionConfig::MAX_SEATS);
        assert_eq!(config.snapshot_buffer_depth, 1);
        assert_eq!(config.snapshot_interval_ms, 1);

        let config = SessionConfig::from_ron("(seat_count: 0)").unwrap();
        assert_eq!(config.seat_count, 1);
        assert_eq!(config.joiner_slots(), 0);
    }

    #[test]
    fn test_invalid_document() {
        assert!(SessionConfig::from_ron("(seat_count: \"four\")").is_err());
    }

    #[test]
    fn test_serialized_config_reads_back() {
        let config = SessionConfig {
            seat_count: 3,
            ..SessionConfig::default()
        };
        let text = ron::to_string(&config).unwrap();
        assert_eq!(SessionConfig::from_ron(&text).unwrap(), config);
    }
}
