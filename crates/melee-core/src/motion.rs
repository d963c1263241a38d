//! Render-side motion state attached to a participant
//!
//! Joiners never snap a participant to a new authoritative position (except
//! the first time they see it). Instead they blend linearly from wherever
//! the participant is currently drawn towards the new target.

use crate::{Millis, Vec2};
use serde::{Deserialize, Serialize};

/// A single linear blend towards an authoritative position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Blend {
    /// Rendered position when the blend began
    pub start: Vec2,
    /// Authoritative position being blended towards
    pub target: Vec2,
    /// Local time the blend began
    pub started_at: Millis,
    /// Blend length in milliseconds
    pub duration: Millis,
}

impl Blend {
    /// Blend progress at `now`, clamped to `[0, 1]`
    pub fn progress(&self, now: Millis) -> f32 {
        if self.duration == 0 {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at);
        (elapsed as f32 / self.duration as f32).clamp(0.0, 1.0)
    }

    /// Position at `now`
    pub fn sample(&self, now: Millis) -> Vec2 {
        self.start.lerp(self.target, self.progress(now))
    }
}

/// Interpolation state for one participant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    target: Vec2,
    blend: Option<Blend>,
    initialized: bool,
}

impl Motion {
    /// Create uninitialized motion state
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump straight to `position` with no blend
    pub fn snap(&mut self, position: Vec2) {
        self.target = position;
        self.blend = None;
        self.initialized = true;
    }

    /// Start blending from the currently rendered position to `target`
    ///
    /// Falls back to a snap when there is nothing to blend from.
    pub fn blend_to(&mut self, target: Vec2, now: Millis, duration: Millis) {
        if !self.initialized {
            self.snap(target);
            return;
        }
        let start = self.sample(now);
        self.target = target;
        self.blend = Some(Blend {
            start,
            target,
            started_at: now,
            duration,
        });
    }

    /// Rendered position at `now`
    pub fn sample(&self, now: Millis) -> Vec2 {
        match &self.blend {
            Some(blend) => blend.sample(now),
            None => self.target,
        }
    }

    /// Latest authoritative position
    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// The active blend, if any
    pub fn blend(&self) -> Option<&Blend> {
        self.blend.as_ref()
    }

    /// Check if a position has ever been applied
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Forget the current position so the next update snaps
    pub fn invalidate(&mut self) {
        self.blend = None;
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_update_snaps() {
        let mut motion = Motion::new();
        motion.blend_to(Vec2::new(10.0, 0.0), 100, 20);

        assert!(motion.is_initialized());
        assert!(motion.blend().is_none());
        assert_eq!(motion.sample(100), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_blend_progress() {
        let mut motion = Motion::new();
        motion.snap(Vec2::new(0.0, 0.0));
        motion.blend_to(Vec2::new(10.0, 0.0), 100, 20);

        assert_eq!(motion.sample(100), Vec2::new(0.0, 0.0));
        assert_eq!(motion.sample(110), Vec2::new(5.0, 0.0));
        assert_eq!(motion.sample(120), Vec2::new(10.0, 0.0));
        // Clamped after the blend ends
        assert_eq!(motion.sample(500), Vec2::new(10.0, 0.0));
        assert_eq!(motion.target(), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_blend_starts_from_rendered_position() {
        let mut motion = Motion::new();
        motion.snap(Vec2::new(0.0, 0.0));
        motion.blend_to(Vec2::new(10.0, 0.0), 0, 20);

        // Halfway through, a newer target arrives
        motion.blend_to(Vec2::new(20.0, 0.0), 10, 20);
        let blend = motion.blend().unwrap();
        assert_eq!(blend.start, Vec2::new(5.0, 0.0));
        assert_eq!(motion.sample(20), Vec2::new(12.5, 0.0));
    }

    #[test]
    fn test_zero_duration() {
        let mut motion = Motion::new();
        motion.snap(Vec2::ZERO);
        motion.blend_to(Vec2::new(4.0, 4.0), 50, 0);
        assert_eq!(motion.sample(50), Vec2::new(4.0, 4.0));
    }

    #[test]
    fn test_invalidate() {
        let mut motion = Motion::new();
        motion.snap(Vec2::new(1.0, 1.0));
        motion.invalidate();
        assert!(!motion.is_initialized());

        motion.blend_to(Vec2::new(9.0, 9.0), 0, 20);
        assert!(motion.blend().is_none());
    }
}
