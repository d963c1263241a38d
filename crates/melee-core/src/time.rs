//! Time sources for the cooperative event loop
//!
//! Every component takes the current time as an explicit `Millis` argument.
//! Sessions read it from an injected [`Clock`]:
//! - `SystemClock` - monotonic wall time since construction
//! - `ManualClock` - driven by hand (tests, lockstep demos)

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Milliseconds on a process-local monotonic timeline
pub type Millis = u64;

/// A source of the current local time
pub trait Clock {
    /// Current time in milliseconds
    fn now(&self) -> Millis;
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> Millis {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Millis {
        (**self).now()
    }
}

/// Monotonic clock measuring milliseconds since it was created
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose zero is now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Millis {
        self.origin.elapsed().as_millis() as Millis
    }
}

/// A clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Millis>,
}

impl ManualClock {
    /// Create a manual clock at the given time
    pub fn new(start: Millis) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, now: Millis) {
        self.now.set(now);
    }

    /// Move forward by `delta` milliseconds
    pub fn advance(&self, delta: Millis) {
        self.now.set(self.now.get() + delta);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.now.get()
    }
}
