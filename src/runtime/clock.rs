//! Clock implementations driving timer deadlines.

use std::cell::Cell;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Time source consulted by the event loop when timers are pending
pub trait Clock {
    /// Milliseconds elapsed since the clock was created
    fn now_ms(&self) -> u64;

    /// Block (or jump) until `deadline_ms` has been reached
    fn advance_to(&self, deadline_ms: u64);
}

/// Which clock a runtime is built with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockKind {
    /// Deterministic virtual time; timers fire instantly in deadline order
    #[default]
    Virtual,
    /// Wall-clock time; the loop sleeps until the next deadline
    System,
}

impl ClockKind {
    /// Build a boxed clock of this kind
    pub fn build(self) -> Box<dyn Clock> {
        match self {
            ClockKind::Virtual => Box::new(VirtualClock::new()),
            ClockKind::System => Box::new(SystemClock::new()),
        }
    }
}

/// Virtual clock for deterministic runs.
///
/// Time only moves when the event loop advances it to the next timer
/// deadline, so a 200ms timer costs nothing to wait for.
#[derive(Debug, Default)]
pub struct VirtualClock {
    now: Cell<u64>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now: Cell::new(now_ms),
        }
    }
}

impl Clock for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn advance_to(&self, deadline_ms: u64) {
        // Never move backwards
        if deadline_ms > self.now.get() {
            self.now.set(deadline_ms);
        }
    }
}

/// Real clock capability using monotonic system time
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
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
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn advance_to(&self, deadline_ms: u64) {
        let now = self.now_ms();
        if deadline_ms > now {
            std::thread::sleep(Duration::from_millis(deadline_ms - now));
        }
    }
}
