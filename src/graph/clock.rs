// src/graph/clock.rs
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic source of "seconds elapsed" used to stamp each commit.
pub trait Clock {
    fn now_secs(&self) -> f32;
}

/// Wall clock measured from construction.
#[derive(Clone, Debug)]
pub struct SystemClock {
    started_at: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_secs(&self) -> f32 {
        self.started_at.elapsed().as_secs_f32()
    }
}

/// Hand-driven clock for tests and deterministic playback. Clones share the
/// same time, so a test can keep one handle while the handler owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<f32>>,
}

impl ManualClock {
    pub fn new(start_secs: f32) -> Self {
        Self {
            now: Rc::new(Cell::new(start_secs)),
        }
    }

    pub fn set(&self, secs: f32) {
        self.now.set(secs);
    }

    pub fn advance(&self, secs: f32) {
        self.now.set(self.now.get() + secs);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> f32 {
        self.now.get()
    }
}
