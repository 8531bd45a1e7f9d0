//! Cadence gating for passes that must not run every frame.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::GameTime;

/// Runs a pass at most once per interval of game time.
#[derive(Debug)]
pub struct Cadence {
    interval: Duration,
    last_run: Mutex<Duration>,
}

impl Cadence {
    /// A cadence whose first pass is due once `interval` of game time has passed.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: Mutex::new(Duration::ZERO),
        }
    }

    /// Call `pass` if at least one interval has passed since the last due tick.
    pub fn run_if_due(&self, game_time: &GameTime, pass: impl FnOnce()) -> bool {
        {
            let mut last_run = self.last_run.lock();
            if game_time.total.saturating_sub(*last_run) < self.interval {
                return false;
            }
            *last_run = game_time.total;
        }

        pass();
        true
    }
}

/// A dirty flag paired with a [`Cadence`].
///
/// Marking is lock-free. Bursts of marks between two due ticks collapse into
/// one run of the pass.
#[derive(Debug)]
pub struct DirtyCadence {
    dirty: AtomicBool,
    cadence: Cadence,
}

impl DirtyCadence {
    /// A clean flag gated by `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            dirty: AtomicBool::new(false),
            cadence: Cadence::new(interval),
        }
    }

    /// Request a run at the next due tick.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Whether a run is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// On a due tick, run `pass` if dirty. A pass returning `false` leaves the
    /// flag set so the next due tick tries again.
    pub fn run_if_due(&self, game_time: &GameTime, pass: impl FnOnce() -> bool) -> bool {
        let mut ran = false;
        self.cadence.run_if_due(game_time, || ran = self.flush(pass));
        ran
    }

    /// Run `pass` now if dirty, ignoring the cadence.
    pub fn flush(&self, pass: impl FnOnce() -> bool) -> bool {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return false;
        }

        if !pass() {
            self.mark_dirty();
        }
        true
    }
}
