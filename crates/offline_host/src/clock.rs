//! Wall-clock sources for entry timestamps and message stamps.

use std::{cell::Cell, rc::Rc};
#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of unix millisecond timestamps.
pub trait Clock {
    /// Current time in unix milliseconds.
    fn now_unix_ms(&self) -> u64;
}

/// Returns the current unix timestamp in milliseconds.
pub fn unix_time_ms_now() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now().max(0.0) as u64
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Host wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_ms(&self) -> u64 {
        unix_time_ms_now()
    }
}

#[derive(Debug, Clone, Default)]
/// Manually advanced clock for tests; clones share the same time.
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    /// Creates a clock frozen at `now`.
    pub fn at(now: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    /// Moves the clock forward by `millis`.
    pub fn advance(&self, millis: u64) {
        self.now.set(self.now.get().saturating_add(millis));
    }
}

impl Clock for ManualClock {
    fn now_unix_ms(&self) -> u64 {
        self.now.get()
    }
}
