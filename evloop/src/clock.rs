//! Monotonic time sources.
//!
//! The reactor never reads the system time directly: it asks a [`Clock`]
//! for "now" and for a blocking wait until an absolute deadline. All values
//! are microseconds since an arbitrary, fixed epoch.
//!
//! - [`MonotonicClock`] is backed by the OS monotonic clock and is the
//!   default.
//! - [`ManualClock`] is a virtual clock whose `sleep_until_us` simply jumps
//!   forward, which makes timer behaviour deterministic in tests and
//!   simulations.

use crate::reactor::poller::platform::{sys_monotonic_us, sys_sleep_until_us};

use std::cell::Cell;
use std::rc::Rc;

/// A monotonic clock the reactor uses to compute and await deadlines.
pub trait Clock {
    /// Current time in microseconds.
    fn now_us(&self) -> u64;

    /// Blocks the calling thread until [`now_us`](Self::now_us) reaches
    /// `deadline`. Must return immediately if `deadline` is already past.
    fn sleep_until_us(&self, deadline: u64);
}

/// The OS monotonic clock (`CLOCK_MONOTONIC`).
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicClock;

impl MonotonicClock {
    /// Creates a handle to the OS monotonic clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    fn now_us(&self) -> u64 {
        match sys_monotonic_us() {
            Ok(now) => now,
            Err(err) => {
                // CLOCK_MONOTONIC is mandatory on every supported target.
                log::error!("monotonic clock unavailable: {err}");
                panic!("monotonic clock unavailable: {err}");
            }
        }
    }

    fn sleep_until_us(&self, deadline: u64) {
        if let Err(err) = sys_sleep_until_us(deadline) {
            log::warn!("sleep until {deadline}us failed: {err}");
        }
    }
}

/// A virtual clock advanced only by sleeping or by explicit calls.
///
/// Clones share the same time, so a test can keep one handle while the
/// reactor owns another.
///
/// # Examples
///
/// ```rust
/// use evloop::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// clock.sleep_until_us(3000);
/// assert_eq!(clock.now_us(), 3000);
///
/// // Never moves backwards.
/// clock.sleep_until_us(1000);
/// assert_eq!(clock.now_us(), 3000);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    /// Creates a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock reading `now`.
    pub fn starting_at(now: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    /// Moves the clock forward by `delta` microseconds.
    pub fn advance(&self, delta: u64) {
        self.now.set(self.now.get().saturating_add(delta));
    }

    /// Sets the clock to `now`, unless that would move it backwards.
    pub fn set(&self, now: u64) {
        if now > self.now.get() {
            self.now.set(now);
        }
    }
}

impl Clock for ManualClock {
    fn now_us(&self) -> u64 {
        self.now.get()
    }

    fn sleep_until_us(&self, deadline: u64) {
        self.set(deadline);
    }
}
