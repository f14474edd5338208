//! Poll-with-timeout helper for observing external window state
//!
//! Overlay windows belong to other processes, so the only way to know one
//! has appeared or gone away is to ask repeatedly. All waiting goes through
//! `poll_until` so interval and deadline are set in one place instead of
//! ad-hoc sleep loops.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

/// The observed condition did not hold before the deadline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutError {
    /// What was being waited for, e.g. "overlay dismissal"
    pub what: &'static str,
    /// The full timeout that elapsed
    pub waited: Duration,
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timed out waiting for {} after {:?}", self.what, self.waited)
    }
}

impl std::error::Error for TimeoutError {}

/// Block until `condition` returns true, checking every `interval`.
///
/// The condition is checked once immediately, so a zero timeout succeeds
/// when the condition already holds. Fails with [`TimeoutError`] exactly
/// when `timeout` elapses with the condition still false.
pub fn poll_until(
    what: &'static str,
    interval: Duration,
    timeout: Duration,
    mut condition: impl FnMut() -> bool,
) -> Result<(), TimeoutError> {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return Ok(());
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(TimeoutError {
                what,
                waited: timeout,
            });
        }
        thread::sleep(interval.min(deadline - now));
    }
}
