use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

use crate::backoff::{as_millis_saturating, backoff};

/// Calls `operation` until it returns `false`, but never more than
/// `attempts + 1` times. Before call `n` the thread sleeps for
/// [`backoff(n, max_backoff)`](crate::backoff::backoff), so the first call
/// happens right away.
///
/// `true` means "try again". The loop reports nothing back, so capture the
/// outcome in a variable the closure borrows. A negative `attempts` makes
/// no calls at all.
///
/// ```rust
/// use std::time::Duration;
///
/// fn do_something(calls: u32) -> Result<(), &'static str> {
///     if calls < 2 { Err("not yet") } else { Ok(()) }
/// }
///
/// let mut calls = 0;
/// let mut result = Err("never called");
/// jitter_retry::retry(6, Duration::from_millis(5), || {
///     calls += 1;
///     result = do_something(calls);
///     result.is_err()
/// });
/// assert_eq!(result, Ok(()));
/// assert_eq!(calls, 2);
/// ```
pub fn retry<F>(attempts: i64, max_backoff: Duration, mut operation: F)
where
    F: FnMut() -> bool,
{
    for attempt in 0..=attempts {
        let delay = backoff(attempt, max_backoff);
        trace!(attempt, delay_ms = as_millis_saturating(delay), "sleeping before attempt");
        thread::sleep(delay);

        if !operation() {
            debug!(attempt, "operation asked to stop retrying");
            return;
        }
    }
    debug!(attempts, "retry budget exhausted");
}
