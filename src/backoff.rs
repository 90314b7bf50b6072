//! Exponential backoff with jitter.
//!
//! The delay before attempt `n` is `max / 8 * 2^n` plus a random jitter drawn
//! from `[0, max / 8 * n)`, clamped to `max`. Attempt 0 never waits and the
//! ceiling is reached by the third attempt.

use std::time::Duration;

use rand::Rng;

use crate::default::CEILING_ATTEMPT;

/// Returns the delay to wait before `attempt` when a single delay may not
/// exceed `max`.
///
/// Attempts below 1 get no delay, attempts above 3 (and any attempt when
/// `max` is zero) get exactly `max`. The result is always within `[0, max]`.
///
/// Useful on its own when you drive the retries yourself but want the same
/// timing as [`retry`](crate::retry).
///
/// ```rust
/// use std::time::Duration;
/// use jitter_retry::backoff::backoff;
///
/// let max = Duration::from_secs(8);
/// assert_eq!(backoff(0, max), Duration::ZERO);
/// assert!(backoff(2, max) <= max);
/// assert_eq!(backoff(4, max), max);
/// ```
pub fn backoff(attempt: i64, max: Duration) -> Duration {
    backoff_with_rng(attempt, max, &mut rand::thread_rng())
}

/// Same as [`backoff`] but draws the jitter from `rng`.
pub fn backoff_with_rng<R>(attempt: i64, max: Duration, rng: &mut R) -> Duration
where
    R: Rng + ?Sized,
{
    if attempt < 1 {
        return Duration::ZERO;
    }
    if attempt > CEILING_ATTEMPT || max.is_zero() {
        return max;
    }

    // attempt is 1..=3 from here on, so none of the products can exceed max.
    let unit = max / (1 << CEILING_ATTEMPT);
    let jitter_bound = unit * attempt as u32;
    let base = unit * (1 << attempt);

    // max below 8ns leaves a zero unit and an empty jitter range.
    let jitter = if jitter_bound.is_zero() {
        Duration::ZERO
    } else {
        rng.gen_range(Duration::ZERO..jitter_bound)
    };

    match base.checked_add(jitter) {
        Some(delay) if delay <= max => delay,
        _ => max,
    }
}

/// Whole milliseconds in `delay` for log fields, saturating at `u64::MAX`.
pub(crate) fn as_millis_saturating(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const MAX: Duration = Duration::from_secs(8);

    #[test]
    fn first_attempt_does_not_wait() {
        for attempt in -10..1 {
            assert_eq!(backoff(attempt, MAX), Duration::ZERO);
        }
        assert_eq!(backoff(i64::MIN, MAX), Duration::ZERO);
    }

    #[test]
    fn late_attempts_get_the_ceiling() {
        for attempt in 4..1000 {
            assert_eq!(backoff(attempt, MAX), MAX);
        }
        assert_eq!(backoff(i64::MAX, MAX), MAX);
    }

    #[test]
    fn zero_max_is_returned_as_is() {
        for attempt in 1..10 {
            assert_eq!(backoff(attempt, Duration::ZERO), Duration::ZERO);
        }
    }

    #[test]
    fn never_exceeds_max() {
        let maxes = [
            Duration::from_nanos(1),
            Duration::from_nanos(7),
            Duration::from_nanos(15),
            Duration::from_millis(1),
            Duration::from_secs(8),
            Duration::from_secs(3600),
            Duration::MAX,
        ];
        for max in maxes {
            for attempt in -10..1000 {
                assert!(backoff(attempt, max) <= max, "attempt {} max {:?}", attempt, max);
            }
        }
    }

    #[test]
    fn grows_within_jitter_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let unit = MAX / 8;

        for _ in 0..500 {
            for attempt in 1..=3u32 {
                let base = unit * (1 << attempt);
                let delay = backoff_with_rng(attempt as i64, MAX, &mut rng);
                assert!(delay >= base.min(MAX));
                assert!(delay <= MAX);
                if base + unit * attempt <= MAX {
                    assert!(delay < base + unit * attempt);
                }
            }
        }
    }

    #[test]
    fn tiny_max_has_no_jitter() {
        let max = Duration::from_nanos(5);
        for attempt in 1..=3 {
            assert_eq!(backoff(attempt, max), Duration::ZERO);
        }
        assert_eq!(backoff(4, max), max);
    }

    #[test]
    fn millis_saturate() {
        assert_eq!(as_millis_saturating(Duration::from_millis(1500)), 1500);
        assert_eq!(as_millis_saturating(Duration::MAX), u64::MAX);
    }

    #[test]
    fn tail_is_constant() {
        let third = backoff(3, MAX);
        assert_eq!(third, MAX);
        for attempt in 4..1000 {
            assert_eq!(third, backoff(attempt, MAX));
        }
    }
}
