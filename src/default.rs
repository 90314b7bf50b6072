//! Constants for the retry policy.

/// The default number of retries after the first attempt.
pub const ATTEMPTS: i64 = 6;
/// The default ceiling for a single delay in milliseconds (5 seconds).
pub const MAX_BACKOFF_MILLIS: i64 = 5_000;
/// The attempt at which the base delay reaches the ceiling. The first
/// backoff unit is `max / 2^CEILING_ATTEMPT`.
pub const CEILING_ATTEMPT: i64 = 3;
