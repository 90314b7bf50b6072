//! The cancellation-aware retry loop on the tokio timer.

use std::future::Future;
use std::time::Duration;

use crate::error::Error;
use crate::future::{self, TokioSleeper};
use crate::signal::Cancellation;

/// Runs `operation` until it succeeds, `attempts + 1` calls have failed, or
/// `signal` fires, sleeping on the tokio timer between calls.
///
/// See [`future::retry_with_cancellation`] for the exact semantics.
///
/// # Example
///
/// ```rust
/// # extern crate tokio_1 as tokio;
/// use std::time::Duration;
/// use jitter_retry::Signal;
///
/// async fn fetch(_signal: Signal) -> Result<&'static str, std::io::Error> {
///     // Business logic...
///     Ok("body")
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let signal = Signal::with_timeout(Duration::from_secs(30));
/// let body = jitter_retry::tokio::retry_with_cancellation(
///     signal,
///     3,
///     Duration::from_secs(5),
///     fetch,
/// )
/// .await
/// .unwrap();
/// assert_eq!(body, "body");
/// # }
/// ```
pub async fn retry_with_cancellation<C, F, Fut, T, E>(
    signal: C,
    attempts: i64,
    max_backoff: Duration,
    operation: F,
) -> Result<T, Error<E>>
where
    C: Cancellation,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    future::retry_with_cancellation(TokioSleeper, signal, attempts, max_backoff, operation).await
}
