use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use futures_core::ready;
use pin_project::pin_project;
use tracing::{debug, trace};

use crate::backoff::{as_millis_saturating, backoff};
use crate::error::{Cancelled, Error, InvalidArgument};
use crate::signal::Cancellation;

pub trait Sleeper {
    type Sleep: Future<Output = ()> + Send + 'static;
    fn sleep(&self, dur: Duration) -> Self::Sleep;
}

/// Runs `operation` until it succeeds, `attempts + 1` calls have failed, or
/// `signal` fires. Before call `n` it waits for
/// [`backoff(n, max_backoff)`](crate::backoff::backoff) using `sleeper`,
/// so the first call happens right away.
///
/// Every call receives a clone of `signal` so long running operations can
/// give up on their own. The loop never interrupts a call in flight: it
/// only refuses to start new ones once the signal has fired.
///
/// # Errors
///
/// * [`Error::InvalidArgument`] if `attempts` is negative. `operation` is
///   not called.
/// * [`Error::Cancelled`] if `signal` fires while waiting between attempts,
///   or if it has fired by the time a failed attempt returns.
/// * [`Error::Exhausted`] with the last error once every attempt failed.
///
/// If you're using tokio, you may want to look at
/// [`crate::tokio::retry_with_cancellation`].
///
/// # Example
///
/// ```rust
/// # struct MySleeper;
/// # impl jitter_retry::future::Sleeper for MySleeper {
/// #     type Sleep = std::future::Ready<()>;
/// #     fn sleep(&self, _dur: std::time::Duration) -> Self::Sleep { std::future::ready(()) }
/// # }
/// # #[derive(Clone)]
/// # struct Never;
/// # impl jitter_retry::Cancellation for Never {
/// #     type Wait = std::future::Pending<()>;
/// #     fn is_cancelled(&self) -> bool { false }
/// #     fn reason(&self) -> Option<jitter_retry::Cancelled> { None }
/// #     fn wait(&self) -> Self::Wait { std::future::pending() }
/// # }
/// use std::time::Duration;
///
/// async fn f(_signal: Never) -> Result<(), &'static str> {
///     // Business logic...
///     Err("error")
/// }
///
/// # async fn go() {
/// let signal = Never;
/// let err = jitter_retry::future::retry_with_cancellation(
///     MySleeper,
///     signal,
///     3,
///     Duration::from_millis(10),
///     f,
/// )
/// .await
/// .unwrap_err();
/// assert_eq!(err.to_string(), "gave up after 4 attempts: error");
/// # }
/// # fn main() { futures_executor::block_on(go()); }
/// ```
pub async fn retry_with_cancellation<S, C, F, Fut, T, E>(
    sleeper: S,
    signal: C,
    attempts: i64,
    max_backoff: Duration,
    operation: F,
) -> Result<T, Error<E>>
where
    S: Sleeper,
    C: Cancellation,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = u64::try_from(attempts).map_err(|_| InvalidArgument::NegativeAttempts(attempts))?;
    Retry::new(sleeper, signal, attempts, max_backoff, operation).await
}

/// Retry implementation.
#[pin_project]
pub struct Retry<S: Sleeper, C: Cancellation, F, Fut> {
    /// The [`Sleeper`] that we generate the delay futures from.
    sleeper: S,

    /// Signal handed to every attempt.
    signal: C,

    /// Resolves once `signal` fires. Raced against the delay.
    #[pin]
    cancelled: C::Wait,

    /// Operation to be retried. It must return [`Future`].
    operation: F,

    #[pin]
    state: State<S::Sleep, Fut>,

    /// Index of the current attempt, starting at 0.
    attempt: u64,

    /// Last attempt index allowed.
    attempts: u64,

    max_backoff: Duration,
}

#[pin_project(project = StateProj)]
enum State<Sl, Fut> {
    /// Waiting out the backoff before the next call.
    Delaying(#[pin] Sl),
    /// A call is in flight.
    Running(#[pin] Fut),
    Done,
}

impl<S, C, F, Fut, T, E> Retry<S, C, F, Fut>
where
    S: Sleeper,
    C: Cancellation,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    /// Creates the retry future. Unlike [`retry_with_cancellation`] the
    /// budget is already known to be valid.
    pub fn new(sleeper: S, signal: C, attempts: u64, max_backoff: Duration, operation: F) -> Self {
        let cancelled = signal.wait();
        let delay = sleeper.sleep(backoff(0, max_backoff));
        Retry {
            sleeper,
            signal,
            cancelled,
            operation,
            state: State::Delaying(delay),
            attempt: 0,
            attempts,
            max_backoff,
        }
    }
}

impl<S, C, F, Fut, T, E> Future for Retry<S, C, F, Fut>
where
    S: Sleeper,
    C: Cancellation,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    type Output = Result<T, Error<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();

        loop {
            match this.state.as_mut().project() {
                StateProj::Delaying(delay) => {
                    // Cancellation is checked first so an already fired signal
                    // wins over an elapsed timer.
                    if this.signal.is_cancelled() || this.cancelled.as_mut().poll(cx).is_ready() {
                        let reason = this.signal.reason().unwrap_or(Cancelled::Canceled);
                        debug!(attempt = *this.attempt, %reason, "retry cancelled while backing off");
                        // Drops the pending timer.
                        this.state.set(State::Done);
                        return Poll::Ready(Err(Error::Cancelled(reason)));
                    }

                    ready!(delay.poll(cx));
                    trace!(attempt = *this.attempt, "starting attempt");
                    let fut = (this.operation)(this.signal.clone());
                    this.state.set(State::Running(fut));
                }
                StateProj::Running(fut) => {
                    let err = match ready!(fut.poll(cx)) {
                        Ok(v) => {
                            this.state.set(State::Done);
                            return Poll::Ready(Ok(v));
                        }
                        Err(err) => err,
                    };

                    if this.signal.is_cancelled() {
                        let reason = this.signal.reason().unwrap_or(Cancelled::Canceled);
                        debug!(attempt = *this.attempt, %reason, error = %err, "retry cancelled during attempt");
                        this.state.set(State::Done);
                        return Poll::Ready(Err(Error::Cancelled(reason)));
                    }

                    if *this.attempt >= *this.attempts {
                        let attempts = this.attempt.saturating_add(1);
                        debug!(attempts, error = %err, "retry attempts exhausted");
                        this.state.set(State::Done);
                        return Poll::Ready(Err(Error::Exhausted {
                            attempts,
                            source: err,
                        }));
                    }

                    *this.attempt += 1;
                    let delay = backoff(
                        i64::try_from(*this.attempt).unwrap_or(i64::MAX),
                        *this.max_backoff,
                    );
                    trace!(
                        attempt = *this.attempt,
                        delay_ms = as_millis_saturating(delay),
                        error = %err,
                        "attempt failed, backing off"
                    );
                    this.state.set(State::Delaying(this.sleeper.sleep(delay)));
                }
                StateProj::Done => panic!("`Retry` polled after completion"),
            }
        }
    }
}

#[cfg(feature = "tokio")]
pub(crate) struct TokioSleeper;

#[cfg(feature = "tokio")]
impl Sleeper for TokioSleeper {
    type Sleep = ::tokio_1::time::Sleep;
    fn sleep(&self, dur: Duration) -> Self::Sleep {
        ::tokio_1::time::sleep(dur)
    }
}
