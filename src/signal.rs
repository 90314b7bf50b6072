//! Cancellation signals observed by the retry loop.

use std::future::Future;

use crate::error::Cancelled;

/// A caller-owned signal that aborts a retry sequence.
///
/// The loop only observes the signal: it hands a clone to every attempt,
/// checks it between attempts and races [`wait`](Cancellation::wait) against
/// the backoff timer. Once fired, a signal must stay fired.
pub trait Cancellation: Clone {
    /// Future resolving once the signal fires.
    type Wait: Future<Output = ()>;

    fn is_cancelled(&self) -> bool;

    /// Why the signal fired, or `None` while it has not.
    fn reason(&self) -> Option<Cancelled>;

    fn wait(&self) -> Self::Wait;
}

#[cfg(feature = "tokio")]
pub use self::rt::Signal;

#[cfg(feature = "tokio")]
mod rt {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::{Arc, OnceLock};
    use std::time::Duration;

    use tokio_1::time::{sleep_until, Instant};
    use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

    use super::Cancellation;
    use crate::error::Cancelled;

    impl Cancellation for CancellationToken {
        type Wait = WaitForCancellationFutureOwned;

        fn is_cancelled(&self) -> bool {
            CancellationToken::is_cancelled(self)
        }

        fn reason(&self) -> Option<Cancelled> {
            CancellationToken::is_cancelled(self).then_some(Cancelled::Canceled)
        }

        fn wait(&self) -> Self::Wait {
            self.clone().cancelled_owned()
        }
    }

    /// A [`CancellationToken`] with an optional deadline.
    ///
    /// Clones share state: cancelling one cancels all of them.
    ///
    /// ```rust
    /// # extern crate tokio_1 as tokio;
    /// use std::time::Duration;
    /// use jitter_retry::{Cancellation, Cancelled, Signal};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let signal = Signal::with_timeout(Duration::from_secs(30));
    /// assert_eq!(signal.reason(), None);
    /// signal.cancel();
    /// assert_eq!(signal.reason(), Some(Cancelled::Canceled));
    /// # }
    /// ```
    #[derive(Debug, Clone, Default)]
    pub struct Signal {
        token: CancellationToken,
        deadline: Option<Instant>,
        cancelled_at: Arc<OnceLock<Instant>>,
    }

    impl Signal {
        /// Creates a signal that only fires on [`cancel`](Signal::cancel).
        pub fn new() -> Signal {
            Signal::default()
        }

        /// Creates a signal that also fires once `deadline` is reached.
        pub fn with_deadline(deadline: Instant) -> Signal {
            Signal {
                deadline: Some(deadline),
                ..Signal::default()
            }
        }

        /// Creates a signal that also fires `timeout` from now.
        pub fn with_timeout(timeout: Duration) -> Signal {
            Signal::with_deadline(Instant::now() + timeout)
        }

        pub fn deadline(&self) -> Option<Instant> {
            self.deadline
        }

        /// Fires the signal. Calling it again has no effect.
        pub fn cancel(&self) {
            let _ = self.cancelled_at.set(Instant::now());
            self.token.cancel();
        }

        fn deadline_passed(&self, now: Instant) -> bool {
            self.deadline.map_or(false, |deadline| now >= deadline)
        }
    }

    impl Cancellation for Signal {
        type Wait = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

        fn is_cancelled(&self) -> bool {
            self.token.is_cancelled() || self.deadline_passed(Instant::now())
        }

        fn reason(&self) -> Option<Cancelled> {
            let now = Instant::now();
            match (self.cancelled_at.get(), self.deadline) {
                (Some(at), Some(deadline)) if *at >= deadline => Some(Cancelled::DeadlineExceeded),
                (Some(_), _) => Some(Cancelled::Canceled),
                (None, _) if self.deadline_passed(now) => Some(Cancelled::DeadlineExceeded),
                (None, _) => None,
            }
        }

        fn wait(&self) -> Self::Wait {
            let token = self.token.clone();
            let deadline = self.deadline;
            Box::pin(async move {
                match deadline {
                    Some(deadline) => {
                        tokio_1::select! {
                            _ = token.cancelled() => {}
                            _ = sleep_until(deadline) => {}
                        }
                    }
                    None => token.cancelled().await,
                }
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use tokio_1 as tokio;

        #[tokio::test(start_paused = true)]
        async fn deadline_fires_on_its_own() {
            let signal = Signal::with_timeout(Duration::from_secs(1));
            assert!(!signal.is_cancelled());
            assert_eq!(signal.reason(), None);

            signal.wait().await;

            assert!(signal.is_cancelled());
            assert_eq!(signal.reason(), Some(Cancelled::DeadlineExceeded));
        }

        #[tokio::test(start_paused = true)]
        async fn cancel_before_deadline_wins() {
            let signal = Signal::with_timeout(Duration::from_secs(1));
            signal.clone().cancel();
            tokio::time::advance(Duration::from_secs(2)).await;

            assert_eq!(signal.reason(), Some(Cancelled::Canceled));
        }

        #[tokio::test(start_paused = true)]
        async fn cancel_after_deadline_keeps_deadline_reason() {
            let signal = Signal::with_timeout(Duration::from_secs(1));
            tokio::time::advance(Duration::from_secs(2)).await;
            signal.cancel();

            assert_eq!(signal.reason(), Some(Cancelled::DeadlineExceeded));
        }

        #[tokio::test]
        async fn token_reports_plain_cancellation() {
            let token = CancellationToken::new();
            assert_eq!(Cancellation::reason(&token), None);

            token.cancel();
            Cancellation::wait(&token).await;
            assert_eq!(Cancellation::reason(&token), Some(Cancelled::Canceled));
        }
    }
}
