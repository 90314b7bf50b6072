use thiserror::Error as ThisError;

/// Error returned by the cancellation-aware retry loop.
#[derive(Debug, ThisError)]
pub enum Error<E> {
    /// The loop was configured with an invalid budget or ceiling. The
    /// operation was never invoked.
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),

    /// Every attempt failed. Holds the error of the last one.
    #[error("gave up after {attempts} attempts: {source}")]
    Exhausted {
        /// Number of times the operation was invoked.
        attempts: u64,
        #[source]
        source: E,
    },

    /// The cancellation signal fired before the sequence finished.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl<E> Error<E> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Error::Exhausted { .. })
    }

    /// Returns the last error of the operation, if the sequence ended by
    /// exhausting its attempts.
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            Error::Exhausted { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Rejected retry parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum InvalidArgument {
    #[error("attempts cannot be less than 0, got {0}")]
    NegativeAttempts(i64),
    #[error("max backoff cannot be less than 0, got {0}ms")]
    NegativeMaxBackoff(i64),
}

/// Why a cancellation signal fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum Cancelled {
    /// The signal was cancelled explicitly.
    #[error("retry cancelled")]
    Canceled,
    /// The signal's deadline passed.
    #[error("retry deadline exceeded")]
    DeadlineExceeded,
}
