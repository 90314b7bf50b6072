use std::time::Duration;

#[cfg(feature = "serde")]
use serde::Deserialize;

use crate::default;
use crate::error::InvalidArgument;

/// Retry parameters as they come from configuration files or the
/// environment, where values may be out of range.
///
/// ```rust
/// use std::time::Duration;
/// use jitter_retry::RetryConfig;
///
/// let config = RetryConfig { attempts: 3, max_backoff_ms: 250 };
/// assert_eq!(config.validate(), Ok((3, Duration::from_millis(250))));
///
/// let config = RetryConfig { attempts: 3, max_backoff_ms: -1 };
/// assert!(config.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetryConfig {
    /// Number of retries after the first attempt.
    pub attempts: i64,
    /// Ceiling for a single delay, in milliseconds.
    pub max_backoff_ms: i64,
}

impl Default for RetryConfig {
    fn default() -> RetryConfig {
        RetryConfig {
            attempts: default::ATTEMPTS,
            max_backoff_ms: default::MAX_BACKOFF_MILLIS,
        }
    }
}

impl RetryConfig {
    pub fn max_backoff(&self) -> Result<Duration, InvalidArgument> {
        u64::try_from(self.max_backoff_ms)
            .map(Duration::from_millis)
            .map_err(|_| InvalidArgument::NegativeMaxBackoff(self.max_backoff_ms))
    }

    /// Returns the attempt budget and the maximum backoff, or the first
    /// value that is out of range.
    pub fn validate(&self) -> Result<(u64, Duration), InvalidArgument> {
        let attempts = u64::try_from(self.attempts)
            .map_err(|_| InvalidArgument::NegativeAttempts(self.attempts))?;
        Ok((attempts, self.max_backoff()?))
    }

    /// Runs [`retry`](crate::retry) with these parameters. The operation is
    /// not called if they are invalid.
    pub fn retry<F>(&self, operation: F) -> Result<(), InvalidArgument>
    where
        F: FnMut() -> bool,
    {
        let (_, max_backoff) = self.validate()?;
        crate::retry(self.attempts, max_backoff, operation);
        Ok(())
    }

    /// Runs [`tokio::retry_with_cancellation`](crate::tokio::retry_with_cancellation)
    /// with these parameters.
    #[cfg(feature = "tokio")]
    #[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
    pub async fn retry_with_cancellation<C, F, Fut, T, E>(
        &self,
        signal: C,
        operation: F,
    ) -> Result<T, crate::Error<E>>
    where
        C: crate::Cancellation,
        F: FnMut(C) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let (_, max_backoff) = self.validate()?;
        crate::tokio::retry_with_cancellation(signal, self.attempts, max_backoff, operation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.validate(), Ok((6, Duration::from_secs(5))));
    }

    #[test]
    fn negative_values_are_rejected() {
        let config = RetryConfig {
            attempts: -1,
            max_backoff_ms: 0,
        };
        assert_eq!(config.validate(), Err(InvalidArgument::NegativeAttempts(-1)));

        let config = RetryConfig {
            attempts: 0,
            max_backoff_ms: -1,
        };
        assert_eq!(config.validate(), Err(InvalidArgument::NegativeMaxBackoff(-1)));
        assert_eq!(
            config.max_backoff().unwrap_err().to_string(),
            "max backoff cannot be less than 0, got -1ms"
        );
    }

    #[test]
    fn invalid_config_never_calls() {
        let mut calls = 0;
        let config = RetryConfig {
            attempts: 2,
            max_backoff_ms: -5,
        };
        let result = config.retry(|| {
            calls += 1;
            true
        });

        assert_eq!(result, Err(InvalidArgument::NegativeMaxBackoff(-5)));
        assert_eq!(calls, 0);
    }

    #[test]
    fn valid_config_runs_the_loop() {
        let mut calls = 0;
        let config = RetryConfig {
            attempts: 2,
            max_backoff_ms: 1,
        };
        config
            .retry(|| {
                calls += 1;
                true
            })
            .unwrap();

        assert_eq!(calls, 3);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_with_defaults() {
        let config: RetryConfig = serde_json::from_str(r#"{ "attempts": 2 }"#).unwrap();
        assert_eq!(
            config,
            RetryConfig {
                attempts: 2,
                max_backoff_ms: default::MAX_BACKOFF_MILLIS,
            }
        );

        let config: RetryConfig = serde_json::from_str(r#"{ "max_backoff_ms": -10 }"#).unwrap();
        assert!(config.validate().is_err());
    }
}
