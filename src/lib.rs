#![cfg_attr(docsrs, feature(doc_cfg))]

//! Retry an operation a fixed number of times with exponential backoff.
//!
//! The delay before each retry grows from a small fraction of the maximum
//! backoff and reaches the maximum within three attempts. A random jitter is
//! added on the way up so that many callers retrying in lockstep spread out.
//!
//! Two loops are provided:
//!
//! * [`retry`] blocks the current thread and stops once the operation
//!   returns `false`.
//! * [`tokio::retry_with_cancellation`] (or the runtime-agnostic
//!   [`future::retry_with_cancellation`]) stops on the first `Ok`, and can
//!   be aborted through a [`Cancellation`] signal.
//!
//! ```rust
//! use std::time::Duration;
//!
//! // Retry six times with a maximum backoff of 5 milliseconds between attempts.
//! let mut calls = 0;
//! jitter_retry::retry(6, Duration::from_millis(5), || {
//!     calls += 1;
//!     calls < 3
//! });
//! assert_eq!(calls, 3);
//! ```
//!
//! [`backoff::backoff`] exposes the delay computation for callers that run
//! their own loop.

pub mod backoff;
mod config;
pub mod default;
mod error;
#[cfg(feature = "futures")]
#[cfg_attr(docsrs, doc(cfg(feature = "futures")))]
pub mod future;
mod retry;
#[cfg(feature = "futures")]
mod signal;
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub mod tokio;

pub use config::RetryConfig;
pub use error::{Cancelled, Error, InvalidArgument};
pub use retry::retry;
#[cfg(feature = "futures")]
pub use signal::Cancellation;
#[cfg(feature = "tokio")]
pub use signal::Signal;
