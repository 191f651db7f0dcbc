#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Retry with jittered exponential backoff.
//!
//! This crate re-invokes a fallible operation up to a bounded number of
//! attempts, waiting a randomized, exponentially growing delay between
//! attempts, and reports a single terminal failure carrying the last fault
//! once the budget is spent.
//!
//! - **Backoff sequences** via [`BackoffSequence`]
//!   - `min_delay * factor^n`, clamped to `[min_delay, max_delay]`
//!   - Multiplicative jitter drawn from `[1 - jitter/2, 1 + jitter/2]`
//!   - Lazy, restartable, shareable across threads
//! - **Retry driver** via [`RetryDriver`]
//!   - Caller-extensible [`FaultMatcher`] set
//!   - Wait and fault-observation hooks
//!   - Blocking [`run`](RetryDriver::run) and async [`run_async`](RetryDriver::run_async)
//! - **Configuration** via [`RetryConfig`] (serde, environment variables)
//!
//! # Outcomes
//!
//! Every run produces exactly one of:
//!
//! - the operation's value,
//! - [`RetryError::Exhausted`] with the last retryable fault as its cause,
//! - [`RetryError::NonRetryable`] with the original, unmodified fault.
//!
//! # Examples
//!
//! ```rust
//! use rebound::prelude::*;
//! use std::io;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backoff = BackoffSequence::builder()
//!     .min_delay(Duration::from_millis(1))
//!     .max_delay(Duration::from_millis(10))
//!     .build()?;
//!
//! let driver = RetryDriver::<io::Error>::builder()
//!     .max_attempts(3)
//!     .backoff(backoff)
//!     .build()?;
//!
//! let value = driver.run(|attempt| {
//!     if attempt == 1 {
//!         Err(io::Error::other("transient"))
//!     } else {
//!         Ok(42)
//!     }
//! })?;
//!
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `tracing` (default): emit `tracing` events for retries, rejections and
//!   exhaustion. No subscriber is installed by this crate.

pub mod backoff;
pub mod config;
pub mod error;
pub mod retry;

mod property_tests;

pub use backoff::{BackoffSequence, BackoffSequenceBuilder, DelaySource, Delays, FixedDelays};
pub use config::RetryConfig;
pub use error::{Error, Result, RetryError};
pub use retry::{FaultMatcher, RetryDriver, RetryDriverBuilder, hooks, matcher};

/// Convenient re-exports of commonly used items.
///
/// Import all core abstractions with:
///
/// ```rust
/// use rebound::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backoff::{BackoffSequence, DelaySource, FixedDelays};
    pub use crate::config::RetryConfig;
    pub use crate::error::RetryError;
    pub use crate::matcher::{MatchAll, of_type};
    pub use crate::retry::{FaultMatcher, RetryDriver};
}
