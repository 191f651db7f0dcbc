//! Retry driver, fault matchers and hooks.
//!
//! This module provides the loop that re-invokes an operation, classifies its
//! faults, and waits between attempts using a [`DelaySource`](crate::DelaySource).
//!
//! # Key Types
//!
//! - [`RetryDriver`] - Runs an operation with retries
//! - [`FaultMatcher`] - Decides which faults are retried
//! - [`RetryError`](crate::RetryError) - Exhaustion or pass-through fault
//!
//! # Examples
//!
//! ```rust
//! use rebound::{FixedDelays, RetryDriver, RetryError};
//! use std::io;
//! use std::time::Duration;
//!
//! let driver = RetryDriver::<io::Error>::builder()
//!     .max_attempts(2)
//!     .backoff(FixedDelays::zero(2))
//!     .matcher(|e: &io::Error| e.kind() == io::ErrorKind::TimedOut)
//!     .build()?;
//!
//! // Not a timeout: returned as-is after one attempt
//! let err = driver
//!     .run(|_| Err::<(), _>(io::Error::from(io::ErrorKind::NotFound)))
//!     .unwrap_err();
//! assert!(matches!(err, RetryError::NonRetryable(e) if e.kind() == io::ErrorKind::NotFound));
//! # Ok::<(), rebound::Error>(())
//! ```

mod driver;
pub mod hooks;
pub mod matcher;
mod outcome;
mod telemetry;

pub use driver::{DEFAULT_MAX_ATTEMPTS, RetryDriver, RetryDriverBuilder};
pub use matcher::{FaultMatcher, MatchAll};
