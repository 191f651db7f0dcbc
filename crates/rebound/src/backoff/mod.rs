//! Backoff sequences and delay sources.
//!
//! # Key Types
//!
//! - [`BackoffSequence`] - Exponential delays with multiplicative jitter
//! - [`DelaySource`] - Capability consumed by the retry driver
//! - [`FixedDelays`] - Finite, explicit schedule
//!
//! # Examples
//!
//! ```rust
//! use rebound::backoff::BackoffSequence;
//! use std::time::Duration;
//!
//! let backoff = BackoffSequence::builder()
//!     .min_delay(Duration::from_millis(100))
//!     .jitter(0.0)
//!     .build()?;
//!
//! assert_eq!(backoff.nth(1), Duration::from_millis(200));
//! # Ok::<(), rebound::Error>(())
//! ```

mod entropy;
mod sequence;
mod source;

pub use sequence::{
    BackoffSequence, BackoffSequenceBuilder, DEFAULT_FACTOR, DEFAULT_JITTER, DEFAULT_MAX_DELAY,
    DEFAULT_MIN_DELAY, Delays,
};
pub use source::{DelaySource, FixedDelays};
