//! Log events emitted by the retry driver.
//!
//! Everything here compiles to nothing without the `tracing` feature.

use std::time::Duration;

pub(super) fn retrying(attempt: u32, max_attempts: u32, delay: Duration) {
    #[cfg(feature = "tracing")]
    tracing::debug!(
        attempt,
        max_attempts,
        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        "retryable fault, backing off"
    );
    #[cfg(not(feature = "tracing"))]
    let _ = (attempt, max_attempts, delay);
}

pub(super) fn rejected(attempt: u32) {
    #[cfg(feature = "tracing")]
    tracing::debug!(attempt, "fault not eligible for retry");
    #[cfg(not(feature = "tracing"))]
    let _ = attempt;
}

pub(super) fn exhausted(attempts: u32) {
    #[cfg(feature = "tracing")]
    tracing::warn!(attempts, "retry attempts exhausted");
    #[cfg(not(feature = "tracing"))]
    let _ = attempts;
}

pub(super) fn succeeded(attempt: u32) {
    #[cfg(feature = "tracing")]
    if attempt > 1 {
        tracing::trace!(attempt, "operation succeeded after retry");
    }
    #[cfg(not(feature = "tracing"))]
    let _ = attempt;
}
