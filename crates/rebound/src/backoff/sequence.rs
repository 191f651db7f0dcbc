//! Exponential backoff with multiplicative jitter.

use super::entropy::Entropy;
use crate::error::{Error, Result};
use std::time::Duration;

/// Default lower bound of the delay range, in seconds.
pub const DEFAULT_MIN_DELAY: f64 = 0.02;

/// Default upper bound of the delay range, in seconds.
pub const DEFAULT_MAX_DELAY: f64 = 1.0;

/// Default jitter fraction.
pub const DEFAULT_JITTER: f64 = 0.2;

/// Default exponential growth base.
pub const DEFAULT_FACTOR: f64 = 2.0;

/// Exponentially growing, jittered delays bounded to a configured range.
///
/// # Mathematical Formula
///
/// For attempt `n` (0-indexed):
/// ```text
/// raw    = clamp(min_delay * factor^n, min_delay, max_delay)
/// scale  = uniform(1 - jitter/2, 1 + jitter/2)
/// delay  = raw * scale
/// ```
///
/// Every delay therefore lies in
/// `[min_delay * (1 - jitter/2), max_delay * (1 + jitter/2)]`.
///
/// A sequence is immutable once built and can be shared across threads; the
/// only side effect of computing a delay is drawing from the random source.
///
/// # Examples
///
/// ```rust
/// use rebound::BackoffSequence;
/// use std::time::Duration;
///
/// let backoff = BackoffSequence::builder()
///     .min_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(1))
///     .jitter(0.0)
///     .build()?;
///
/// let delays: Vec<Duration> = backoff.delays().take(5).collect();
/// assert_eq!(delays[0], Duration::from_millis(100));
/// assert_eq!(delays[4], Duration::from_secs(1));
/// # Ok::<(), rebound::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct BackoffSequence {
    min_delay: f64,
    max_delay: f64,
    jitter: f64,
    factor: f64,
    // Jitter scale bounds, derived from `jitter` once at build time.
    scale_low: f64,
    scale_high: f64,
    entropy: Entropy,
}

impl BackoffSequence {
    /// Create a new builder with default parameters.
    pub fn builder() -> BackoffSequenceBuilder {
        BackoffSequenceBuilder::default()
    }

    /// Lower bound of the delay range.
    pub fn min_delay(&self) -> Duration {
        secs_to_duration_saturating(self.min_delay)
    }

    /// Upper bound of the delay range.
    pub fn max_delay(&self) -> Duration {
        secs_to_duration_saturating(self.max_delay)
    }

    /// Jitter fraction in `[0, 1)`.
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Exponential growth base.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Range the multiplicative jitter scale is drawn from.
    pub fn jitter_range(&self) -> (f64, f64) {
        (self.scale_low, self.scale_high)
    }

    /// Jittered delay for the given 0-based attempt index.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let raw = self.raw_secs(attempt);
        let scale = self.entropy.uniform(self.scale_low, self.scale_high);
        secs_to_duration_saturating(raw * scale)
    }

    /// Same as [`delay_for_attempt`](Self::delay_for_attempt).
    pub fn nth(&self, attempt: u32) -> Duration {
        self.delay_for_attempt(attempt)
    }

    /// Clamped delay for the given attempt, before jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        secs_to_duration_saturating(self.raw_secs(attempt))
    }

    /// Lazy, infinite sequence of delays starting at attempt 0.
    ///
    /// Each call starts a fresh traversal.
    pub fn delays(&self) -> Delays<'_> {
        Delays {
            sequence: self,
            attempt: 0,
        }
    }

    fn raw_secs(&self, attempt: u32) -> f64 {
        // 0 * inf would be NaN once factor^n overflows
        if self.min_delay == 0.0 {
            return clamp_delay(0.0, self.min_delay, self.max_delay);
        }

        // powi saturates to inf or 0 instead of wrapping; the clamp absorbs both
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let growth = self.min_delay * self.factor.powi(exponent);
        clamp_delay(growth, self.min_delay, self.max_delay)
    }
}

impl Default for BackoffSequence {
    /// Defaults: 20ms min, 1s max, 0.2 jitter, factor 2.
    fn default() -> Self {
        Self::from_parts(
            DEFAULT_MIN_DELAY,
            DEFAULT_MAX_DELAY,
            DEFAULT_JITTER,
            DEFAULT_FACTOR,
            Entropy::default(),
        )
    }
}

impl BackoffSequence {
    fn from_parts(min_delay: f64, max_delay: f64, jitter: f64, factor: f64, entropy: Entropy) -> Self {
        Self {
            min_delay,
            max_delay,
            jitter,
            factor,
            scale_low: 1.0 - jitter / 2.0,
            scale_high: 1.0 + jitter / 2.0,
            entropy,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_entropy(mut self, entropy: Entropy) -> Self {
        self.entropy = entropy;
        self
    }
}

/// Raise to `min`, then lower to `max`. When `max < min` the upper bound wins.
fn clamp_delay(secs: f64, min: f64, max: f64) -> f64 {
    secs.max(min).min(max)
}

fn secs_to_duration_saturating(secs: f64) -> Duration {
    if secs <= 0.0 || secs.is_nan() {
        return Duration::ZERO;
    }

    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Iterator over the delays of a [`BackoffSequence`].
///
/// Never returns `None`. Once the attempt counter reaches `u32::MAX` it stays
/// there, which is far past the point where every delay clamps to the maximum.
#[derive(Debug, Clone)]
pub struct Delays<'a> {
    sequence: &'a BackoffSequence,
    attempt: u32,
}

impl Delays<'_> {
    /// Attempt index the next call to `next` will compute.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Iterator for Delays<'_> {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let delay = self.sequence.delay_for_attempt(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        Some(delay)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl std::iter::FusedIterator for Delays<'_> {}

/// Builder for configuring a [`BackoffSequence`].
///
/// Unset parameters take their defaults. Validation happens in
/// [`build`](Self::build):
///
/// - `min_delay` and `max_delay` are zero or between one nanosecond and
///   [`Duration::MAX`]
/// - `0 <= jitter < 1`
/// - `factor > 0`, finite
/// - `max_delay * (1 + jitter/2)` fits in a [`Duration`]
///
/// `max_delay` is not checked against `min_delay`. If it is smaller, every
/// delay clamps to `max_delay`.
///
/// # Examples
///
/// ```rust
/// use rebound::BackoffSequence;
/// use std::time::Duration;
///
/// let backoff = BackoffSequence::builder()
///     .min_delay(Duration::from_millis(50))
///     .max_delay(Duration::from_secs(5))
///     .factor(3.0)
///     .jitter(0.1)
///     .build()?;
/// # Ok::<(), rebound::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct BackoffSequenceBuilder {
    min_delay: Option<f64>,
    max_delay: Option<f64>,
    jitter: Option<f64>,
    factor: Option<f64>,
    seed: Option<u64>,
}

impl BackoffSequenceBuilder {
    /// Set the lower bound of the delay range.
    ///
    /// Default: 20ms
    pub fn min_delay(self, delay: Duration) -> Self {
        self.min_delay_secs(delay.as_secs_f64())
    }

    /// Set the lower bound of the delay range in seconds.
    ///
    /// Delays have nanosecond resolution, so positive values below `1e-9`
    /// are rejected by [`build`](Self::build).
    pub fn min_delay_secs(mut self, secs: f64) -> Self {
        self.min_delay = Some(secs);
        self
    }

    /// Set the upper bound of the delay range.
    ///
    /// Default: 1s
    pub fn max_delay(self, delay: Duration) -> Self {
        self.max_delay_secs(delay.as_secs_f64())
    }

    /// Set the upper bound of the delay range in seconds.
    pub fn max_delay_secs(mut self, secs: f64) -> Self {
        self.max_delay = Some(secs);
        self
    }

    /// Set the jitter fraction.
    ///
    /// A jitter of 0.2 scales each delay by a uniform draw from `[0.9, 1.1]`.
    /// Zero disables randomization entirely.
    ///
    /// Default: 0.2
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Set the exponential growth base.
    ///
    /// Default: 2.0
    pub fn factor(mut self, factor: f64) -> Self {
        self.factor = Some(factor);
        self
    }

    /// Draw jitter from a generator seeded with `seed`.
    ///
    /// Sequences built with the same seed (and the same draw order) produce
    /// identical delays. Clones of the built sequence share the generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the parameters and build the sequence.
    pub fn build(self) -> Result<BackoffSequence> {
        let min_delay = self.min_delay.unwrap_or(DEFAULT_MIN_DELAY);
        let max_delay = self.max_delay.unwrap_or(DEFAULT_MAX_DELAY);
        let jitter = self.jitter.unwrap_or(DEFAULT_JITTER);
        let factor = self.factor.unwrap_or(DEFAULT_FACTOR);

        validate_delay("min_delay", min_delay)?;
        validate_delay("max_delay", max_delay)?;

        if !(0.0..1.0).contains(&jitter) {
            return Err(Error::invalid(
                "jitter",
                format!("must be in [0, 1), got {jitter}"),
            ));
        }

        if !(factor.is_finite() && factor > 0.0) {
            return Err(Error::invalid(
                "factor",
                format!("must be a positive finite number, got {factor}"),
            ));
        }

        if Duration::try_from_secs_f64(max_delay * (1.0 + jitter / 2.0)).is_err() {
            return Err(Error::invalid(
                "max_delay",
                format!("jittered upper bound overflows a Duration, got {max_delay} with jitter {jitter}"),
            ));
        }

        let entropy = self.seed.map_or_else(Entropy::default, Entropy::seeded);

        Ok(BackoffSequence::from_parts(
            min_delay, max_delay, jitter, factor, entropy,
        ))
    }
}

const NANOSECOND: f64 = 1e-9;

fn validate_delay(parameter: &'static str, secs: f64) -> Result<()> {
    if !(secs.is_finite() && secs >= 0.0) {
        return Err(Error::invalid(
            parameter,
            format!("must be a non-negative finite number of seconds, got {secs}"),
        ));
    }

    if secs > 0.0 && secs < NANOSECOND {
        return Err(Error::invalid(
            parameter,
            format!("must be zero or at least one nanosecond, got {secs}"),
        ));
    }

    if Duration::try_from_secs_f64(secs).is_err() {
        return Err(Error::invalid(
            parameter,
            format!("exceeds the largest representable Duration, got {secs}"),
        ));
    }

    Ok(())
}
