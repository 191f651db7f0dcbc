//! Serializable retry configuration.

use crate::backoff::{
    BackoffSequence, DEFAULT_FACTOR, DEFAULT_JITTER, DEFAULT_MAX_DELAY, DEFAULT_MIN_DELAY,
};
use crate::error::{Error, Result};
use crate::retry::{DEFAULT_MAX_ATTEMPTS, RetryDriver, RetryDriverBuilder};
use serde::{Deserialize, Serialize};
use std::env::{self, VarError};
use std::str::FromStr;

/// Plain-data retry settings, loadable from files or the environment.
///
/// Delays are in seconds. Missing fields take their defaults, so a partial
/// document is enough:
///
/// ```rust
/// use rebound::RetryConfig;
///
/// let config: RetryConfig = serde_json::from_str(r#"{ "max_attempts": 3 }"#).unwrap();
/// assert_eq!(config.max_attempts, 3);
/// assert_eq!(config.factor, 2.0);
/// ```
///
/// Nothing is validated until [`backoff`](Self::backoff) or
/// [`driver`](Self::driver) is called.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts (0 disables the operation entirely)
    pub max_attempts: u32,

    /// Lower bound of the delay range, in seconds
    pub min_delay: f64,

    /// Upper bound of the delay range, in seconds
    pub max_delay: f64,

    /// Jitter fraction in [0, 1)
    pub jitter: f64,

    /// Exponential growth base
    pub factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: DEFAULT_JITTER,
            factor: DEFAULT_FACTOR,
        }
    }
}

impl RetryConfig {
    /// Load configuration from environment variables.
    ///
    /// This will look for:
    /// - `REBOUND_MAX_ATTEMPTS`
    /// - `REBOUND_MIN_DELAY` (seconds)
    /// - `REBOUND_MAX_DELAY` (seconds)
    /// - `REBOUND_JITTER`
    /// - `REBOUND_FACTOR`
    ///
    /// Unset variables keep their defaults. A variable that is set but does
    /// not parse is an [`Error::Environment`].
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(max_attempts) = env_var("REBOUND_MAX_ATTEMPTS")? {
            config.max_attempts = max_attempts;
        }
        if let Some(min_delay) = env_var("REBOUND_MIN_DELAY")? {
            config.min_delay = min_delay;
        }
        if let Some(max_delay) = env_var("REBOUND_MAX_DELAY")? {
            config.max_delay = max_delay;
        }
        if let Some(jitter) = env_var("REBOUND_JITTER")? {
            config.jitter = jitter;
        }
        if let Some(factor) = env_var("REBOUND_FACTOR")? {
            config.factor = factor;
        }

        Ok(config)
    }

    /// Build the backoff sequence described by this configuration.
    pub fn backoff(&self) -> Result<BackoffSequence> {
        BackoffSequence::builder()
            .min_delay_secs(self.min_delay)
            .max_delay_secs(self.max_delay)
            .jitter(self.jitter)
            .factor(self.factor)
            .build()
    }

    /// Start a driver builder pre-populated from this configuration.
    ///
    /// Matchers and hooks can still be added before calling `build`.
    pub fn driver<E: 'static>(&self) -> Result<RetryDriverBuilder<E>> {
        Ok(RetryDriver::builder()
            .max_attempts(self.max_attempts)
            .backoff(self.backoff()?))
    }
}

fn env_var<T: FromStr>(name: &'static str) -> Result<Option<T>> {
    let raw = match env::var(name) {
        Ok(raw) => raw,
        Err(VarError::NotPresent) => return Ok(None),
        Err(VarError::NotUnicode(raw)) => {
            return Err(Error::Environment {
                name,
                value: raw.to_string_lossy().into_owned(),
            });
        }
    };

    let parsed = raw.trim().parse();
    match parsed {
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(Error::Environment { name, value: raw }),
    }
}
