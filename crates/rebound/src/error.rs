//! Error types for rebound.
//!
//! Two families of errors live here:
//!
//! - [`Error`] is raised while *building* a backoff sequence or retry driver,
//!   when a parameter falls outside its documented range.
//! - [`RetryError`] is returned from [`RetryDriver::run`](crate::RetryDriver::run)
//!   when the operation could not be completed.

use thiserror::Error;

/// Result type alias for configuration-time operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration error raised at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A parameter violated its documented range.
    #[error("invalid configuration: `{parameter}` {reason}")]
    InvalidConfiguration {
        /// Name of the offending parameter
        parameter: &'static str,
        /// Human readable description of the constraint
        reason: String,
    },

    /// An environment variable was set but could not be parsed.
    #[error("invalid value for environment variable {name}: {value:?}")]
    Environment {
        /// Variable name
        name: &'static str,
        /// Raw value that failed to parse
        value: String,
    },
}

impl Error {
    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            parameter,
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is an [`Error::InvalidConfiguration`].
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration { .. })
    }
}

/// Terminal failure of a retried operation.
///
/// Exactly one of three outcomes is produced per run: the operation's value,
/// [`RetryError::Exhausted`], or [`RetryError::NonRetryable`] carrying the
/// original fault untouched.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every configured attempt failed with a retryable fault.
    ///
    /// `cause` is the fault from the final attempt. It is `None` only when the
    /// driver was configured with zero attempts and the operation never ran.
    #[error("retry attempts exhausted after {attempts} attempt(s)")]
    Exhausted {
        /// Number of times the operation was invoked
        attempts: u32,
        /// The last retryable fault observed
        #[source]
        cause: Option<E>,
    },

    /// The operation failed with a fault that no matcher accepted.
    ///
    /// Display and source are those of the wrapped fault.
    #[error(transparent)]
    NonRetryable(E),
}

impl<E> RetryError<E> {
    /// Returns `true` if the attempt budget was consumed.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Returns `true` if a non-matching fault short-circuited the run.
    pub fn is_non_retryable(&self) -> bool {
        matches!(self, Self::NonRetryable(_))
    }

    /// Number of attempts made before giving up, if the run was exhausted.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Exhausted { attempts, .. } => Some(*attempts),
            Self::NonRetryable(_) => None,
        }
    }

    /// The fault carried by this error.
    ///
    /// For [`RetryError::Exhausted`] this is the last retryable fault, for
    /// [`RetryError::NonRetryable`] the fault that was rejected.
    pub fn cause(&self) -> Option<&E> {
        match self {
            Self::Exhausted { cause, .. } => cause.as_ref(),
            Self::NonRetryable(fault) => Some(fault),
        }
    }

    /// Consumes the error and returns the carried fault, if any.
    pub fn into_cause(self) -> Option<E> {
        match self {
            Self::Exhausted { cause, .. } => cause,
            Self::NonRetryable(fault) => Some(fault),
        }
    }

    /// Maps the fault type, preserving the variant.
    pub fn map_fault<F, O>(self, f: F) -> RetryError<O>
    where
        F: FnOnce(E) -> O,
    {
        match self {
            Self::Exhausted { attempts, cause } => RetryError::Exhausted {
                attempts,
                cause: cause.map(f),
            },
            Self::NonRetryable(fault) => RetryError::NonRetryable(f(fault)),
        }
    }
}
