use super::sequence::BackoffSequence;
use std::sync::Arc;
use std::time::Duration;

/// Anything that can produce a lazy, restartable sequence of delays.
///
/// Every call to [`delays`](Self::delays) starts a new traversal at attempt 0.
/// Sources may be infinite (like [`BackoffSequence`]) or finite (like
/// [`FixedDelays`]); the retry driver only takes as many values as it has
/// attempts.
pub trait DelaySource: Send + Sync {
    /// Start a new traversal of the delays.
    fn delays(&self) -> Box<dyn Iterator<Item = Duration> + Send + '_>;
}

impl DelaySource for BackoffSequence {
    fn delays(&self) -> Box<dyn Iterator<Item = Duration> + Send + '_> {
        Box::new(BackoffSequence::delays(self))
    }
}

impl<S: DelaySource + ?Sized> DelaySource for Arc<S> {
    fn delays(&self) -> Box<dyn Iterator<Item = Duration> + Send + '_> {
        (**self).delays()
    }
}

impl<S: DelaySource + ?Sized> DelaySource for &S {
    fn delays(&self) -> Box<dyn Iterator<Item = Duration> + Send + '_> {
        (**self).delays()
    }
}

/// A finite, explicit list of delays.
///
/// Useful for deterministic schedules and as a stand-in for
/// [`BackoffSequence`] in tests.
///
/// # Examples
///
/// ```rust
/// use rebound::{DelaySource, FixedDelays};
/// use std::time::Duration;
///
/// let delays = FixedDelays::new([Duration::from_millis(10), Duration::from_millis(50)]);
/// let collected: Vec<Duration> = delays.delays().collect();
/// assert_eq!(collected.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedDelays(Vec<Duration>);

impl FixedDelays {
    /// Create a source yielding exactly the given delays, in order.
    pub fn new(delays: impl IntoIterator<Item = Duration>) -> Self {
        Self(delays.into_iter().collect())
    }

    /// A source yielding `count` zero delays.
    pub fn zero(count: usize) -> Self {
        Self(vec![Duration::ZERO; count])
    }

    /// Number of delays in the schedule.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the schedule is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Duration>> for FixedDelays {
    fn from(delays: Vec<Duration>) -> Self {
        Self(delays)
    }
}

impl DelaySource for FixedDelays {
    fn delays(&self) -> Box<dyn Iterator<Item = Duration> + Send + '_> {
        Box::new(self.0.iter().copied())
    }
}
