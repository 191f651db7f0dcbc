//! Fault classification.
//!
//! A [`FaultMatcher`] decides whether a fault raised by the retried operation
//! is eligible for another attempt. The driver holds a set of matchers and
//! retries when *any* of them accepts the fault.

use std::error::Error;
use std::fmt;
use std::marker::PhantomData;

/// Predicate deciding whether a fault should be retried.
///
/// Implemented for every `Fn(&E) -> bool + Send + Sync`, so closures can be
/// used directly:
///
/// ```rust
/// use rebound::FaultMatcher;
/// use std::io;
///
/// let timeouts = |e: &io::Error| e.kind() == io::ErrorKind::TimedOut;
/// assert!(timeouts.matches(&io::Error::from(io::ErrorKind::TimedOut)));
/// ```
pub trait FaultMatcher<E: ?Sized>: Send + Sync {
    /// Returns `true` if `fault` should be retried.
    fn matches(&self, fault: &E) -> bool;
}

impl<E: ?Sized, F> FaultMatcher<E> for F
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn matches(&self, fault: &E) -> bool {
        self(fault)
    }
}

/// Matches every fault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchAll;

impl<E: ?Sized> FaultMatcher<E> for MatchAll {
    fn matches(&self, _fault: &E) -> bool {
        true
    }
}

/// Matches when the fault, or any error in its `source()` chain, is a `K`.
///
/// Built with [`of_type`].
pub struct OfType<K> {
    _kind: PhantomData<fn() -> K>,
}

impl<K> fmt::Debug for OfType<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OfType")
            .field("kind", &std::any::type_name::<K>())
            .finish()
    }
}

impl<K> Clone for OfType<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for OfType<K> {}

impl<K> Default for OfType<K> {
    fn default() -> Self {
        Self { _kind: PhantomData }
    }
}

/// Matcher accepting faults of kind `K`, directly or as a source.
///
/// ```rust
/// use rebound::matcher::of_type;
/// use rebound::FaultMatcher;
/// use std::io;
///
/// #[derive(Debug, thiserror::Error)]
/// enum FetchError {
///     #[error("transport failed")]
///     Transport(#[source] io::Error),
///     #[error("bad payload")]
///     Payload,
/// }
///
/// let io_faults = of_type::<io::Error>();
/// assert!(io_faults.matches(&FetchError::Transport(io::Error::other("reset"))));
/// assert!(!io_faults.matches(&FetchError::Payload));
/// ```
pub fn of_type<K>() -> OfType<K>
where
    K: Error + 'static,
{
    OfType::default()
}

impl<E, K> FaultMatcher<E> for OfType<K>
where
    E: Error + 'static,
    K: Error + 'static,
{
    fn matches(&self, fault: &E) -> bool {
        let mut current: Option<&(dyn Error + 'static)> = Some(fault);
        while let Some(err) = current {
            if err.is::<K>() {
                return true;
            }
            current = err.source();
        }
        false
    }
}

/// Wrap a closure as a matcher, for call sites that need a named type.
pub fn from_fn<E, F>(f: F) -> FnMatcher<F>
where
    E: ?Sized,
    F: Fn(&E) -> bool + Send + Sync,
{
    FnMatcher(f)
}

/// Closure-backed matcher returned by [`from_fn`].
#[derive(Clone, Copy)]
pub struct FnMatcher<F>(F);

impl<F> fmt::Debug for FnMatcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnMatcher(<fn>)")
    }
}

impl<E: ?Sized, F> FaultMatcher<E> for FnMatcher<F>
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn matches(&self, fault: &E) -> bool {
        (self.0)(fault)
    }
}
