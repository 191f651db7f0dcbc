use super::hooks::{self, AsyncWaitHook, FaultHook, WaitFuture, WaitHook};
use super::matcher::{FaultMatcher, MatchAll};
use super::outcome::Outcome;
use super::telemetry;
use crate::backoff::{BackoffSequence, DelaySource};
use crate::error::{Error, Result, RetryError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default number of attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Re-invokes a fallible operation with backoff between attempts.
///
/// A driver is immutable once built and cheap to clone; every call to
/// [`run`](Self::run) keeps its own attempt counter, so one driver can serve
/// many threads at once.
///
/// # Sequencing
///
/// For each attempt `1..=max_attempts`:
///
/// 1. the operation is invoked with the attempt number;
/// 2. on success its value is returned immediately;
/// 3. on a fault no matcher accepts, the fault is returned as
///    [`RetryError::NonRetryable`] immediately;
/// 4. otherwise the fault hook runs, then the wait hook with the next delay.
///
/// When the loop ends, [`RetryError::Exhausted`] carries the last fault. The
/// final failed attempt still waits once, so with `N` attempts that all fail
/// the wait hook runs exactly `N` times.
///
/// # Examples
///
/// ```rust
/// use rebound::RetryDriver;
/// use std::io;
/// use std::time::Duration;
///
/// let driver = RetryDriver::<io::Error>::builder()
///     .max_attempts(3)
///     .wait_hook(|_delay: Duration| {})
///     .build()?;
///
/// let value = driver.run(|attempt| {
///     if attempt < 3 {
///         Err(io::Error::other("flaky"))
///     } else {
///         Ok(attempt)
///     }
/// });
///
/// assert_eq!(value.unwrap(), 3);
/// # Ok::<(), rebound::Error>(())
/// ```
pub struct RetryDriver<E> {
    max_attempts: u32,
    matchers: Arc<[Arc<dyn FaultMatcher<E>>]>,
    backoff: Arc<dyn DelaySource>,
    wait_hook: WaitHook,
    async_wait_hook: AsyncWaitHook,
    fault_hook: FaultHook<E>,
}

impl<E> Clone for RetryDriver<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            matchers: Arc::clone(&self.matchers),
            backoff: Arc::clone(&self.backoff),
            wait_hook: Arc::clone(&self.wait_hook),
            async_wait_hook: Arc::clone(&self.async_wait_hook),
            fault_hook: Arc::clone(&self.fault_hook),
        }
    }
}

impl<E> fmt::Debug for RetryDriver<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryDriver")
            .field("max_attempts", &self.max_attempts)
            .field("matchers", &self.matchers.len())
            .field("backoff", &"<delay source>")
            .field("wait_hook", &"<fn>")
            .field("fault_hook", &"<fn>")
            .finish()
    }
}

impl<E> RetryDriver<E> {
    /// Create a new builder with default parameters.
    pub fn builder() -> RetryDriverBuilder<E> {
        RetryDriverBuilder::default()
    }

    /// Maximum number of times the operation is invoked.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The delay source this driver draws from.
    pub fn backoff(&self) -> &Arc<dyn DelaySource> {
        &self.backoff
    }

    /// Returns `true` if any configured matcher accepts `fault`.
    pub fn is_retryable(&self, fault: &E) -> bool {
        self.matchers.iter().any(|m| m.matches(fault))
    }

    /// Run `operation` until it succeeds, fails with a non-retryable fault,
    /// or the attempt budget is spent.
    ///
    /// The operation receives the 1-based attempt number. Hooks run on the
    /// calling thread; a panicking hook unwinds out of `run`.
    pub fn run<T, F>(&self, mut operation: F) -> std::result::Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> std::result::Result<T, E>,
    {
        let mut delays = self.backoff.delays();
        let mut last_fault = None;

        for attempt in 1..=self.max_attempts {
            match self.classify(operation(attempt)) {
                Outcome::Success(value) => {
                    telemetry::succeeded(attempt);
                    return Ok(value);
                }
                Outcome::Fatal(fault) => {
                    telemetry::rejected(attempt);
                    return Err(RetryError::NonRetryable(fault));
                }
                Outcome::Retryable(fault) => {
                    let delay = self.observe(&fault, attempt, &mut delays);
                    (self.wait_hook)(delay);
                    last_fault = Some(fault);
                }
            }
        }

        Err(self.exhausted(last_fault))
    }

    /// Async counterpart of [`run`](Self::run).
    ///
    /// Classification and sequencing are identical; the wait step awaits the
    /// async wait hook (`tokio::time::sleep` by default) instead of blocking.
    /// No tasks are spawned, and dropping the returned future cancels the run.
    pub async fn run_async<T, F, Fut>(&self, mut operation: F) -> std::result::Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let mut delays = self.backoff.delays();
        let mut last_fault = None;

        for attempt in 1..=self.max_attempts {
            match self.classify(operation(attempt).await) {
                Outcome::Success(value) => {
                    telemetry::succeeded(attempt);
                    return Ok(value);
                }
                Outcome::Fatal(fault) => {
                    telemetry::rejected(attempt);
                    return Err(RetryError::NonRetryable(fault));
                }
                Outcome::Retryable(fault) => {
                    let delay = self.observe(&fault, attempt, &mut delays);
                    (self.async_wait_hook)(delay).await;
                    last_fault = Some(fault);
                }
            }
        }

        Err(self.exhausted(last_fault))
    }

    fn classify<T>(&self, result: std::result::Result<T, E>) -> Outcome<T, E> {
        Outcome::classify(result, |fault| self.is_retryable(fault))
    }

    /// Pull the next delay and report the fault. Runs before any wait.
    fn observe(&self, fault: &E, attempt: u32, delays: &mut impl Iterator<Item = Duration>) -> Duration {
        // Finite sources that run dry mean "no delay"
        let delay = delays.next().unwrap_or(Duration::ZERO);
        (self.fault_hook)(fault, attempt);
        telemetry::retrying(attempt, self.max_attempts, delay);
        delay
    }

    fn exhausted(&self, cause: Option<E>) -> RetryError<E> {
        telemetry::exhausted(self.max_attempts);
        RetryError::Exhausted {
            attempts: self.max_attempts,
            cause,
        }
    }
}

/// Builder for configuring a [`RetryDriver`].
///
/// # Examples
///
/// ```rust
/// use rebound::{BackoffSequence, RetryDriver};
/// use rebound::matcher::of_type;
/// use std::io;
/// use std::time::Duration;
///
/// let backoff = BackoffSequence::builder()
///     .min_delay(Duration::from_millis(50))
///     .max_delay(Duration::from_secs(2))
///     .build()?;
///
/// let driver = RetryDriver::<io::Error>::builder()
///     .max_attempts(4)
///     .backoff(backoff)
///     .matcher(|e: &io::Error| e.kind() == io::ErrorKind::TimedOut)
///     .matcher(of_type::<io::Error>())
///     .on_fault(|fault: &io::Error, attempt| eprintln!("attempt {attempt} failed: {fault}"))
///     .build()?;
/// # Ok::<(), rebound::Error>(())
/// ```
pub struct RetryDriverBuilder<E> {
    max_attempts: u32,
    matchers: Vec<Arc<dyn FaultMatcher<E>>>,
    backoff: Option<Arc<dyn DelaySource>>,
    wait_hook: Option<WaitHook>,
    async_wait_hook: Option<AsyncWaitHook>,
    fault_hook: Option<FaultHook<E>>,
    default_matchers: bool,
}

impl<E> Default for RetryDriverBuilder<E> {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            matchers: Vec::new(),
            backoff: None,
            wait_hook: None,
            async_wait_hook: None,
            fault_hook: None,
            default_matchers: true,
        }
    }
}

impl<E> fmt::Debug for RetryDriverBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryDriverBuilder")
            .field("max_attempts", &self.max_attempts)
            .field("matchers", &self.matchers.len())
            .field("default_matchers", &self.default_matchers)
            .finish_non_exhaustive()
    }
}

impl<E> RetryDriverBuilder<E> {
    /// Set the maximum number of attempts.
    ///
    /// Zero is allowed: the run fails with [`RetryError::Exhausted`] without
    /// invoking the operation.
    ///
    /// Default: 5
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Add a fault matcher.
    ///
    /// The first call replaces the default match-everything set. A fault is
    /// retried when any matcher accepts it.
    pub fn matcher<M>(mut self, matcher: M) -> Self
    where
        M: FaultMatcher<E> + 'static,
    {
        self.default_matchers = false;
        self.matchers.push(Arc::new(matcher));
        self
    }

    /// Replace the matcher set with `matchers`.
    ///
    /// An empty set is rejected by [`build`](Self::build).
    pub fn matchers<I>(mut self, matchers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn FaultMatcher<E>>>,
    {
        self.default_matchers = false;
        self.matchers = matchers.into_iter().collect();
        self
    }

    /// Set the delay source.
    ///
    /// Default: [`BackoffSequence::default`]
    pub fn backoff<S>(mut self, backoff: S) -> Self
    where
        S: DelaySource + 'static,
    {
        self.backoff = Some(Arc::new(backoff));
        self
    }

    /// Share an existing delay source with other drivers.
    pub fn shared_backoff(mut self, backoff: Arc<dyn DelaySource>) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Set the blocking wait hook used by [`RetryDriver::run`].
    ///
    /// Default: `std::thread::sleep`
    pub fn wait_hook<W>(mut self, wait: W) -> Self
    where
        W: Fn(Duration) + Send + Sync + 'static,
    {
        self.wait_hook = Some(Arc::new(wait));
        self
    }

    /// Set the async wait hook used by [`RetryDriver::run_async`].
    ///
    /// Default: `tokio::time::sleep`
    pub fn async_wait_hook<W, Fut>(mut self, wait: W) -> Self
    where
        W: Fn(Duration) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.async_wait_hook = Some(Arc::new(move |delay| Box::pin(wait(delay)) as WaitFuture));
        self
    }

    /// Set the hook observing each retried fault.
    ///
    /// Default: no-op
    pub fn on_fault<H>(mut self, hook: H) -> Self
    where
        H: Fn(&E, u32) + Send + Sync + 'static,
    {
        self.fault_hook = Some(Arc::new(hook));
        self
    }

    /// Validate and build the driver.
    pub fn build(self) -> Result<RetryDriver<E>>
    where
        E: 'static,
    {
        let matchers: Vec<Arc<dyn FaultMatcher<E>>> = if self.default_matchers {
            vec![Arc::new(MatchAll)]
        } else {
            self.matchers
        };

        if matchers.is_empty() {
            return Err(Error::invalid(
                "fault_matchers",
                "must contain at least one matcher",
            ));
        }

        Ok(RetryDriver {
            max_attempts: self.max_attempts,
            matchers: matchers.into(),
            backoff: self
                .backoff
                .unwrap_or_else(|| Arc::new(BackoffSequence::default())),
            wait_hook: self.wait_hook.unwrap_or_else(hooks::blocking_wait),
            async_wait_hook: self.async_wait_hook.unwrap_or_else(hooks::tokio_sleep),
            fault_hook: self.fault_hook.unwrap_or_else(hooks::ignore_fault),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::FixedDelays;
    use crate::matcher::of_type;
    use std::io;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq)]
    enum TestFault {
        #[error("transient")]
        Transient,
        #[error("fatal")]
        Fatal,
    }

    fn recording_driver(
        max_attempts: u32,
        waits: Arc<Mutex<Vec<Duration>>>,
    ) -> RetryDriver<TestFault> {
        RetryDriver::builder()
            .max_attempts(max_attempts)
            .backoff(FixedDelays::new(
                (1..=10).map(Duration::from_millis),
            ))
            .matcher(|e: &TestFault| *e == TestFault::Transient)
            .wait_hook(move |delay| waits.lock().unwrap().push(delay))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let driver = RetryDriver::<io::Error>::builder().build().unwrap();

        assert_eq!(driver.max_attempts(), 5);
        assert!(driver.is_retryable(&io::Error::other("anything")));
    }

    #[test]
    fn test_empty_matchers_rejected() {
        let err = RetryDriver::<io::Error>::builder()
            .matchers(Vec::new())
            .build()
            .unwrap_err();

        assert!(matches!(
            err,
            Error::InvalidConfiguration {
                parameter: "fault_matchers",
                ..
            }
        ));
    }

    #[test]
    fn test_any_matcher_qualifies() {
        let driver = RetryDriver::<TestFault>::builder()
            .matcher(|e: &TestFault| *e == TestFault::Transient)
            .matcher(|e: &TestFault| *e == TestFault::Fatal)
            .build()
            .unwrap();

        assert!(driver.is_retryable(&TestFault::Transient));
        assert!(driver.is_retryable(&TestFault::Fatal));
    }

    #[test]
    fn test_retry_success_on_third_attempt() {
        let waits = Arc::new(Mutex::new(Vec::new()));
        let driver = recording_driver(5, Arc::clone(&waits));

        let result = driver.run(|attempt| {
            if attempt < 3 {
                Err(TestFault::Transient)
            } else {
                Ok(attempt * 10)
            }
        });

        assert_eq!(result.unwrap(), 30);
        assert_eq!(
            *waits.lock().unwrap(),
            vec![Duration::from_millis(1), Duration::from_millis(2)]
        );
    }

    #[test]
    fn test_exhaustion_waits_once_per_attempt() {
        let waits = Arc::new(Mutex::new(Vec::new()));
        let driver = recording_driver(3, Arc::clone(&waits));
        let calls = AtomicU32::new(0);

        let err = driver
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TestFault::Transient)
            })
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(waits.lock().unwrap().len(), 3);
        assert_eq!(err.attempts(), Some(3));
        assert_eq!(err.cause(), Some(&TestFault::Transient));
    }

    #[test]
    fn test_non_matching_fault_short_circuits() {
        let waits = Arc::new(Mutex::new(Vec::new()));
        let driver = recording_driver(5, Arc::clone(&waits));
        let calls = AtomicU32::new(0);

        let err = driver
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TestFault::Fatal)
            })
            .unwrap_err();

        assert!(matches!(err, RetryError::NonRetryable(TestFault::Fatal)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(waits.lock().unwrap().is_empty());
    }

    #[test]
    fn test_zero_attempts_never_invokes_operation() {
        let waits = Arc::new(Mutex::new(Vec::new()));
        let driver = recording_driver(0, Arc::clone(&waits));

        let err = driver
            .run(|_| -> std::result::Result<(), TestFault> {
                panic!("operation must not run with zero attempts")
            })
            .unwrap_err();

        assert!(err.is_exhausted());
        assert_eq!(err.attempts(), Some(0));
        assert!(err.cause().is_none());
    }

    #[test]
    fn test_short_finite_source_pads_with_zero() {
        let waits = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&waits);
        let driver = RetryDriver::<TestFault>::builder()
            .max_attempts(3)
            .backoff(FixedDelays::new([Duration::from_millis(7)]))
            .wait_hook(move |delay| recorded.lock().unwrap().push(delay))
            .build()
            .unwrap();

        let _ = driver.run(|_| Err::<(), _>(TestFault::Transient));

        assert_eq!(
            *waits.lock().unwrap(),
            vec![Duration::from_millis(7), Duration::ZERO, Duration::ZERO]
        );
    }

    #[test]
    fn test_fault_hook_runs_before_wait_hook() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let on_fault = Arc::clone(&events);
        let on_wait = Arc::clone(&events);

        let driver = RetryDriver::<TestFault>::builder()
            .max_attempts(2)
            .backoff(FixedDelays::zero(2))
            .on_fault(move |_, attempt| on_fault.lock().unwrap().push(format!("fault {attempt}")))
            .wait_hook(move |_| on_wait.lock().unwrap().push("wait".to_string()))
            .build()
            .unwrap();

        let _ = driver.run(|_| Err::<(), _>(TestFault::Transient));

        assert_eq!(
            *events.lock().unwrap(),
            vec!["fault 1", "wait", "fault 2", "wait"]
        );
    }

    #[test]
    fn test_of_type_matcher_with_io_errors() {
        #[derive(Debug, Error)]
        enum FetchError {
            #[error("io")]
            Io(#[from] io::Error),
            #[error("decode")]
            Decode,
        }

        let driver = RetryDriver::<FetchError>::builder()
            .max_attempts(2)
            .backoff(FixedDelays::zero(2))
            .matcher(of_type::<io::Error>())
            .wait_hook(|_| {})
            .build()
            .unwrap();

        let err = driver
            .run(|_| Err::<(), _>(FetchError::from(io::Error::other("reset"))))
            .unwrap_err();
        assert!(err.is_exhausted());

        let err = driver.run(|_| Err::<(), _>(FetchError::Decode)).unwrap_err();
        assert!(err.is_non_retryable());
    }

    #[test]
    fn test_driver_is_shareable_across_threads() {
        let driver = RetryDriver::<TestFault>::builder()
            .max_attempts(3)
            .backoff(FixedDelays::zero(3))
            .wait_hook(|_| {})
            .build()
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let driver = driver.clone();
                std::thread::spawn(move || {
                    driver.run(|attempt| {
                        if attempt < 2 {
                            Err(TestFault::Transient)
                        } else {
                            Ok(i)
                        }
                    })
                })
            })
            .collect();

        let results: Vec<u32> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        assert_eq!(results, vec![0, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_async_retries_then_succeeds() {
        let driver = RetryDriver::<TestFault>::builder()
            .max_attempts(4)
            .backoff(FixedDelays::new([
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ]))
            .build()
            .unwrap();

        let start = tokio::time::Instant::now();
        let result = driver
            .run_async(|attempt| async move {
                if attempt < 3 {
                    Err(TestFault::Transient)
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_async_exhaustion_and_short_circuit() {
        let waits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&waits);
        let driver = RetryDriver::<TestFault>::builder()
            .max_attempts(2)
            .backoff(FixedDelays::zero(2))
            .matcher(|e: &TestFault| *e == TestFault::Transient)
            .async_wait_hook(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                async {}
            })
            .build()
            .unwrap();

        let err = driver
            .run_async(|_| async { Err::<(), _>(TestFault::Transient) })
            .await
            .unwrap_err();
        assert_eq!(err.attempts(), Some(2));
        assert_eq!(waits.load(Ordering::SeqCst), 2);

        let err = driver
            .run_async(|_| async { Err::<(), _>(TestFault::Fatal) })
            .await
            .unwrap_err();
        assert!(err.is_non_retryable());
        assert_eq!(waits.load(Ordering::SeqCst), 2);
    }
}
