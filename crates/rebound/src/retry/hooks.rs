//! Side-effecting hooks invoked between attempts.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Future returned by an [`AsyncWaitHook`].
pub type WaitFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Blocking wait invoked with the delay before the next attempt.
pub type WaitHook = Arc<dyn Fn(Duration) + Send + Sync>;

/// Non-blocking wait used by [`RetryDriver::run_async`](super::RetryDriver::run_async).
pub type AsyncWaitHook = Arc<dyn Fn(Duration) -> WaitFuture + Send + Sync>;

/// Observer invoked with each retried fault and the 1-based attempt that raised it.
pub type FaultHook<E> = Arc<dyn Fn(&E, u32) + Send + Sync>;

/// Default wait hook: blocks the current thread.
pub fn blocking_wait() -> WaitHook {
    Arc::new(|delay| {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    })
}

/// Default async wait hook: `tokio::time::sleep`.
pub fn tokio_sleep() -> AsyncWaitHook {
    Arc::new(|delay| Box::pin(tokio::time::sleep(delay)))
}

/// Default fault hook: does nothing.
pub fn ignore_fault<E>() -> FaultHook<E> {
    Arc::new(|_, _| {})
}
