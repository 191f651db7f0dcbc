//! Property-based tests for rebound
//!
//! These use proptest to check the numeric contract of backoff sequences and
//! the attempt accounting of the retry driver across generated inputs.

#[cfg(test)]
mod tests {
    use crate::{BackoffSequence, FixedDelays, RetryDriver, RetryError};
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    // ===== Strategy Generators =====

    // Whole nanoseconds up to 10s; sub-nanosecond bounds are rejected at build
    fn arb_delay_secs() -> impl Strategy<Value = f64> {
        (0u64..10_000_000_000).prop_map(|nanos| nanos as f64 * 1e-9)
    }

    fn arb_jitter() -> impl Strategy<Value = f64> {
        0.0f64..0.999
    }

    fn arb_factor() -> impl Strategy<Value = f64> {
        0.1f64..16.0
    }

    // Duration conversion rounds to whole nanoseconds
    const NANO: f64 = 1e-9;

    // ===== Backoff Properties =====

    proptest! {
        /// Property: every delay lies within the jittered bounds
        /// Invariant: min*(1-j/2) <= delay <= max*(1+j/2)
        #[test]
        fn prop_delay_within_bounds(
            min in arb_delay_secs(),
            extra in arb_delay_secs(),
            jitter in arb_jitter(),
            factor in arb_factor(),
            attempt in 0u32..500,
        ) {
            let max = min + extra;
            let backoff = BackoffSequence::builder()
                .min_delay_secs(min)
                .max_delay_secs(max)
                .jitter(jitter)
                .factor(factor)
                .build()
                .expect("valid configuration");

            let delay = backoff.delay_for_attempt(attempt).as_secs_f64();
            let low = min * (1.0 - jitter / 2.0);
            let high = max * (1.0 + jitter / 2.0);

            prop_assert!(delay >= low - NANO, "delay {} below {}", delay, low);
            prop_assert!(delay <= high + NANO, "delay {} above {}", delay, high);
        }

        /// Property: without jitter the sequence is the clamped exponential
        /// Invariant: delays are non-decreasing and equal min(min*factor^n, max)
        #[test]
        fn prop_zero_jitter_is_monotonic(
            min in 0.001f64..1.0,
            extra in arb_delay_secs(),
            factor in 1.0f64..8.0,
            len in 1usize..64,
        ) {
            let max = min + extra;
            let backoff = BackoffSequence::builder()
                .min_delay_secs(min)
                .max_delay_secs(max)
                .jitter(0.0)
                .factor(factor)
                .build()
                .expect("valid configuration");

            let delays: Vec<Duration> = backoff.delays().take(len).collect();

            prop_assert!(delays.windows(2).all(|w| w[0] <= w[1]));
            prop_assert_eq!(delays.iter().min(), delays.first());
            prop_assert_eq!(delays.iter().max(), delays.last());

            for (n, delay) in delays.iter().enumerate() {
                let exponent = i32::try_from(n).expect("small index");
                let expected = (min * factor.powi(exponent)).min(max);
                prop_assert_eq!(*delay, Duration::from_secs_f64(expected));
            }
        }

        /// Property: indexed access and iteration agree without jitter
        #[test]
        fn prop_nth_matches_iteration(
            min in 0.001f64..1.0,
            factor in arb_factor(),
            attempt in 0u32..100,
        ) {
            let backoff = BackoffSequence::builder()
                .min_delay_secs(min)
                .max_delay_secs(60.0)
                .jitter(0.0)
                .factor(factor)
                .build()
                .expect("valid configuration");

            let index = usize::try_from(attempt).expect("small index");
            prop_assert_eq!(backoff.delays().nth(index), Some(backoff.nth(attempt)));
        }
    }

    // ===== Driver Properties =====

    proptest! {
        /// Property: always-failing operations consume the whole budget
        /// Invariant: N invocations, N waits, cause from attempt N
        #[test]
        fn prop_attempt_budget(max_attempts in 0u32..20) {
            let waits = Arc::new(AtomicU32::new(0));
            let counter = Arc::clone(&waits);
            let driver = RetryDriver::<AttemptFault>::builder()
                .max_attempts(max_attempts)
                .backoff(FixedDelays::zero(0))
                .wait_hook(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .build()
                .expect("valid configuration");

            let calls = AtomicU32::new(0);
            let err = driver
                .run(|attempt| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(AttemptFault(attempt))
                })
                .expect_err("operation never succeeds");

            prop_assert_eq!(calls.load(Ordering::SeqCst), max_attempts);
            prop_assert_eq!(waits.load(Ordering::SeqCst), max_attempts);

            match err {
                RetryError::Exhausted { attempts, cause } => {
                    prop_assert_eq!(attempts, max_attempts);
                    let expected = (max_attempts > 0).then_some(AttemptFault(max_attempts));
                    prop_assert_eq!(cause, expected);
                }
                RetryError::NonRetryable(_) => prop_assert!(false, "match-all never rejects"),
            }
        }

        /// Property: attempt numbers are 1-based and contiguous
        #[test]
        fn prop_attempts_are_contiguous(succeed_on in 1u32..10, max_attempts in 1u32..10) {
            let driver = RetryDriver::<AttemptFault>::builder()
                .max_attempts(max_attempts)
                .backoff(FixedDelays::zero(0))
                .wait_hook(|_| {})
                .build()
                .expect("valid configuration");

            let mut seen = Vec::new();
            let result = driver.run(|attempt| {
                seen.push(attempt);
                if attempt == succeed_on { Ok(attempt) } else { Err(AttemptFault(attempt)) }
            });

            let expected_len = succeed_on.min(max_attempts);
            prop_assert_eq!(seen, (1..=expected_len).collect::<Vec<_>>());
            prop_assert_eq!(result.is_ok(), succeed_on <= max_attempts);
        }
    }

    #[derive(Debug, Clone, PartialEq, thiserror::Error)]
    #[error("attempt {0} failed")]
    struct AttemptFault(u32);
}
