//! Random source for jitter draws.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Source of uniform draws used to jitter delays.
///
/// Not cryptographically secure; jitter only needs to spread callers apart.
#[derive(Clone, Default)]
pub(crate) enum Entropy {
    /// Per-thread generator, no shared state between threads.
    #[default]
    Thread,

    /// Shared, seeded generator for reproducible sequences.
    Seeded(Arc<Mutex<StdRng>>),

    #[cfg(test)]
    Fixed(f64),
}

impl fmt::Debug for Entropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thread => write!(f, "Thread"),
            Self::Seeded(_) => write!(f, "Seeded"),
            #[cfg(test)]
            Self::Fixed(value) => write!(f, "Fixed({value})"),
        }
    }
}

impl Entropy {
    pub(crate) fn seeded(seed: u64) -> Self {
        Self::Seeded(Arc::new(Mutex::new(StdRng::seed_from_u64(seed))))
    }

    /// Draws uniformly from `[low, high]`.
    pub(crate) fn uniform(&self, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }

        match self {
            Self::Thread => rand::thread_rng().gen_range(low..=high),
            Self::Seeded(rng) => rng
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .gen_range(low..=high),
            // Fixed position within the range, 0.0 = low, 1.0 = high
            #[cfg(test)]
            Self::Fixed(position) => low + (high - low) * position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_draws_stay_in_range() {
        let entropy = Entropy::Thread;
        for _ in 0..1_000 {
            let value = entropy.uniform(0.75, 1.25);
            assert!((0.75..=1.25).contains(&value), "{value} out of range");
        }
    }

    #[test]
    fn test_degenerate_range_skips_rng() {
        assert_eq!(Entropy::Thread.uniform(1.0, 1.0), 1.0);
        assert_eq!(Entropy::seeded(7).uniform(1.0, 1.0), 1.0);
    }

    #[test]
    fn test_same_seed_same_draws() {
        let a = Entropy::seeded(42);
        let b = Entropy::seeded(42);

        let left: Vec<f64> = (0..16).map(|_| a.uniform(0.5, 1.5)).collect();
        let right: Vec<f64> = (0..16).map(|_| b.uniform(0.5, 1.5)).collect();

        assert_eq!(left, right);
    }

    #[test]
    fn test_clones_share_seeded_state() {
        let a = Entropy::seeded(42);
        let b = a.clone();

        let first = a.uniform(0.0, 1.0);
        let second = b.uniform(0.0, 1.0);

        let fresh = Entropy::seeded(42);
        assert_eq!(first, fresh.uniform(0.0, 1.0));
        assert_eq!(second, fresh.uniform(0.0, 1.0));
    }

    #[test]
    fn test_seeded_draws_across_threads() {
        let entropy = Entropy::seeded(7);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let entropy = entropy.clone();
                std::thread::spawn(move || {
                    (0..1_000)
                        .map(|_| entropy.uniform(0.75, 1.25))
                        .collect::<Vec<f64>>()
                })
            })
            .collect();

        let draws: Vec<f64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();

        assert_eq!(draws.len(), 8_000);
        assert!(draws.iter().all(|v| (0.75..=1.25).contains(v)));
    }

    #[test]
    fn test_fixed_position() {
        let entropy = Entropy::Fixed(0.5);
        assert_eq!(entropy.uniform(0.0, 2.0), 1.0);
    }
}
