//! Randomized pauses used to space out automated browser actions.

use rand::Rng;
use std::time::Duration;

/// An inclusive range of milliseconds to pick a random pause from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    /// Build a range; the bounds are swapped if given out of order.
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        if min_ms <= max_ms {
            Self { min_ms, max_ms }
        } else {
            Self {
                min_ms: max_ms,
                max_ms: min_ms,
            }
        }
    }

    /// A range that always yields zero. Handy for tests.
    pub const fn none() -> Self {
        Self::new(0, 0)
    }

    /// Pick a random duration within the range.
    pub fn sample(&self) -> Duration {
        self.sample_with(&mut rand::thread_rng())
    }

    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rng.gen_range(self.min_ms..=self.max_ms))
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self::new(2000, 4000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sample_within_bounds() {
        let range = DelayRange::new(1000, 2000);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let d = range.sample_with(&mut rng);
            assert!(d >= Duration::from_millis(1000));
            assert!(d <= Duration::from_millis(2000));
        }
    }

    #[test]
    fn test_swapped_bounds() {
        let range = DelayRange::new(500, 100);
        assert_eq!(range.min_ms, 100);
        assert_eq!(range.max_ms, 500);
    }

    #[test]
    fn test_degenerate_range() {
        assert_eq!(DelayRange::none().sample(), Duration::ZERO);
        assert_eq!(DelayRange::new(42, 42).sample(), Duration::from_millis(42));
    }
}
