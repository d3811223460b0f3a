use rand::distributions::{Alphanumeric, Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::{IteratorRandom, SliceRandom};
use rand::{Rng, SeedableRng};

/// Seeded random source threaded through every generator and selector call.
///
/// Two handles built from the same seed yield the same draw sequence, so a run
/// driven by one handle is reproducible byte for byte.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    inner: StdRng,
}

impl DeterministicRng {
    /// Create a new deterministic RNG from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Next pseudo-random `u64`.
    #[must_use]
    pub fn next_u64(&mut self) -> u64 {
        self.inner.r#gen()
    }

    /// Next value in `[0, upper_exclusive)`.
    #[must_use]
    pub fn next_bounded(&mut self, upper_exclusive: u64) -> u64 {
        if upper_exclusive == 0 {
            return 0;
        }
        self.inner.gen_range(0..upper_exclusive)
    }

    /// Bernoulli trial with integer percent.
    #[must_use]
    pub fn hit_rate_percent(&mut self, percent: u8) -> bool {
        if percent == 0 {
            return false;
        }
        if percent >= 100 {
            return true;
        }
        self.next_bounded(100) < u64::from(percent)
    }

    /// Fair coin.
    #[must_use]
    pub fn coin(&mut self) -> bool {
        self.inner.r#gen()
    }

    /// Uniform value in `lo..=hi`. Returns `lo` when the range is inverted.
    #[must_use]
    pub fn range_inclusive(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        self.inner.gen_range(lo..=hi)
    }

    /// Uniform `usize` in `lo..=hi`. Returns `lo` when the range is inverted.
    #[must_use]
    pub fn range_usize(&mut self, lo: usize, hi: usize) -> usize {
        if hi <= lo {
            return lo;
        }
        self.inner.gen_range(lo..=hi)
    }

    /// Pick one element of a slice.
    #[must_use]
    pub fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        items.choose(&mut self.inner).copied()
    }

    /// Pick one element from an iterator.
    pub fn pick_iter<I: Iterator>(&mut self, iter: I) -> Option<I::Item> {
        iter.choose(&mut self.inner)
    }

    /// Draw `amount` distinct elements from `items`, in random order.
    #[must_use]
    pub fn sample_distinct<T: Copy>(&mut self, items: &[T], amount: usize) -> Vec<T> {
        items
            .choose_multiple(&mut self.inner, amount)
            .copied()
            .collect()
    }

    /// Index drawn proportionally to `weights`. `None` when every weight is zero.
    #[must_use]
    pub fn weighted_index(&mut self, weights: &[u32]) -> Option<usize> {
        WeightedIndex::new(weights)
            .ok()
            .map(|dist| dist.sample(&mut self.inner))
    }

    /// ASCII alphanumeric string of the given length.
    #[must_use]
    pub fn alphanumeric(&mut self, len: usize) -> String {
        (&mut self.inner)
            .sample_iter(Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }
}
