//! Seeded random source
//!
//! Every draw the generator makes goes through this wrapper, so the ChaCha8
//! stream is the sole source of nondeterminism. The shuffle is an explicit
//! Fisher-Yates over `next_index` draws, keeping the consumed stream fully
//! specified across `rand` versions.

use std::collections::BTreeSet;

use rand::{Rng as _, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::types::RandomValue;

pub struct Rng {
    inner: ChaCha8Rng,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { inner: ChaCha8Rng::seed_from_u64(seed as u64) }
    }

    /// Uniform integer in `[min, max]`, both inclusive.
    pub fn next_int(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.inner.gen_range(min..=max)
    }

    /// Uniform index in `[0, len)`. `len` must be nonzero.
    pub fn next_index(&mut self, len: usize) -> usize {
        self.next_int(0, len as i64 - 1) as usize
    }

    /// Percent roll; 0 never succeeds, 100 always does.
    pub fn chance(&mut self, percent: u8) -> bool {
        if percent == 0 {
            return false;
        }
        if percent >= 100 {
            return true;
        }
        self.next_int(0, 99) < percent as i64
    }

    pub fn pick_value(&mut self, value: RandomValue) -> u32 {
        self.next_int(value.min as i64, value.max as i64) as u32
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_index(i + 1);
            items.swap(i, j);
        }
    }

    pub fn pick_element<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            Some(&items[self.next_index(items.len())])
        }
    }

    pub fn pick_from_set<'a, T>(&mut self, items: &'a BTreeSet<T>) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            items.iter().nth(self.next_index(items.len()))
        }
    }

    /// Splits `total` into `count` positive integers that sum to `total`.
    ///
    /// Each of the first `count - 1` summands is drawn uniformly from
    /// `[1, remaining - summands_left]` so that every later summand can
    /// still be at least 1; the last summand takes the remainder. Requires
    /// `total >= count`; a short total collapses to a single summand.
    pub fn constrained_sum(&mut self, count: usize, total: u32) -> Vec<u32> {
        if count == 0 || total == 0 {
            return Vec::new();
        }
        if (total as usize) < count {
            return vec![total];
        }

        let mut values = Vec::with_capacity(count);
        let mut remaining = total;
        for left in (1..count).rev() {
            let share = self.next_int(1, (remaining - left as u32) as i64) as u32;
            values.push(share);
            remaining -= share;
        }
        values.push(remaining);
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_int(0, 1000), b.next_int(0, 1000));
        }
    }

    #[test]
    fn chance_boundaries() {
        let mut rng = Rng::new(1);
        for _ in 0..50 {
            assert!(!rng.chance(0));
            assert!(rng.chance(100));
        }
    }

    #[test]
    fn pick_value_stays_in_range() {
        let mut rng = Rng::new(3);
        let value = RandomValue::new(10, 20);
        for _ in 0..200 {
            let v = rng.pick_value(value);
            assert!((10..=20).contains(&v));
        }
    }

    #[test]
    fn constrained_sum_partitions_total() {
        let mut rng = Rng::new(11);
        for count in 1..=6usize {
            for total in [6u32, 50, 500, 1234] {
                let values = rng.constrained_sum(count, total);
                assert_eq!(values.len(), count);
                assert_eq!(values.iter().sum::<u32>(), total);
                assert!(values.iter().all(|&v| v >= 1));
            }
        }
    }

    #[test]
    fn constrained_sum_short_total() {
        let mut rng = Rng::new(5);
        assert_eq!(rng.constrained_sum(4, 3), vec![3]);
        assert!(rng.constrained_sum(0, 10).is_empty());
        assert!(rng.constrained_sum(3, 0).is_empty());
    }

    #[test]
    fn shuffle_is_reproducible() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        let mut left: Vec<u32> = (0..32).collect();
        let mut right: Vec<u32> = (0..32).collect();
        a.shuffle(&mut left);
        b.shuffle(&mut right);
        assert_eq!(left, right);
    }
}
