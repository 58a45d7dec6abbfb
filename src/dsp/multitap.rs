//! Flat storage for per-(channel, order) delay taps.
//!
//! ```text
//!   channel stride = n_mirror_sources(max_order)
//!
//!   | ch 0: order 1 | order 2 | ... | ch 1: order 1 | order 2 | ... |
//!          ^ shell_size(1) slots
//!                   ^ shell_size(2) slots
//! ```
//!
//! Each slot holds at most one tap per image source of that order, which is
//! the most a single channel can receive. The whole table is allocated once;
//! refreshing the taps only rewrites counts and values.

use super::delay::DelayLine;
use crate::geometry::{n_mirror_sources, shell_size};

/// One read point into an order's delay line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tap {
    pub delay: usize,
    pub gain: f32,
}

#[derive(Debug, Clone)]
pub struct TapTable {
    n_channels: usize,
    max_order: usize,
    stride: usize,
    taps: Vec<Tap>,
    counts: Vec<usize>,
}

impl TapTable {
    pub fn new(n_channels: usize, max_order: usize) -> Self {
        let stride = n_mirror_sources(max_order);
        Self {
            n_channels,
            max_order,
            stride,
            taps: vec![Tap::default(); n_channels * stride],
            counts: vec![0; n_channels * max_order],
        }
    }

    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    pub fn max_order(&self) -> usize {
        self.max_order
    }

    /// Slot capacity for `order` (1-based).
    pub fn capacity(&self, order: usize) -> usize {
        shell_size(order)
    }

    #[inline]
    fn slot(&self, channel: usize, order: usize) -> (usize, usize) {
        debug_assert!(channel < self.n_channels && (1..=self.max_order).contains(&order));
        let start = channel * self.stride + n_mirror_sources(order - 1);
        let count = channel * self.max_order + order - 1;
        (start, count)
    }

    /// Append a tap. Returns `false` when the slot is full.
    pub fn push(&mut self, channel: usize, order: usize, tap: Tap) -> bool {
        let (start, count) = self.slot(channel, order);
        let len = self.counts[count];
        if len >= self.capacity(order) {
            return false;
        }
        self.taps[start + len] = tap;
        self.counts[count] = len + 1;
        true
    }

    #[inline]
    pub fn taps(&self, channel: usize, order: usize) -> &[Tap] {
        let (start, count) = self.slot(channel, order);
        &self.taps[start..start + self.counts[count]]
    }

    pub fn len(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|c| *c == 0)
    }

    pub fn clear(&mut self) {
        self.counts.fill(0);
    }

    /// Sum of all taps of one slot read from `line`.
    #[inline]
    pub fn read(&self, channel: usize, order: usize, line: &DelayLine) -> f32 {
        self.taps(channel, order)
            .iter()
            .map(|tap| line.read(tap.delay) * tap.gain)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_independent() {
        let mut table = TapTable::new(2, 3);
        assert!(table.push(0, 1, Tap { delay: 10, gain: 0.5 }));
        assert!(table.push(1, 3, Tap { delay: 20, gain: 0.25 }));
        assert!(table.push(1, 3, Tap { delay: 30, gain: 0.125 }));

        assert_eq!(table.taps(0, 1), &[Tap { delay: 10, gain: 0.5 }]);
        assert!(table.taps(0, 2).is_empty());
        assert!(table.taps(1, 1).is_empty());
        assert_eq!(table.taps(1, 3).len(), 2);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_full_slot_rejects() {
        let mut table = TapTable::new(1, 2);
        for i in 0..shell_size(1) {
            assert!(table.push(0, 1, Tap { delay: i, gain: 1.0 }));
        }
        assert!(!table.push(0, 1, Tap { delay: 99, gain: 1.0 }));
        // The next order's slot is untouched.
        assert!(table.taps(0, 2).is_empty());
    }

    #[test]
    fn test_clear() {
        let mut table = TapTable::new(8, 4);
        table.push(7, 4, Tap { delay: 1, gain: 1.0 });
        assert!(!table.is_empty());
        table.clear();
        assert!(table.is_empty());
    }

    #[test]
    fn test_read_sums_taps() {
        let mut line = DelayLine::new(16);
        for i in 0..16 {
            line.write(i as f32);
        }
        let mut table = TapTable::new(1, 1);
        table.push(0, 1, Tap { delay: 0, gain: 1.0 });
        table.push(0, 1, Tap { delay: 5, gain: 0.5 });

        assert_eq!(table.read(0, 1, &line), 15.0 + 10.0 * 0.5);
    }
}
