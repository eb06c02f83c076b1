//! Fixed-capacity sample window with running statistics.
//!
//! [`StatsBuffer`] is a FIFO of `f32` readings backed by a
//! `heapless::Deque`.  Unlike a ring buffer it never evicts: a push into a
//! full window is refused and the caller must pop first.  Readings that are
//! accepted keep their insertion order.
//!
//! `mean()` and `stddev()` are population statistics over the current
//! contents and return `0.0` for an empty window.

use heapless::Deque;

/// Bounded FIFO window of readings.
#[derive(Debug, Clone, Default)]
pub struct StatsBuffer<const N: usize> {
    items: Deque<f32, N>,
}

impl<const N: usize> StatsBuffer<N> {
    pub const fn new() -> Self {
        Self {
            items: Deque::new(),
        }
    }

    /// Append at the tail.  Returns `false` (and leaves the window
    /// untouched) when the window is full.
    pub fn push(&mut self, value: f32) -> bool {
        self.items.push_back(value).is_ok()
    }

    /// Remove and return the oldest reading.
    pub fn pop(&mut self) -> Option<f32> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Readings from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &f32> {
        self.items.iter()
    }

    pub fn mean(&self) -> f32 {
        if self.items.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.items.iter().sum();
        sum / self.items.len() as f32
    }

    /// Population standard deviation.
    pub fn stddev(&self) -> f32 {
        if self.items.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let sum_sq: f32 = self.items.iter().map(|x| (x - mean) * (x - mean)).sum();
        (sum_sq / self.items.len() as f32).sqrt()
    }

    pub fn min(&self) -> Option<f32> {
        self.items.iter().copied().reduce(f32::min)
    }

    pub fn max(&self) -> Option<f32> {
        self.items.iter().copied().reduce(f32::max)
    }
}

/// Exponential moving average step; `alpha` is clamped to `[0, 1]`.
pub fn exponential_moving_average(current: f32, previous: f32, alpha: f32) -> f32 {
    let alpha = alpha.clamp(0.0, 1.0);
    alpha * current + (1.0 - alpha) * previous
}

/// Map `value` linearly from `[from_min, from_max]` onto `[to_min, to_max]`.
/// A degenerate source range maps everything to `to_min`.
pub fn normalize(value: f32, from_min: f32, from_max: f32, to_min: f32, to_max: f32) -> f32 {
    let span = from_max - from_min;
    if span == 0.0 {
        return to_min;
    }
    (value - from_min) / span * (to_max - to_min) + to_min
}
