//! Configuration knobs and their defaults.
//!
//! Compile-time defaults are plain constants. Structures that allow a
//! per-instance override take one of the small builder structs below.

use crate::chan::{Chan, Channel, SyncChan};
use crate::failure::violation;

/// Capacity a growable container allocates on its first push.
pub const DEFAULT_CAPACITY: usize = 4;

/// Multiplier applied to a full container's capacity.
pub const GROWTH_FACTOR: usize = 2;

/// Coroutine stack size in bytes when the caller passes `0`.
pub const CORO_STACK_SIZE: usize = 64 * 1024;

/// Bucket count a `ProbeMap` allocates on its first insert.
pub const MAP_INITIAL_CAPACITY: usize = 16;

/// Occupancy percentage above which a `ProbeMap` doubles.
pub const MAP_LOAD_THRESHOLD: usize = 70;

/// Next capacity for a growable buffer that must hold `needed` elements.
///
/// Starts from `max(DEFAULT_CAPACITY, current * GROWTH_FACTOR)` and keeps
/// multiplying until `needed` fits.
#[track_caller]
pub(crate) fn grown_capacity(current: usize, needed: usize) -> usize {
    let mut cap = DEFAULT_CAPACITY.max(current.saturating_mul(GROWTH_FACTOR));
    while cap < needed {
        cap = match cap.checked_mul(GROWTH_FACTOR) {
            Some(c) => c,
            None => violation("capacity overflow"),
        };
    }
    cap
}

/// Sizing policy for `ProbeMap`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MapConfig {
    initial_capacity: usize,
    load_threshold: usize,
}

impl MapConfig {
    pub const fn new() -> Self {
        Self {
            initial_capacity: MAP_INITIAL_CAPACITY,
            load_threshold: MAP_LOAD_THRESHOLD,
        }
    }

    /// Bucket count on first allocation, rounded up to a power of two.
    #[track_caller]
    pub fn with_initial_capacity(mut self, buckets: usize) -> Self {
        if buckets == 0 {
            violation("map initial capacity must be non-zero");
        }
        self.initial_capacity = match buckets.checked_next_power_of_two() {
            Some(c) => c,
            None => violation("map initial capacity overflow"),
        };
        self
    }

    /// Load threshold in percent, `1..=100`.
    #[track_caller]
    pub fn with_load_threshold(mut self, percent: usize) -> Self {
        if !(1..=100).contains(&percent) {
            violation(format!("map load threshold {percent} outside 1..=100"));
        }
        self.load_threshold = percent;
        self
    }

    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    pub fn load_threshold(&self) -> usize {
        self.load_threshold
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Channel construction parameters.
///
/// `thread_safe` selects the mutex-and-condvar implementation; it is off
/// by default.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChanConfig {
    pub capacity: usize,
    pub thread_safe: bool,
}

impl ChanConfig {
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            thread_safe: false,
        }
    }

    pub const fn thread_safe(mut self, on: bool) -> Self {
        self.thread_safe = on;
        self
    }

    #[track_caller]
    pub fn build_local<T>(&self) -> Chan<T> {
        Chan::new(self.capacity)
    }

    #[track_caller]
    pub fn build_sync<T>(&self) -> SyncChan<T> {
        SyncChan::new(self.capacity)
    }

    /// Build whichever implementation `thread_safe` selects.
    #[track_caller]
    pub fn build<T: 'static>(&self) -> Box<dyn Channel<T>> {
        if self.thread_safe {
            Box::new(self.build_sync::<T>())
        } else {
            Box::new(self.build_local::<T>())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: growth starts at the default and doubles from there.
    #[test]
    fn grown_capacity_sequence() {
        assert_eq!(grown_capacity(0, 1), 4);
        assert_eq!(grown_capacity(4, 5), 8);
        assert_eq!(grown_capacity(8, 9), 16);
        assert_eq!(grown_capacity(0, 9), 16);
        assert_eq!(grown_capacity(1, 2), 4);
    }

    #[test]
    fn map_config_defaults_and_rounding() {
        let c = MapConfig::default();
        assert_eq!(c.initial_capacity(), 16);
        assert_eq!(c.load_threshold(), 70);

        let c = MapConfig::new().with_initial_capacity(5).with_load_threshold(50);
        assert_eq!(c.initial_capacity(), 8);
        assert_eq!(c.load_threshold(), 50);
    }

    #[test]
    #[should_panic(expected = "outside 1..=100")]
    fn map_config_rejects_zero_threshold() {
        let _ = MapConfig::new().with_load_threshold(0);
    }

    #[test]
    fn chan_config_selects_implementation() {
        let local = ChanConfig::new(2).build::<u8>();
        let sync = ChanConfig::new(2).thread_safe(true).build::<u8>();
        assert!(!local.is_thread_safe());
        assert!(sync.is_thread_safe());
        assert_eq!(local.capacity(), 2);
        assert_eq!(sync.capacity(), 2);
    }
}
