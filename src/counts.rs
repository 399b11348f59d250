//! Single-threaded reference counters for control blocks.
//!
//! Counts are plain `Cell<usize>`; handles built on them are `!Send` and
//! `!Sync`. Overflow aborts, matching `Rc`; an underflow means a handle
//! was released twice and is a contract violation.

use crate::failure::violation;
use core::cell::Cell;

#[derive(Debug)]
pub struct RefCount {
    count: Cell<usize>,
}

impl RefCount {
    pub const fn new(initial: usize) -> Self {
        Self {
            count: Cell::new(initial),
        }
    }

    #[inline]
    pub fn get(&self) -> usize {
        self.count.get()
    }

    /// Add one reference.
    #[inline]
    pub fn inc(&self) {
        let n = self.count.get().wrapping_add(1);
        self.count.set(n);
        if n == 0 {
            std::process::abort();
        }
    }

    /// Drop one reference. Returns true if the count is now zero.
    #[inline]
    #[track_caller]
    pub fn dec(&self) -> bool {
        let c = self.count.get();
        if c == 0 {
            violation("reference count underflow");
        }
        self.count.set(c - 1);
        c == 1
    }
}
