//! Debug-only guard against nested entry into a probing section.
//!
//! `ProbeMap` calls user `Hash` and `Eq` implementations while walking its
//! buckets. If one of those calls back into the same map, the bucket array
//! may be observed mid-update. Debug builds report the nested entry as a
//! contract violation; release builds compile the tracker away.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug)]
pub struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Cell<bool>,
    _nosend: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(false),
            _nosend: PhantomData,
        }
    }

    /// Open a probing section, closed when the guard drops.
    #[inline]
    #[track_caller]
    pub fn enter(&self) -> ProbeGuard<'_> {
        #[cfg(debug_assertions)]
        if self.active.replace(true) {
            crate::failure::violation("reentrant access to probe map during hashing or comparison");
        }
        ProbeGuard {
            #[cfg(debug_assertions)]
            owner: self,
            #[cfg(not(debug_assertions))]
            owner: PhantomData,
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ProbeGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    owner: PhantomData<&'a DebugReentrancy>,
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.active.set(false);
    }
}
