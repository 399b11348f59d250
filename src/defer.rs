//! Scope-bound release actions.
//!
//! Everything here rides on `Drop`: an action runs exactly once when its
//! guard leaves scope, whether by fallthrough, early return, `break` or a
//! panic unwinding through it. Guards in one scope drop in reverse
//! declaration order, and inner scopes finish before outer ones.
//!
//! - [`defer`] / [`defer!`]: run a closure at scope exit. Captures are
//!   whatever the closure captures, so by-reference captures observe the
//!   value as it is when the scope exits.
//! - [`guard`]: capture a value at declaration time and hand it to the
//!   action at scope exit.
//! - [`ReleaseScope`]: a runtime-sized list of actions, run LIFO.

use core::fmt;
use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};

/// Runs `F` when dropped unless cancelled.
#[must_use = "the action runs immediately if the guard is not bound"]
pub struct Defer<F: FnOnce()> {
    action: Option<F>,
}

pub fn defer<F: FnOnce()>(action: F) -> Defer<F> {
    Defer {
        action: Some(action),
    }
}

impl<F: FnOnce()> Defer<F> {
    /// Disarm without running.
    pub fn cancel(mut self) {
        self.action = None;
    }
}

impl<F: FnOnce()> Drop for Defer<F> {
    fn drop(&mut self) {
        if let Some(f) = self.action.take() {
            f();
        }
    }
}

impl<F: FnOnce()> fmt::Debug for Defer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Defer")
            .field("armed", &self.action.is_some())
            .finish()
    }
}

/// Run the given statements when the enclosing scope exits.
///
/// ```
/// use std::cell::Cell;
/// let hits = Cell::new(0);
/// {
///     rc_containers::defer! { hits.set(hits.get() + 1); }
///     assert_eq!(hits.get(), 0);
/// }
/// assert_eq!(hits.get(), 1);
/// ```
#[macro_export]
macro_rules! defer {
    ($($body:tt)*) => {
        let _deferred = $crate::defer::defer(|| { $($body)* });
    };
}

/// Owns a value captured at declaration time and passes it to the action
/// on drop. Derefs to the value in between.
#[must_use = "the action runs immediately if the guard is not bound"]
pub struct ScopeGuard<T, F: FnOnce(T)> {
    value: ManuallyDrop<T>,
    action: ManuallyDrop<F>,
}

pub fn guard<T, F: FnOnce(T)>(value: T, action: F) -> ScopeGuard<T, F> {
    ScopeGuard {
        value: ManuallyDrop::new(value),
        action: ManuallyDrop::new(action),
    }
}

impl<T, F: FnOnce(T)> ScopeGuard<T, F> {
    /// Disarm and return the value; the action is dropped unrun.
    pub fn into_inner(guard: Self) -> T {
        let mut guard = ManuallyDrop::new(guard);
        // SAFETY: `guard` is never dropped, so each field is taken once.
        unsafe {
            ManuallyDrop::drop(&mut guard.action);
            ManuallyDrop::take(&mut guard.value)
        }
    }
}

impl<T, F: FnOnce(T)> Deref for ScopeGuard<T, F> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T, F: FnOnce(T)> DerefMut for ScopeGuard<T, F> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T, F: FnOnce(T)> Drop for ScopeGuard<T, F> {
    fn drop(&mut self) {
        // SAFETY: drop runs once; the fields are not touched afterwards.
        let (value, action) = unsafe {
            (
                ManuallyDrop::take(&mut self.value),
                ManuallyDrop::take(&mut self.action),
            )
        };
        action(value);
    }
}

impl<T: fmt::Debug, F: FnOnce(T)> fmt::Debug for ScopeGuard<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScopeGuard").field(&*self.value).finish()
    }
}

/// Dynamic list of release actions run in reverse push order on drop.
#[derive(Default)]
pub struct ReleaseScope<'a> {
    actions: Vec<Box<dyn FnOnce() + 'a>>,
}

impl<'a> ReleaseScope<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: impl FnOnce() + 'a) {
        self.actions.push(Box::new(action));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run all pending actions now, newest first. The scope stays usable.
    pub fn release(&mut self) {
        if !self.actions.is_empty() {
            tracing::trace!(actions = self.actions.len(), "releasing scope");
        }
        // An action that panics leaves the older ones in place for drop.
        while let Some(action) = self.actions.pop() {
            action();
        }
    }
}

impl Drop for ReleaseScope<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ReleaseScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseScope")
            .field("pending", &self.actions.len())
            .finish()
    }
}
