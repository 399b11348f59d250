//! Stackful, single-threaded coroutines with value yielding.
//!
//! A [`Coro`] owns its own stack (allocated through `corosensei`) and runs
//! its entry closure on it. The caller drives it with [`Coro::resume`]; the
//! body hands control back with [`Suspend::yield_now`] or
//! [`Suspend::yield_value`]. Yielded values are moved into the handle and
//! read with [`Coro::get_yield`] / [`Coro::take_yield`].
//!
//! State machine:
//! `Created -> Running -> Suspended -> Running -> ... -> Finished`.
//! Resuming a `Finished` or `Running` coroutine is a contract violation.
//!
//! The handle is `!Send`: the stack and saved contexts stay on the thread
//! that created them.

use crate::config::CORO_STACK_SIZE;
use crate::defer::{guard, ScopeGuard};
use crate::failure::violation;
use core::fmt;
use corosensei::stack::DefaultStack;
use corosensei::{Coroutine, CoroutineResult, Yielder};

/// Lifecycle of a [`Coro`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CoroStatus {
    Created,
    Running,
    Suspended,
    Finished,
}

type Body<Y> = Coroutine<(), Option<Y>, ()>;

/// Handle passed to the coroutine body; the only way to suspend.
pub struct Suspend<'a, Y> {
    yielder: &'a Yielder<(), Option<Y>>,
}

impl<Y> Suspend<'_, Y> {
    /// Suspend without producing a value.
    pub fn yield_now(&self) {
        self.yielder.suspend(None);
    }

    /// Suspend and make `v` visible to the caller until the next resume.
    pub fn yield_value(&self, v: Y) {
        self.yielder.suspend(Some(v));
    }
}

/// A stackful coroutine yielding values of type `Y`.
pub struct Coro<Y: 'static> {
    body: Option<Body<Y>>,
    status: CoroStatus,
    last: Option<Y>,
}

impl<Y: 'static> Coro<Y> {
    /// Coroutine with the default stack size.
    #[track_caller]
    pub fn new<F>(entry: F) -> Self
    where
        F: FnOnce(&Suspend<'_, Y>) + 'static,
    {
        Self::with_stack_size(CORO_STACK_SIZE, entry)
    }

    /// Coroutine with an explicit stack size in bytes; `0` selects the
    /// default. The entry does not run until the first `resume`.
    #[track_caller]
    pub fn with_stack_size<F>(stack_size: usize, entry: F) -> Self
    where
        F: FnOnce(&Suspend<'_, Y>) + 'static,
    {
        let size = if stack_size == 0 {
            CORO_STACK_SIZE
        } else {
            stack_size
        };
        let stack = match DefaultStack::new(size) {
            Ok(s) => s,
            Err(e) => violation(format!("coroutine stack allocation of {size} bytes failed: {e}")),
        };
        let body = Coroutine::with_stack(stack, move |yielder: &Yielder<(), Option<Y>>, ()| {
            entry(&Suspend { yielder });
        });
        tracing::trace!(stack_size = size, "coroutine created");
        Self {
            body: Some(body),
            status: CoroStatus::Created,
            last: None,
        }
    }
}

impl<Y: 'static> Coro<Y> {
    /// Switch into the coroutine. Returns `true` if it yielded and `false`
    /// if the entry returned.
    #[track_caller]
    pub fn resume(&mut self) -> bool {
        match self.status {
            CoroStatus::Finished => violation("resume of a finished coroutine"),
            CoroStatus::Running => violation("resume of a running coroutine"),
            CoroStatus::Created | CoroStatus::Suspended => {}
        }
        let Some(body) = self.body.as_mut() else {
            violation("resume of a freed coroutine")
        };
        self.status = CoroStatus::Running;
        // A body that panics out of resume never runs again.
        let on_unwind = guard(&mut self.status, |s| *s = CoroStatus::Finished);
        let result = body.resume(());
        let status = ScopeGuard::into_inner(on_unwind);
        match result {
            CoroutineResult::Yield(v) => {
                self.last = v;
                *status = CoroStatus::Suspended;
                true
            }
            CoroutineResult::Return(()) => {
                *status = CoroStatus::Finished;
                tracing::trace!("coroutine finished");
                false
            }
        }
    }

    /// Most recently yielded value. `None` after a valueless yield.
    pub fn get_yield(&self) -> Option<&Y> {
        self.last.as_ref()
    }

    pub fn take_yield(&mut self) -> Option<Y> {
        self.last.take()
    }

    pub fn status(&self) -> CoroStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status == CoroStatus::Finished
    }

    /// Release the stack. A suspended body is unwound so its locals drop.
    pub fn free(&mut self) {
        if self.body.take().is_some() {
            tracing::trace!(status = ?self.status, "coroutine freed");
        }
        self.last = None;
        self.status = CoroStatus::Finished;
    }
}

/// Generator view: each value-carrying yield becomes an item; valueless
/// yields are skipped.
impl<Y: 'static> Iterator for Coro<Y> {
    type Item = Y;

    fn next(&mut self) -> Option<Y> {
        while !self.is_finished() {
            if !self.resume() {
                return None;
            }
            if let Some(v) = self.last.take() {
                return Some(v);
            }
        }
        None
    }
}

impl<Y: fmt::Debug + 'static> fmt::Debug for Coro<Y> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coro")
            .field("status", &self.status)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Generator yields 0,10,..,40 then finishes on the sixth resume.
    #[test]
    fn generator_scenario() {
        let mut c = Coro::new(|s: &Suspend<'_, i32>| {
            for i in 0..5 {
                s.yield_value(i * 10);
            }
        });
        assert_eq!(c.status(), CoroStatus::Created);
        for i in 0..5 {
            assert!(c.resume());
            assert_eq!(c.status(), CoroStatus::Suspended);
            assert_eq!(c.get_yield(), Some(&(i * 10)));
        }
        assert!(!c.resume());
        assert!(c.is_finished());
    }

    /// Entry does not run before the first resume; captured state is the
    /// user argument.
    #[test]
    fn lazy_start_and_captured_argument() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l2 = Rc::clone(&log);
        let mut c = Coro::<()>::with_stack_size(0, move |s| {
            l2.borrow_mut().push("start");
            s.yield_now();
            l2.borrow_mut().push("end");
        });
        assert!(log.borrow().is_empty());
        assert!(c.resume());
        assert_eq!(c.get_yield(), None);
        assert_eq!(*log.borrow(), vec!["start"]);
        assert!(!c.resume());
        assert_eq!(*log.borrow(), vec!["start", "end"]);
    }

    #[test]
    #[should_panic(expected = "resume of a finished coroutine")]
    fn resume_after_finish_is_violation() {
        let mut c = Coro::<u8>::new(|_| {});
        assert!(!c.resume());
        c.resume();
    }

    /// A body that panics counts as finished; a later resume reports
    /// the finished state.
    #[test]
    fn panicking_body_finishes() {
        let mut c = Coro::<u8>::new(|s| {
            s.yield_value(1);
            panic!("body failed");
        });
        assert!(c.resume());
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| c.resume()));
        assert!(res.is_err());
        assert_eq!(c.status(), CoroStatus::Finished);
        assert!(c.is_finished());
        let again = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| c.resume()));
        let msg = again
            .unwrap_err()
            .downcast::<String>()
            .map(|m| *m)
            .unwrap_or_default();
        assert!(msg.contains("resume of a finished coroutine"), "{msg}");
    }

    #[test]
    fn iterator_skips_valueless_yields() {
        let c = Coro::new(|s: &Suspend<'_, String>| {
            s.yield_value("a".to_string());
            s.yield_now();
            s.yield_value("b".to_string());
        });
        assert_eq!(c.collect::<Vec<_>>(), vec!["a", "b"]);
    }

    /// Freeing a suspended coroutine unwinds its stack and drops its locals.
    #[test]
    fn free_unwinds_suspended_body() {
        let dropped = Rc::new(Cell::new(false));
        struct Flag(Rc<Cell<bool>>);
        impl Drop for Flag {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }
        let d = Rc::clone(&dropped);
        let mut c = Coro::<u8>::new(move |s| {
            let _f = Flag(d);
            s.yield_value(1);
        });
        assert!(c.resume());
        assert!(!dropped.get());
        c.free();
        assert!(dropped.get());
        assert!(c.is_finished());
        assert_eq!(c.get_yield(), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

        // Property: every resume observes the argument of the latest
        // yield_value; finished flips exactly once, after the entry returns.
        #[test]
        fn prop_resume_yield_symmetry(values in proptest::collection::vec(any::<i64>(), 0..24)) {
            let expected = values.clone();
            let mut c = Coro::new(move |s: &Suspend<'_, i64>| {
                for v in values {
                    s.yield_value(v);
                }
            });
            for v in &expected {
                prop_assert!(!c.is_finished());
                prop_assert!(c.resume());
                prop_assert_eq!(c.get_yield(), Some(v));
            }
            prop_assert!(!c.is_finished());
            prop_assert!(!c.resume());
            prop_assert!(c.is_finished());
        }
    }
}
