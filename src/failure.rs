//! Failure protocol: the single sink for contract violations.
//!
//! Every precondition the library cannot express in its types (unwrapping
//! the wrong variant, dereferencing a null handle, resuming a finished
//! coroutine, building a zero-capacity channel) ends up in [`violation`].
//! The call never returns. What happens before the thread goes down is
//! chosen by the process-wide [`ViolationHook`].

use core::fmt;
use core::panic::Location;
use std::sync::{PoisonError, RwLock};

/// A contract violation: what was broken and where the caller broke it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    message: String,
    site: &'static Location<'static>,
}

impl Violation {
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Source location of the offending call (the first caller outside the
    /// library's `#[track_caller]` chain).
    pub fn site(&self) -> &'static Location<'static> {
        self.site
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "contract violation at {}: {}", self.site, self.message)
    }
}

/// Action taken on a contract violation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViolationHook {
    /// Panic with the rendered diagnostic. The panic runtime prints it to
    /// stderr and unwinds (or aborts under `panic = "abort"`).
    #[default]
    Panic,
    /// Print the diagnostic to stderr and abort the process immediately.
    Abort,
    /// Run a user function first; if it returns, panic as for `Panic`.
    Custom(fn(&Violation)),
}

static HOOK: RwLock<ViolationHook> = RwLock::new(ViolationHook::Panic);

/// Install `hook` as the process-wide violation action.
pub fn set_hook(hook: ViolationHook) {
    *HOOK.write().unwrap_or_else(PoisonError::into_inner) = hook;
}

/// Reset the hook to [`ViolationHook::Panic`] and return the previous one.
pub fn take_hook() -> ViolationHook {
    let mut slot = HOOK.write().unwrap_or_else(PoisonError::into_inner);
    core::mem::take(&mut *slot)
}

/// Report a contract violation at the caller's location. Never returns.
#[cold]
#[track_caller]
pub fn violation(message: impl Into<String>) -> ! {
    raise(Violation {
        message: message.into(),
        site: Location::caller(),
    })
}

fn raise(v: Violation) -> ! {
    tracing::error!(site = %v.site, message = %v.message, "contract violation");
    // Copy the hook out so a custom hook may itself call set_hook.
    let hook = *HOOK.read().unwrap_or_else(PoisonError::into_inner);
    match hook {
        ViolationHook::Panic => {}
        ViolationHook::Abort => {
            eprintln!("{v}");
            std::process::abort();
        }
        ViolationHook::Custom(f) => f(&v),
    }
    panic!("{v}")
}
