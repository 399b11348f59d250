//! rc-containers: generic containers and owning handles that share one
//! contract set for fallible access and for release.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small family of value types that behave alike at the seams:
//!   absent results instead of sentinels, one sink for contract
//!   violations, and destruction that happens exactly once.
//! - Pieces:
//!   - `DynVec<T>` / `DynStr` / `View<'a, T>`: growable array, growable
//!     nul-terminated byte string, and a borrowed window over either.
//!   - `ProbeMap<K, V, S>`: open-addressed hash table with linear probing
//!     and tombstones; includes a debug-only reentrancy guard around the
//!     stretches that call `K: Hash/Eq`.
//!   - `Uniq<T>`, `Shared<T>`, `Weak<T>`: unique and reference-counted
//!     handles with optional custom destructors.
//!   - `Chan<T>` / `SyncChan<T>`: bounded FIFO channels, local and
//!     mutex-protected, behind one `Channel<T>` trait.
//!   - `Coro<Y>`: stackful coroutine yielding values of type `Y`.
//!   - `defer`: scope-exit actions; `dispatch`: uniform trait surface.
//!
//! Constraints
//! - Single-threaded except `SyncChan`. `Shared`/`Weak` counts are plain
//!   `Cell`s and the handles are `!Send`/`!Sync`; `Coro` stays on the
//!   thread that created it.
//! - Lookups, reads and receives on an empty or out-of-range target return
//!   `None`. Misuse (wrong-variant unwrap, null deref, illegal resume,
//!   allocation failure) goes to `failure::violation`, which never
//!   returns.
//!
//! Failure policy
//! - `failure::set_hook` picks what a violation does after it is logged:
//!   panic (default, so tests can observe it), abort, or a custom
//!   callback followed by a panic.
//! - Recoverable conditions are values: `SendError`, `TrySendError`,
//!   `text::ParseError`, `DynVec::set` handing back the rejected item.
//!
//! Growth
//! - `DynVec` and `DynStr` start at `config::DEFAULT_CAPACITY` on first
//!   push and double. `ProbeMap` allocates `MapConfig::initial_capacity`
//!   buckets on first insert and doubles while
//!   `(len + 1) * 100 > capacity * load_threshold`.
//!
//! Hasher and rehashing invariants
//! - Each occupied bucket stores its `u64` hash. Resizing reinserts by
//!   stored hash, so `K: Hash` never runs after insertion, and probing
//!   compares hashes before calling `K: Eq`.
//!
//! Reference counts
//! - A `Shared` control block keeps a strong count and a weak count; the
//!   strong handles collectively hold one weak reference. The payload is
//!   destroyed when the strong count hits zero, the block when the weak
//!   count does. Overflow aborts, as with `Rc`.

pub mod chan;
pub mod combinators;
pub mod config;
pub mod coro;
mod counts;
pub mod defer;
pub mod dispatch;
pub mod dyn_str;
pub mod dyn_vec;
pub mod failure;
pub mod fallible;
pub mod probe_map;
mod probe_map_proptest;
mod reentrancy;
pub mod shared;
pub mod text;
pub mod uniq;
pub mod view;

// Public surface
pub use chan::{Chan, Channel, SendError, SyncChan, TrySendError};
pub use config::{ChanConfig, MapConfig};
pub use coro::{Coro, CoroStatus, Suspend};
pub use defer::{defer, guard, Defer, ReleaseScope, ScopeGuard};
pub use dispatch::{Container, Sequence};
pub use dyn_str::DynStr;
pub use dyn_vec::DynVec;
pub use failure::{Violation, ViolationHook};
pub use fallible::{Opt, OptExt, Res, ResExt, Select};
pub use probe_map::{FnvBuildHasher, ProbeMap};
pub use shared::{Shared, Weak};
pub use uniq::Uniq;
pub use view::View;
