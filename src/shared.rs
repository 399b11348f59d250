//! Shared and Weak: reference-counted heap cell with a separate control
//! block.
//!
//! Control block lifecycle (S = strong, W = weak):
//! - `new` allocates the payload cell and the block at S=1, W=1. The live
//!   strong set collectively holds one unit of W, so W >= 1 while S >= 1.
//! - Cloning a `Shared` bumps S; downgrading bumps W.
//! - Dropping a `Shared` decrements S. At S=0 the destructor runs, the
//!   payload cell is freed, and the strong set's unit of W is returned.
//! - Dropping a `Weak` decrements W. The block itself is freed when W
//!   reaches 0, which can only happen after S has.
//!
//! Counts are non-atomic; both handles are `!Send` and `!Sync`.

use crate::counts::RefCount;
use crate::uniq::Destructor;
use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;
use core::ops::Deref;
use core::ptr::NonNull;

struct ControlBlock<T> {
    strong: RefCount,
    weak: RefCount,
    // Cleared when S reaches zero.
    payload: Cell<Option<NonNull<T>>>,
    dtor: Cell<Option<Destructor<T>>>,
}

pub struct Shared<T> {
    ptr: NonNull<T>,
    block: NonNull<ControlBlock<T>>,
    _owns: PhantomData<T>,
    _nosend: PhantomData<*mut ()>,
}

pub struct Weak<T> {
    // None for a detached handle that never had a block.
    block: Option<NonNull<ControlBlock<T>>>,
    _nosend: PhantomData<*mut ()>,
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self::from_parts(value, None)
    }

    /// Like `new`, with a release action run on the payload when the last
    /// strong handle goes away.
    pub fn with_destructor<F>(value: T, dtor: F) -> Self
    where
        F: FnOnce(&mut T) + 'static,
    {
        Self::from_parts(value, Some(Box::new(dtor)))
    }

    fn from_parts(value: T, dtor: Option<Destructor<T>>) -> Self {
        let ptr = NonNull::from(Box::leak(Box::new(value)));
        let block = Box::new(ControlBlock {
            strong: RefCount::new(1),
            weak: RefCount::new(1),
            payload: Cell::new(Some(ptr)),
            dtor: Cell::new(dtor),
        });
        Self {
            ptr,
            block: NonNull::from(Box::leak(block)),
            _owns: PhantomData,
            _nosend: PhantomData,
        }
    }

    #[inline]
    fn block(&self) -> &ControlBlock<T> {
        // SAFETY: a live Shared keeps S >= 1, hence W >= 1 and the block alive.
        unsafe { self.block.as_ref() }
    }

    #[inline]
    pub fn get(&self) -> &T {
        // SAFETY: the payload cell lives while S >= 1.
        unsafe { self.ptr.as_ref() }
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// New weak handle to the same block (W += 1).
    pub fn downgrade(&self) -> Weak<T> {
        self.block().weak.inc();
        Weak {
            block: Some(self.block),
            _nosend: PhantomData,
        }
    }

    /// Number of strong handles.
    pub fn strong_count(&self) -> usize {
        self.block().strong.get()
    }

    /// Raw W: weak handles plus the one unit held by the strong set.
    pub fn weak_count(&self) -> usize {
        self.block().weak.get()
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        a.block == b.block
    }

    /// Give up this strong reference now. Equivalent to dropping it.
    pub fn release(self) {
        drop(self)
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        self.block().strong.inc();
        Self {
            ptr: self.ptr,
            block: self.block,
            _owns: PhantomData,
            _nosend: PhantomData,
        }
    }
}

impl<T> Deref for Shared<T> {
    type Target = T;
    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        // SAFETY: this handle owns one unit of S.
        unsafe { release_strong(self.block) }
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("value", self.get())
            .field("strong", &self.strong_count())
            .field("weak", &self.weak_count())
            .finish()
    }
}

impl<T> Weak<T> {
    /// Detached handle: always expired, never allocates.
    pub const fn new() -> Self {
        Self {
            block: None,
            _nosend: PhantomData,
        }
    }

    #[inline]
    fn block(&self) -> Option<&ControlBlock<T>> {
        // SAFETY: this handle owns one unit of W, keeping the block alive.
        self.block.map(|b| unsafe { &*b.as_ptr() })
    }

    /// True when there is no block or S has reached zero.
    pub fn is_expired(&self) -> bool {
        self.strong_count() == 0
    }

    /// A new strong handle (S += 1), or `None` once expired.
    pub fn upgrade(&self) -> Option<Shared<T>> {
        let b = self.block()?;
        if b.strong.get() == 0 {
            return None;
        }
        let ptr = b.payload.get()?;
        b.strong.inc();
        Some(Shared {
            ptr,
            block: self.block?,
            _owns: PhantomData,
            _nosend: PhantomData,
        })
    }

    pub fn strong_count(&self) -> usize {
        self.block().map_or(0, |b| b.strong.get())
    }

    pub fn weak_count(&self) -> usize {
        self.block().map_or(0, |b| b.weak.get())
    }

    /// Give up this weak reference now. Equivalent to dropping it.
    pub fn release(self) {
        drop(self)
    }
}

impl<T> Default for Weak<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Weak<T> {
    fn clone(&self) -> Self {
        if let Some(b) = self.block() {
            b.weak.inc();
        }
        Self {
            block: self.block,
            _nosend: PhantomData,
        }
    }
}

impl<T> Drop for Weak<T> {
    fn drop(&mut self) {
        if let Some(block) = self.block.take() {
            // SAFETY: this handle owns one unit of W.
            unsafe { release_weak(block) }
        }
    }
}

impl<T> fmt::Debug for Weak<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Weak")
            .field("strong", &self.strong_count())
            .field("weak", &self.weak_count())
            .finish()
    }
}

/// Return one unit of S; at zero, destroy the payload and return the
/// strong set's unit of W.
///
/// # Safety
/// The caller must own one unit of S on a live block.
unsafe fn release_strong<T>(block: NonNull<ControlBlock<T>>) {
    let b = block.as_ref();
    if !b.strong.dec() {
        return;
    }
    // S is already zero: anything the payload's drop does through a Weak
    // sees an expired handle, and W cannot hit zero before we return our unit.
    let payload = b.payload.take();
    let dtor = b.dtor.take();
    if let Some(p) = payload {
        tracing::trace!(weak = b.weak.get(), "shared payload released");
        let mut cell = Box::from_raw(p.as_ptr());
        if let Some(d) = dtor {
            d(&mut *cell);
        }
        drop(cell);
    }
    release_weak(block);
}

/// Return one unit of W; free the block at zero.
///
/// # Safety
/// The caller must own one unit of W on a live block.
unsafe fn release_weak<T>(block: NonNull<ControlBlock<T>>) {
    let b = block.as_ref();
    if b.weak.dec() {
        debug_assert_eq!(b.strong.get(), 0, "block freed with live strong handles");
        drop(Box::from_raw(block.as_ptr()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// End-to-end: counts through clone/release, then an expired weak.
    #[test]
    fn shared_weak_scenario() {
        let s1 = Shared::new(50);
        assert_eq!(s1.strong_count(), 1);
        let s2 = s1.clone();
        assert_eq!(s1.strong_count(), 2);
        let s3 = s2.clone();
        assert_eq!(s1.strong_count(), 3);
        s3.release();
        assert_eq!(s1.strong_count(), 2);

        let w = s1.downgrade();
        assert_eq!(w.weak_count(), 2);
        assert_eq!(*w.upgrade().unwrap(), 50);

        s2.release();
        s1.release();
        assert!(w.is_expired());
        assert!(w.upgrade().is_none());
        assert_eq!(w.strong_count(), 0);
        assert_eq!(w.weak_count(), 1);
    }

    /// Invariant: destructor runs exactly once, at the 1 -> 0 strong
    /// transition, even with weak handles still around.
    #[test]
    fn destructor_runs_once_on_last_strong() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        let a = Shared::with_destructor(String::from("payload"), move |s: &mut String| {
            l.borrow_mut().push(s.clone())
        });
        let b = a.clone();
        let w = a.downgrade();
        drop(a);
        assert!(log.borrow().is_empty());
        drop(b);
        assert_eq!(*log.borrow(), vec!["payload".to_string()]);
        assert!(w.is_expired());
        drop(w);
        assert_eq!(log.borrow().len(), 1);
    }

    /// Invariant: upgrade of a live weak yields a handle and bumps S.
    #[test]
    fn upgrade_increments_strong() {
        let s = Shared::new(vec![1, 2, 3]);
        let w = s.downgrade();
        let u = w.upgrade().expect("live");
        assert!(Shared::ptr_eq(&s, &u));
        assert_eq!(s.strong_count(), 2);
        drop(u);
        assert_eq!(s.strong_count(), 1);
    }

    #[test]
    fn detached_weak_is_expired() {
        let w: Weak<u8> = Weak::new();
        assert!(w.is_expired());
        assert!(w.upgrade().is_none());
        let w2 = w.clone();
        assert_eq!(w2.weak_count(), 0);
    }

    /// A payload holding a weak reference to its own block must not free
    /// the block from inside its drop.
    #[test]
    fn self_referential_weak_cycle() {
        struct Node {
            me: RefCell<Weak<Node>>,
        }
        let n = Shared::new(Node {
            me: RefCell::new(Weak::new()),
        });
        *n.me.borrow_mut() = n.downgrade();
        assert_eq!(n.weak_count(), 2);
        let outside = n.downgrade();
        drop(n);
        assert!(outside.is_expired());
        assert_eq!(outside.weak_count(), 1);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Clone,
        Release,
        Downgrade,
        DropWeak,
        Upgrade,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Clone),
            Just(Op::Release),
            Just(Op::Downgrade),
            Just(Op::DropWeak),
            Just(Op::Upgrade),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

        // Property: counts follow the transition table and the destructor
        // runs exactly once, when the last strong handle goes.
        #[test]
        fn prop_refcount_arithmetic(ops in proptest::collection::vec(arb_op(), 1..64)) {
            let runs = Rc::new(RefCell::new(0usize));
            let r = runs.clone();
            let mut strong = vec![Shared::with_destructor(7u32, move |_| *r.borrow_mut() += 1)];
            let mut weak: Vec<Weak<u32>> = Vec::new();
            let mut ever_expired = false;

            for op in ops {
                match op {
                    Op::Clone => {
                        if let Some(s) = strong.last() {
                            let c = s.clone();
                            strong.push(c);
                        }
                    }
                    Op::Release => {
                        if let Some(s) = strong.pop() {
                            s.release();
                        }
                    }
                    Op::Downgrade => {
                        if let Some(s) = strong.last() {
                            weak.push(s.downgrade());
                        }
                    }
                    Op::DropWeak => {
                        if let Some(w) = weak.pop() {
                            w.release();
                        }
                    }
                    Op::Upgrade => {
                        if let Some(w) = weak.last() {
                            match w.upgrade() {
                                Some(s) => {
                                    prop_assert!(!ever_expired);
                                    strong.push(s);
                                }
                                None => prop_assert!(ever_expired),
                            }
                        }
                    }
                }
                if strong.is_empty() {
                    ever_expired = true;
                }
                if let Some(s) = strong.first() {
                    prop_assert_eq!(s.strong_count(), strong.len());
                    prop_assert_eq!(s.weak_count(), weak.len() + 1);
                }
                if let Some(w) = weak.first() {
                    prop_assert_eq!(w.strong_count(), strong.len());
                    prop_assert_eq!(w.is_expired(), strong.is_empty());
                    let unit = usize::from(!strong.is_empty());
                    prop_assert_eq!(w.weak_count(), weak.len() + unit);
                }
                prop_assert_eq!(*runs.borrow(), usize::from(ever_expired));
            }
            drop(strong);
            drop(weak);
            prop_assert_eq!(*runs.borrow(), 1);
        }
    }
}
