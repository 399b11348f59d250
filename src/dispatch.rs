//! Uniform call surface over the containers.
//!
//! Every container's operations are inherent methods, and `Type::method(&x)`
//! is already the free-function spelling of `x.method()`. The traits here
//! add the shared record: a `&dyn Container` carries a vtable pointer that
//! is the same for every instance of a type, and `ops` offers free
//! functions that go through the trait. All three spellings reach the same
//! inherent method.

use crate::chan::{Chan, Channel, Ring, SyncChan};
use crate::dyn_str::DynStr;
use crate::dyn_vec::DynVec;
use crate::probe_map::ProbeMap;
use crate::view::View;
use core::hash::{BuildHasher, Hash};

/// Size observers shared by every container.
pub trait Container {
    fn len(&self) -> usize;
    fn capacity(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Growable LIFO sequences.
pub trait Sequence: Container {
    type Item;

    fn push(&mut self, v: Self::Item);
    fn pop(&mut self) -> Option<Self::Item>;
    fn clear(&mut self);
}

impl<T> Container for DynVec<T> {
    fn len(&self) -> usize {
        DynVec::len(self)
    }

    fn capacity(&self) -> usize {
        DynVec::capacity(self)
    }
}

impl<T> Sequence for DynVec<T> {
    type Item = T;

    fn push(&mut self, v: T) {
        DynVec::push(self, v)
    }

    fn pop(&mut self) -> Option<T> {
        DynVec::pop(self)
    }

    fn clear(&mut self) {
        DynVec::clear(self)
    }
}

impl Container for DynStr {
    fn len(&self) -> usize {
        DynStr::len(self)
    }

    fn capacity(&self) -> usize {
        DynStr::capacity(self)
    }
}

impl Sequence for DynStr {
    type Item = u8;

    fn push(&mut self, v: u8) {
        DynStr::push(self, v)
    }

    fn pop(&mut self) -> Option<u8> {
        DynStr::pop(self)
    }

    fn clear(&mut self) {
        DynStr::clear(self)
    }
}

/// A view's capacity is its length: it never grows.
impl<T> Container for View<'_, T> {
    fn len(&self) -> usize {
        View::len(self)
    }

    fn capacity(&self) -> usize {
        View::len(self)
    }
}

impl<K, V, S> Container for ProbeMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn len(&self) -> usize {
        ProbeMap::len(self)
    }

    fn capacity(&self) -> usize {
        ProbeMap::capacity(self)
    }
}

impl<T> Container for Ring<T> {
    fn len(&self) -> usize {
        Ring::len(self)
    }

    fn capacity(&self) -> usize {
        Ring::capacity(self)
    }
}

impl<T> Container for Chan<T> {
    fn len(&self) -> usize {
        Channel::len(self)
    }

    fn capacity(&self) -> usize {
        Channel::capacity(self)
    }
}

impl<T> Container for SyncChan<T> {
    fn len(&self) -> usize {
        Channel::len(self)
    }

    fn capacity(&self) -> usize {
        Channel::capacity(self)
    }
}

/// Free-function spellings.
pub mod ops {
    use super::{Container, Sequence};

    pub fn len<C: Container + ?Sized>(c: &C) -> usize {
        c.len()
    }

    pub fn is_empty<C: Container + ?Sized>(c: &C) -> bool {
        c.is_empty()
    }

    pub fn capacity<C: Container + ?Sized>(c: &C) -> usize {
        c.capacity()
    }

    pub fn push<S: Sequence + ?Sized>(s: &mut S, v: S::Item) {
        s.push(v)
    }

    pub fn pop<S: Sequence + ?Sized>(s: &mut S) -> Option<S::Item> {
        s.pop()
    }

    pub fn clear<S: Sequence + ?Sized>(s: &mut S) {
        s.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Clone, Debug)]
    enum Op {
        Push(i32),
        Pop,
        Clear,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => any::<i32>().prop_map(Op::Push),
            2 => Just(Op::Pop),
            1 => Just(Op::Clear),
        ]
    }

    /// Every container is reachable through one trait object type.
    #[test]
    fn heterogeneous_records() {
        let mut v: DynVec<u8> = DynVec::new();
        v.push(1);
        let s = DynStr::from("abc");
        let mut m: ProbeMap<&str, i32> = ProbeMap::new();
        m.insert("k", 1);
        let c: Chan<u8> = Chan::new(3);
        let all: [&dyn Container; 4] = [&v, &s, &m, &c];
        let lens: Vec<usize> = all.iter().map(|c| ops::len(*c)).collect();
        assert_eq!(lens, vec![1, 3, 1, 0]);
        assert_eq!(ops::capacity(&c), 3);
        assert!(ops::is_empty(&View::<u8>::default()));
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

        // Property: inherent methods, the trait-object record and the free
        // functions leave identical containers and return identical values.
        #[test]
        fn prop_call_styles_agree(ops_seq in proptest::collection::vec(op_strategy(), 0..64)) {
            let mut direct: DynVec<i32> = DynVec::new();
            let mut via_record: DynVec<i32> = DynVec::new();
            let mut via_free: DynVec<i32> = DynVec::new();
            for op in ops_seq {
                let record: &mut dyn Sequence<Item = i32> = &mut via_record;
                match op {
                    Op::Push(x) => {
                        direct.push(x);
                        record.push(x);
                        ops::push(&mut via_free, x);
                    }
                    Op::Pop => {
                        let a = direct.pop();
                        let b = record.pop();
                        let c = ops::pop(&mut via_free);
                        prop_assert_eq!(a, b);
                        prop_assert_eq!(a, c);
                    }
                    Op::Clear => {
                        direct.clear();
                        record.clear();
                        ops::clear(&mut via_free);
                    }
                }
                prop_assert_eq!(direct.as_slice(), via_record.as_slice());
                prop_assert_eq!(direct.as_slice(), via_free.as_slice());
                prop_assert_eq!(direct.capacity(), ops::capacity(&via_record));
                prop_assert_eq!(direct.capacity(), via_free.capacity());
            }
        }

        #[test]
        fn prop_str_call_styles_agree(bytes in proptest::collection::vec(1u8..=255, 0..48), pops in 0usize..8) {
            let mut direct = DynStr::new();
            let mut via_free = DynStr::new();
            for &b in &bytes {
                direct.push(b);
                ops::push(&mut via_free, b);
            }
            for _ in 0..pops {
                prop_assert_eq!(direct.pop(), ops::pop(&mut via_free));
            }
            prop_assert_eq!(&direct, &via_free);
            prop_assert_eq!(direct.cstr(), via_free.cstr());
        }
    }
}
