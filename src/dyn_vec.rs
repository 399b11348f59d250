//! DynVec: owning growable array with a fixed geometric growth policy.
//!
//! The backing `Vec` only ever grows through `reserve_exact`, so the
//! capacity the container reports is the one the policy chose: empty until
//! the first push, then `DEFAULT_CAPACITY`, then multiplied by
//! `GROWTH_FACTOR`. Capacity never shrinks except through `free`.

use crate::config::grown_capacity;
use crate::failure::violation;
use crate::view::View;
use core::fmt;

pub struct DynVec<T> {
    buf: Vec<T>,
    // Logical capacity; the allocator may hand out more.
    cap: usize,
}

impl<T> DynVec<T> {
    /// Empty, unallocated.
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            cap: 0,
        }
    }

    #[track_caller]
    pub fn with_capacity(cap: usize) -> Self {
        let mut v = Self::new();
        if cap > 0 {
            v.reserve_to(cap);
        }
        v
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Append `v`, growing the buffer first when it is full.
    #[track_caller]
    pub fn push(&mut self, v: T) {
        if self.buf.len() == self.cap {
            self.grow_for(self.buf.len() + 1);
        }
        self.buf.push(v);
    }

    /// Remove and return the last element. Never shrinks the buffer.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.buf.pop()
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<&T> {
        self.buf.get(i)
    }

    #[inline]
    pub fn get_mut(&mut self, i: usize) -> Option<&mut T> {
        self.buf.get_mut(i)
    }

    /// Overwrite slot `i`, returning the old element. Out of bounds hands
    /// `v` back unchanged.
    pub fn set(&mut self, i: usize, v: T) -> Result<T, T> {
        match self.buf.get_mut(i) {
            Some(slot) => Ok(core::mem::replace(slot, v)),
            None => Err(v),
        }
    }

    /// Drop all elements; keeps the buffer.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Drop all elements and release the buffer.
    pub fn free(&mut self) {
        self.buf = Vec::new();
        self.cap = 0;
    }

    /// Make room for `additional` more elements under the growth policy.
    #[track_caller]
    pub fn reserve(&mut self, additional: usize) {
        let needed = match self.buf.len().checked_add(additional) {
            Some(n) => n,
            None => violation("capacity overflow"),
        };
        if needed > self.cap {
            self.grow_for(needed);
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.buf
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.buf
    }

    #[inline]
    pub fn as_view(&self) -> View<'_, T> {
        View::from_slice(&self.buf)
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.buf.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, T> {
        self.buf.iter_mut()
    }

    #[track_caller]
    fn grow_for(&mut self, needed: usize) {
        let cap = grown_capacity(self.cap, needed);
        self.reserve_to(cap);
    }

    #[track_caller]
    fn reserve_to(&mut self, cap: usize) {
        debug_assert!(cap >= self.buf.len());
        if self.buf.try_reserve_exact(cap - self.buf.len()).is_err() {
            violation(format!("allocation failure growing to {cap} elements"));
        }
        self.cap = cap;
    }
}

impl<T: Clone> DynVec<T> {
    #[track_caller]
    pub fn extend_from_slice(&mut self, items: &[T]) {
        self.reserve(items.len());
        self.buf.extend_from_slice(items);
    }
}

impl<T> Default for DynVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for DynVec<T> {
    fn clone(&self) -> Self {
        let mut v = Self::with_capacity(self.cap);
        v.buf.extend_from_slice(&self.buf);
        v
    }
}

impl<T: fmt::Debug> fmt::Debug for DynVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.buf.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for DynVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.buf == other.buf
    }
}

impl<T: Eq> Eq for DynVec<T> {}

impl<T> Extend<T> for DynVec<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.push(v);
        }
    }
}

impl<T> FromIterator<T> for DynVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut v = Self::new();
        v.extend(iter);
        v
    }
}

impl<T> IntoIterator for DynVec<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.buf.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a DynVec<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.buf.iter()
    }
}
