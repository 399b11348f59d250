//! View: a length-carrying read-only window into storage owned elsewhere.
//!
//! The borrow ties the view to its provider, so the "region stays valid
//! and structurally unchanged" rule is checked by the compiler.

use crate::dyn_vec::DynVec;
use core::fmt;

#[derive(PartialEq, Eq, Hash)]
pub struct View<'a, T> {
    items: &'a [T],
}

impl<T> Clone for View<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for View<'_, T> {}

impl<'a, T> View<'a, T> {
    #[inline]
    pub const fn from_slice(items: &'a [T]) -> Self {
        Self { items }
    }

    #[inline]
    pub fn from_vec(v: &'a DynVec<T>) -> Self {
        Self::from_slice(v.as_slice())
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<&'a T> {
        self.items.get(i)
    }

    #[inline]
    pub fn first(&self) -> Option<&'a T> {
        self.items.first()
    }

    #[inline]
    pub fn last(&self) -> Option<&'a T> {
        self.items.last()
    }

    /// Window `[start, end)` after clamping: `end` to `len`, then `start`
    /// to `end`. An empty interval yields an empty view.
    pub fn subview(&self, start: usize, end: usize) -> View<'a, T> {
        let end = end.min(self.items.len());
        let start = start.min(end);
        View::from_slice(&self.items[start..end])
    }

    #[inline]
    pub const fn as_slice(&self) -> &'a [T] {
        self.items
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'a, T> {
        self.items.iter()
    }
}

impl<T> Default for View<'_, T> {
    fn default() -> Self {
        Self { items: &[] }
    }
}

impl<'a, T> From<&'a [T]> for View<'a, T> {
    fn from(items: &'a [T]) -> Self {
        Self::from_slice(items)
    }
}

impl<'a, T> From<&'a DynVec<T>> for View<'a, T> {
    fn from(v: &'a DynVec<T>) -> Self {
        Self::from_vec(v)
    }
}

impl<'a, T> IntoIterator for View<'a, T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for View<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}
