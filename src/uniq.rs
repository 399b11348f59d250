//! Uniq: exclusive-ownership heap cell with an optional destructor.
//!
//! Moving ownership out with [`Uniq::take`] leaves the source null; a null
//! handle frees as a no-op and dereferences as a contract violation.

use crate::failure::violation;
use core::fmt;
use core::ops::{Deref, DerefMut};

/// Release action run on the payload just before its cell is freed.
pub type Destructor<T> = Box<dyn FnOnce(&mut T)>;

pub struct Uniq<T> {
    cell: Option<Box<T>>,
    dtor: Option<Destructor<T>>,
}

impl<T> Uniq<T> {
    pub fn new(value: T) -> Self {
        Self {
            cell: Some(Box::new(value)),
            dtor: None,
        }
    }

    pub fn with_destructor<F>(value: T, dtor: F) -> Self
    where
        F: FnOnce(&mut T) + 'static,
    {
        Self {
            cell: Some(Box::new(value)),
            dtor: Some(Box::new(dtor)),
        }
    }

    pub const fn null() -> Self {
        Self {
            cell: None,
            dtor: None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.cell.is_none()
    }

    /// Borrow the payload without affecting ownership.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        self.cell.as_deref()
    }

    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.cell.as_deref_mut()
    }

    /// Interior address, null for a null handle.
    pub fn as_ptr(&self) -> *const T {
        match &self.cell {
            Some(b) => &**b as *const T,
            None => core::ptr::null(),
        }
    }

    /// Transfer the cell and destructor into a new handle; `self` becomes null.
    #[must_use]
    pub fn take(&mut self) -> Uniq<T> {
        Uniq {
            cell: self.cell.take(),
            dtor: self.dtor.take(),
        }
    }

    /// Run the destructor (if any), then free the cell. A null handle is a
    /// no-op, so freeing twice is harmless.
    pub fn free(&mut self) {
        let dtor = self.dtor.take();
        if let Some(mut cell) = self.cell.take() {
            if let Some(d) = dtor {
                d(&mut *cell);
            }
        }
    }

    /// Move the payload out. The destructor is discarded without running.
    pub fn into_inner(mut self) -> Option<T> {
        self.dtor = None;
        self.cell.take().map(|b| *b)
    }
}

impl<T> Default for Uniq<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> Deref for Uniq<T> {
    type Target = T;

    #[track_caller]
    fn deref(&self) -> &T {
        match &self.cell {
            Some(b) => b,
            None => violation("dereference of null Uniq"),
        }
    }
}

impl<T> DerefMut for Uniq<T> {
    #[track_caller]
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.cell {
            Some(b) => b,
            None => violation("dereference of null Uniq"),
        }
    }
}

impl<T> Drop for Uniq<T> {
    fn drop(&mut self) {
        self.free();
    }
}

impl<T: fmt::Debug> fmt::Debug for Uniq<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cell {
            Some(b) => f.debug_tuple("Uniq").field(&**b).finish(),
            None => f.write_str("Uniq(null)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Invariant: the destructor sees the live payload and runs exactly once.
    #[test]
    fn destructor_runs_once_before_release() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        let mut u = Uniq::with_destructor(41, move |v: &mut i32| l.borrow_mut().push(*v + 1));
        assert_eq!(*u, 41);
        u.free();
        assert!(u.is_null());
        u.free();
        drop(u);
        assert_eq!(*log.borrow(), vec![42]);
    }

    /// Invariant: moving nulls the source and carries the destructor along.
    #[test]
    fn take_nulls_source() {
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let mut a = Uniq::with_destructor(String::from("x"), move |_| *h.borrow_mut() += 1);
        let p = a.as_ptr();
        let b = a.take();
        assert!(a.is_null());
        assert!(a.as_ptr().is_null());
        assert_eq!(b.as_ptr(), p);
        assert_eq!(b.get().map(String::as_str), Some("x"));
        drop(a);
        assert_eq!(*hits.borrow(), 0);
        drop(b);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn into_inner_skips_destructor() {
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let u = Uniq::with_destructor(vec![1, 2], move |_| *h.borrow_mut() += 1);
        assert_eq!(u.into_inner(), Some(vec![1, 2]));
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn deref_mut_updates_payload() {
        let mut u = Uniq::new(1);
        *u += 4;
        assert_eq!(u.get(), Some(&5));
        assert_eq!(format!("{u:?}"), "Uniq(5)");
        assert_eq!(format!("{:?}", Uniq::<u8>::null()), "Uniq(null)");
    }

    #[test]
    #[should_panic(expected = "dereference of null Uniq")]
    fn null_deref_is_violation() {
        let u: Uniq<u32> = Uniq::null();
        let _v: u32 = *u;
    }
}
