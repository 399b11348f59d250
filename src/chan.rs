//! Bounded FIFO channels with close-then-drain semantics.
//!
//! [`Ring`] is the shared core: a fixed circular buffer with head, tail,
//! count and a closed flag. Two front ends wrap it:
//! - [`Chan`]: single-threaded, `RefCell` interior. Nothing can run while
//!   a call would wait, so a blocking call that would wait is a contract
//!   violation instead of a deadlock.
//! - [`SyncChan`]: `Mutex` plus two condition variables ("space
//!   available", "item available"). Safe for any number of producers and
//!   consumers; blocking calls sleep until a peer or `close` wakes them.
//!
//! Ordering: successful sends are received in order. After `close`,
//! receivers drain what is buffered and then see `None` forever; every
//! send fails with `Closed`.
//!
//! Capacity zero (rendezvous) is not supported and is rejected at
//! construction.

use crate::failure::violation;
use core::cell::RefCell;
use core::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Blocking send failure. The value is handed back.
#[derive(Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendError<T> {
    #[error("sending on a closed channel")]
    Closed(T),
}

/// Non-blocking send failure. The value is handed back.
#[derive(Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TrySendError<T> {
    #[error("sending on a closed channel")]
    Closed(T),
    #[error("channel is full")]
    WouldBlock(T),
}

impl<T> SendError<T> {
    pub fn into_inner(self) -> T {
        match self {
            SendError::Closed(v) => v,
        }
    }
}

impl<T> TrySendError<T> {
    pub fn into_inner(self) -> T {
        match self {
            TrySendError::Closed(v) | TrySendError::WouldBlock(v) => v,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, TrySendError::Closed(_))
    }
}

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Closed(..)")
    }
}

impl<T> fmt::Debug for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::Closed(_) => f.write_str("Closed(..)"),
            TrySendError::WouldBlock(_) => f.write_str("WouldBlock(..)"),
        }
    }
}

/// Fixed-capacity circular buffer with a closed flag.
pub struct Ring<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    tail: usize,
    count: usize,
    closed: bool,
}

impl<T> Ring<T> {
    #[track_caller]
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            violation("channel capacity must be non-zero");
        }
        let mut slots = Vec::new();
        if slots.try_reserve_exact(capacity).is_err() {
            violation(format!("allocation failure for {capacity} channel slots"));
        }
        slots.resize_with(capacity, || None);
        Self {
            slots: slots.into_boxed_slice(),
            head: 0,
            tail: 0,
            count: 0,
            closed: false,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.slots.len()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Enqueue at the tail unless closed or full.
    pub fn try_push(&mut self, v: T) -> Result<(), TrySendError<T>> {
        if self.closed {
            return Err(TrySendError::Closed(v));
        }
        if self.is_full() {
            return Err(TrySendError::WouldBlock(v));
        }
        self.slots[self.tail] = Some(v);
        self.tail = (self.tail + 1) % self.slots.len();
        self.count += 1;
        Ok(())
    }

    /// Dequeue from the head. Closing does not stop draining.
    pub fn try_pop(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        let v = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.count -= 1;
        v
    }

    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl<T> fmt::Debug for Ring<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ring")
            .field("capacity", &self.slots.len())
            .field("count", &self.count)
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("closed", &self.closed)
            .finish()
    }
}

/// Operations shared by both channel flavours.
pub trait Channel<T> {
    /// Enqueue, waiting while full. Fails only once the channel is closed.
    fn send(&self, v: T) -> Result<(), SendError<T>>;
    /// Enqueue without waiting.
    fn try_send(&self, v: T) -> Result<(), TrySendError<T>>;
    /// Dequeue, waiting while empty and open. `None` once closed and drained.
    fn recv(&self) -> Option<T>;
    /// Dequeue without waiting.
    fn try_recv(&self) -> Option<T>;
    /// One-way transition to closed; wakes every waiter.
    fn close(&self);
    fn is_closed(&self) -> bool;
    fn len(&self) -> usize;
    fn capacity(&self) -> usize;
    fn is_thread_safe(&self) -> bool;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }
}

/// Single-threaded channel.
pub struct Chan<T> {
    ring: RefCell<Ring<T>>,
}

impl<T> Chan<T> {
    #[track_caller]
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: RefCell::new(Ring::new(capacity)),
        }
    }
}

impl<T> Channel<T> for Chan<T> {
    /// Violation if the buffer is full: no other party can drain it.
    #[track_caller]
    fn send(&self, v: T) -> Result<(), SendError<T>> {
        match self.ring.borrow_mut().try_push(v) {
            Ok(()) => Ok(()),
            Err(TrySendError::Closed(v)) => Err(SendError::Closed(v)),
            Err(TrySendError::WouldBlock(_)) => {
                violation("blocking send on a full single-threaded channel")
            }
        }
    }

    fn try_send(&self, v: T) -> Result<(), TrySendError<T>> {
        self.ring.borrow_mut().try_push(v)
    }

    /// Violation if the buffer is empty and open: no other party can fill it.
    #[track_caller]
    fn recv(&self) -> Option<T> {
        let mut ring = self.ring.borrow_mut();
        if ring.is_empty() && !ring.is_closed() {
            drop(ring);
            violation("blocking recv on an empty open single-threaded channel");
        }
        ring.try_pop()
    }

    fn try_recv(&self) -> Option<T> {
        self.ring.borrow_mut().try_pop()
    }

    fn close(&self) {
        let mut ring = self.ring.borrow_mut();
        if !ring.is_closed() {
            tracing::debug!(buffered = ring.len(), "channel closed");
        }
        ring.close();
    }

    fn is_closed(&self) -> bool {
        self.ring.borrow().is_closed()
    }

    fn len(&self) -> usize {
        self.ring.borrow().len()
    }

    fn capacity(&self) -> usize {
        self.ring.borrow().capacity()
    }

    fn is_thread_safe(&self) -> bool {
        false
    }
}

impl<T> fmt::Debug for Chan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Chan").field(&*self.ring.borrow()).finish()
    }
}

/// Thread-safe channel: one mutex, two condition variables.
pub struct SyncChan<T> {
    ring: Mutex<Ring<T>>,
    space_available: Condvar,
    item_available: Condvar,
}

impl<T> SyncChan<T> {
    #[track_caller]
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(Ring::new(capacity)),
            space_available: Condvar::new(),
            item_available: Condvar::new(),
        }
    }

    // Ring updates never panic between statements, so a poisoned lock
    // still guards a consistent ring.
    fn lock(&self) -> MutexGuard<'_, Ring<T>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Channel<T> for SyncChan<T> {
    fn send(&self, v: T) -> Result<(), SendError<T>> {
        let mut ring = self.lock();
        while ring.is_full() && !ring.is_closed() {
            ring = self
                .space_available
                .wait(ring)
                .unwrap_or_else(PoisonError::into_inner);
        }
        match ring.try_push(v) {
            Ok(()) => {
                drop(ring);
                self.item_available.notify_one();
                Ok(())
            }
            Err(e) => Err(SendError::Closed(e.into_inner())),
        }
    }

    fn try_send(&self, v: T) -> Result<(), TrySendError<T>> {
        let mut ring = self.lock();
        ring.try_push(v)?;
        drop(ring);
        self.item_available.notify_one();
        Ok(())
    }

    fn recv(&self) -> Option<T> {
        let mut ring = self.lock();
        while ring.is_empty() && !ring.is_closed() {
            ring = self
                .item_available
                .wait(ring)
                .unwrap_or_else(PoisonError::into_inner);
        }
        let v = ring.try_pop();
        drop(ring);
        if v.is_some() {
            self.space_available.notify_one();
        }
        v
    }

    fn try_recv(&self) -> Option<T> {
        let v = self.lock().try_pop();
        if v.is_some() {
            self.space_available.notify_one();
        }
        v
    }

    fn close(&self) {
        let mut ring = self.lock();
        if !ring.is_closed() {
            tracing::debug!(buffered = ring.len(), "channel closed");
        }
        ring.close();
        drop(ring);
        self.space_available.notify_all();
        self.item_available.notify_all();
    }

    fn is_closed(&self) -> bool {
        self.lock().is_closed()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    fn is_thread_safe(&self) -> bool {
        true
    }
}

impl<T> fmt::Debug for SyncChan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SyncChan").field(&*self.lock()).finish()
    }
}
