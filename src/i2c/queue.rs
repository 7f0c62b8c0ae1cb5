// Licensed under the Apache-2.0 license

//! Per-channel byte queues.
//!
//! [`ByteQueue`] is a plain bounded FIFO. [`SharedQueue`] wraps it in a
//! critical section so the foreground transaction engine and interrupt
//! callbacks can both touch it. Neither type blocks: waiting for room or
//! data is done by the caller through a wait policy.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

/// Capacity of every channel queue.
pub const QUEUE_CAPACITY: usize = 16;

/// Fixed-capacity FIFO of bytes.
#[derive(Clone, Debug, Default)]
pub struct ByteQueue {
    inner: Deque<u8, QUEUE_CAPACITY>,
}

impl ByteQueue {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Deque::new(),
        }
    }

    /// Appends `byte`. Does nothing when the queue is full; callers check
    /// [`is_full`](Self::is_full) first. Returns whether the byte was stored.
    pub fn insert(&mut self, byte: u8) -> bool {
        self.inner.push_back(byte).is_ok()
    }

    /// Oldest byte, or `None` when empty.
    pub fn remove(&mut self) -> Option<u8> {
        self.inner.pop_front()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Remaining room before the queue is full.
    #[must_use]
    pub fn free(&self) -> usize {
        self.capacity() - self.size()
    }
}

/// A [`ByteQueue`] shared between foreground and interrupt context.
///
/// Every method runs inside its own short critical section; no lock is
/// held between calls.
pub struct SharedQueue {
    inner: Mutex<RefCell<ByteQueue>>,
}

impl Default for SharedQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedQueue {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(ByteQueue::new())),
        }
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut ByteQueue) -> T) -> T {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Replaces the contents with a fresh empty queue.
    pub fn reset(&self) {
        self.with(|q| *q = ByteQueue::new());
    }

    pub fn insert(&self, byte: u8) -> bool {
        self.with(|q| q.insert(byte))
    }

    pub fn remove(&self) -> Option<u8> {
        self.with(ByteQueue::remove)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.with(|q| q.is_empty())
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.with(|q| q.is_full())
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.with(|q| q.size())
    }
}
