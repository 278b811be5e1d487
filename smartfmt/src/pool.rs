//! Scoped rental of transient evaluation buffers.
//!
//! The engine needs short-lived string buffers (alignment padding, child
//! formatting) on the hot path of every placeholder. Renting from a pool
//! keeps repeated evaluation allocation-free; the guard returned by
//! [`BufferPool::rent`] guarantees the buffer is cleared and returned on
//! every exit path, including unwinding. A pooled buffer is never
//! reachable from two in-flight calls at once — the guard owns it
//! exclusively until drop.

use core::ops::{Deref, DerefMut};
use std::sync::Mutex;

/// Buffers that grew beyond this capacity are dropped instead of retained,
/// so one pathological template does not pin memory forever.
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

/// How many idle buffers the pool keeps.
const MAX_RETAINED_BUFFERS: usize = 16;

/// A pool of reusable `String` buffers.
#[derive(Debug, Default)]
pub struct BufferPool {
    idle: Mutex<Vec<String>>,
}

impl BufferPool {
    /// An empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rent a cleared buffer. The buffer returns to the pool when the
    /// guard drops.
    pub fn rent(&self) -> PooledBuffer<'_> {
        let buf = lock_unpoisoned(&self.idle).pop().unwrap_or_default();
        debug_assert!(buf.is_empty());
        PooledBuffer { buf: Some(buf), pool: self }
    }

    /// The number of idle buffers currently held.
    pub fn idle_count(&self) -> usize {
        lock_unpoisoned(&self.idle).len()
    }

    fn give_back(&self, mut buf: String) {
        // reset to the defined baseline before anyone else can see it
        buf.clear();
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        let mut idle = lock_unpoisoned(&self.idle);
        if idle.len() < MAX_RETAINED_BUFFERS {
            idle.push(buf);
        }
    }
}

/// A mutex poisoned by a panicking formatter still holds valid buffers.
fn lock_unpoisoned<'m>(m: &'m Mutex<Vec<String>>) -> std::sync::MutexGuard<'m, Vec<String>> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Exclusive handle to a rented buffer.
#[derive(Debug)]
pub struct PooledBuffer<'p> {
    buf: Option<String>,
    pool: &'p BufferPool,
}

impl PooledBuffer<'_> {
    /// Take the buffer out of the rental, keeping its contents. The pool
    /// does not get it back.
    pub fn detach(mut self) -> String {
        self.buf.take().unwrap_or_default()
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = String;

    fn deref(&self) -> &String {
        self.buf.as_ref().expect("buffer present until drop")
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut String {
        self.buf.as_mut().expect("buffer present until drop")
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.give_back(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rented_buffers_come_back_cleared() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.rent();
            buf.push_str("scratch");
        }
        assert_eq!(pool.idle_count(), 1);
        let buf = pool.rent();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= "scratch".len());
    }

    #[test]
    fn detach_keeps_contents_out_of_the_pool() {
        let pool = BufferPool::new();
        let mut buf = pool.rent();
        buf.push_str("kept");
        let s = buf.detach();
        assert_eq!(s, "kept");
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn oversized_buffers_are_dropped() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.rent();
            buf.reserve(MAX_RETAINED_CAPACITY + 1);
        }
        assert_eq!(pool.idle_count(), 0);
    }
}
