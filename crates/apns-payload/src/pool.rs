//! Reusable byte buffers for the fast encoder.
//!
//! A [`BufferPool`] is owned by whoever drives encoding (typically one client
//! instance) and passed to [`encode_fast`](crate::encode_fast). A borrowed
//! [`PooledBuffer`] is exclusively owned until dropped; on drop it is cleared
//! and handed back with its capacity intact.

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;
use tracing::trace;

/// Initial capacity of a freshly allocated buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Idle buffers kept by default.
pub const DEFAULT_MAX_IDLE: usize = 64;

/// Buffers that grew beyond this are dropped instead of returned.
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

/// Pool of cleared byte buffers.
#[derive(Debug)]
pub struct BufferPool {
    idle: Mutex<Vec<Vec<u8>>>,
    buffer_capacity: usize,
    max_idle: usize,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_IDLE)
    }
}

impl BufferPool {
    /// Create a pool handing out buffers of `buffer_capacity` bytes, keeping
    /// at most `max_idle` of them around between uses.
    pub fn new(buffer_capacity: usize, max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            buffer_capacity,
            max_idle,
        }
    }

    /// Borrow an empty buffer.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = self
            .idle
            .lock()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(self.buffer_capacity));
        PooledBuffer { pool: self, buf }
    }

    /// Number of buffers currently waiting for reuse.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    fn release(&self, mut buf: Vec<u8>) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            trace!(capacity = buf.capacity(), "dropping oversized encode buffer");
            return;
        }
        buf.clear();
        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(buf);
        }
    }
}

/// A buffer borrowed from a [`BufferPool`].
#[derive(Debug)]
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Vec<u8>,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}
