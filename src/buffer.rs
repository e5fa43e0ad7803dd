use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Capacity hint for freshly allocated buffers.
const INITIAL_CAPACITY: usize = 1024;

/// Buffers that grew past this ceiling are discarded on release instead of
/// being pooled, so one oversized line cannot bloat the pool permanently.
const MAX_POOLED_CAPACITY: usize = 16 << 10;

/// Shared free list of line buffers.
///
/// The pool is an explicit value owned by the handler family rather than a
/// process-wide singleton, so tests and embedders can supply their own.
/// Cloning is cheap and clones share the same free list. Acquire and release
/// are safe from any number of threads; an individual [`Buffer`] belongs to
/// exactly one in-flight call.
#[derive(Clone, Default)]
pub struct BufferPool {
    free: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a buffer from the free list, or allocate a fresh one with the
    /// standard capacity hint when the list is empty.
    pub fn acquire(&self) -> Buffer {
        let bytes = self
            .free
            .lock()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(INITIAL_CAPACITY));
        Buffer {
            bytes,
            pool: self.clone(),
        }
    }

    fn recycle(&self, mut bytes: Vec<u8>) {
        if bytes.capacity() <= MAX_POOLED_CAPACITY {
            bytes.clear();
            self.free.lock().push(bytes);
        }
    }

    #[cfg(test)]
    pub(crate) fn pooled(&self) -> usize {
        self.free.lock().len()
    }
}

/// Reusable byte accumulator for one formatted line.
///
/// Append operations grow the buffer as needed and never fail. Dropping the
/// buffer returns its storage to the pool it was acquired from, on every
/// exit path.
pub struct Buffer {
    bytes: Vec<u8>,
    pool: BufferPool,
}

impl Buffer {
    pub fn write(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    pub fn write_str(&mut self, s: &str) {
        self.bytes.extend_from_slice(s.as_bytes());
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        let bytes = std::mem::take(&mut self.bytes);
        self.pool.recycle(bytes);
    }
}

// Lets formatted values (integers, timestamps) append straight into the
// line without an intermediate String.
impl fmt::Write for Buffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.bytes.extend_from_slice(s.as_bytes());
        Ok(())
    }
}
