use std::sync::{Arc, Mutex};

use crate::metrics::Metrics;

/// Handle to a pooled buffer.
///
/// When dropped, the buffer returns to the originating pool so later frames
/// reuse memory without reallocations.
///
/// # Example
/// ```rust
/// use lumapipe_core::prelude::BufferPool;
///
/// let pool = BufferPool::with_capacity(2, 1024);
/// let mut lease = pool.lease();
/// lease.resize(16);
/// assert_eq!(lease.len(), 16);
/// ```
pub struct BufferLease {
    pool: Arc<PoolInner>,
    buf: Option<Vec<u8>>,
}

impl BufferLease {
    /// Borrow as an immutable slice.
    pub fn as_slice(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or(&[])
    }

    /// Borrow as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().unwrap_or(&mut [])
    }

    /// Current length of the buffer.
    pub fn len(&self) -> usize {
        self.buf.as_ref().map(|b| b.len()).unwrap_or(0)
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ensure the buffer capacity fits `len` bytes and set its length.
    pub fn resize(&mut self, len: usize) {
        if let Some(buf) = self.buf.as_mut() {
            if buf.capacity() < len {
                buf.reserve(len - buf.capacity());
            }
            buf.resize(len, 0);
        }
    }

    /// Set length without initializing; caller must fully write before read.
    ///
    /// # Safety
    /// The buffer contents are uninitialized for any newly exposed bytes.
    pub unsafe fn resize_uninit(&mut self, len: usize) {
        if let Some(buf) = self.buf.as_mut() {
            if buf.capacity() < len {
                buf.reserve(len - buf.capacity());
            }
            unsafe {
                buf.set_len(len);
            }
        }
    }

    /// Detach the bytes as an owned vector; nothing returns to the pool.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.buf.take().unwrap_or_default()
    }
}

impl Drop for BufferLease {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.recycle(buf);
        }
    }
}

/// Simple buffer pool that hands out reusable owned buffers.
///
/// # Example
/// ```rust
/// use lumapipe_core::prelude::BufferPool;
///
/// let pool = BufferPool::with_limits(4, 1 << 16, 8);
/// let _lease = pool.lease();
/// ```
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
    metrics: Arc<Metrics>,
}

impl BufferPool {
    /// Create a pool with `capacity` preallocated buffers of `chunk_size` bytes.
    pub fn with_capacity(capacity: usize, chunk_size: usize) -> Self {
        Self::with_limits(capacity, chunk_size, capacity)
    }

    /// Create a pool with `capacity` preallocated buffers and a maximum retained free list.
    pub fn with_limits(capacity: usize, chunk_size: usize, max_free: usize) -> Self {
        let mut free = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            free.push(vec![0; chunk_size]);
        }
        Self {
            inner: Arc::new(PoolInner {
                free: Mutex::new(free),
                chunk_size,
                max_free,
            }),
            metrics: Arc::new(Metrics::default()),
        }
    }

    /// Acquire a buffer, allocating if the pool is empty.
    pub fn lease(&self) -> BufferLease {
        let buf = self
            .inner
            .free
            .lock()
            .unwrap()
            .pop()
            .inspect(|_| {
                self.metrics.hit();
            })
            .unwrap_or_else(|| {
                self.metrics.miss();
                self.metrics.alloc();
                vec![0; self.inner.chunk_size]
            });
        BufferLease {
            pool: self.inner.clone(),
            buf: Some(buf),
        }
    }

    /// Access metrics counters for this pool.
    pub fn metrics(&self) -> BufferPoolMetrics {
        BufferPoolMetrics(self.metrics.clone())
    }
}

struct PoolInner {
    free: Mutex<Vec<Vec<u8>>>,
    chunk_size: usize,
    max_free: usize,
}

impl PoolInner {
    fn recycle(&self, mut buf: Vec<u8>) {
        buf.clear();
        let mut free = self.free.lock().unwrap();
        if free.len() < self.max_free {
            free.push(buf);
        }
    }
}

/// Observability for buffer pool behavior.
///
/// # Example
/// ```rust
/// use lumapipe_core::prelude::BufferPool;
///
/// let pool = BufferPool::with_capacity(1, 128);
/// let metrics = pool.metrics();
/// let _ = metrics.hits();
/// ```
#[derive(Clone)]
pub struct BufferPoolMetrics(Arc<Metrics>);

impl BufferPoolMetrics {
    pub fn hits(&self) -> u64 {
        self.0.hits()
    }

    pub fn misses(&self) -> u64 {
        self.0.misses()
    }

    pub fn allocations(&self) -> u64 {
        self.0.allocations()
    }
}
