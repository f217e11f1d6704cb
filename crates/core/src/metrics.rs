use std::sync::atomic::{AtomicU64, Ordering};

/// Lightweight counters shared by buffer pools and the conversion worker.
///
/// # Example
/// ```rust
/// use lumapipe_core::metrics::Metrics;
///
/// let metrics = Metrics::default();
/// metrics.hit();
/// assert_eq!(metrics.hits(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Metrics {
    hits: AtomicU64,
    misses: AtomicU64,
    allocations: AtomicU64,
    dropped: AtomicU64,
}

impl Metrics {
    /// Increment the pool hit counter.
    pub fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the pool miss counter.
    pub fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the allocation counter.
    pub fn alloc(&self) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a frame dropped because the consumer was busy.
    pub fn drop_frame(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of hits.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Snapshot of misses.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Snapshot of allocations.
    pub fn allocations(&self) -> u64 {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Snapshot of dropped frames.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Clone for Metrics {
    fn clone(&self) -> Self {
        let cloned = Metrics::default();
        cloned.hits.store(self.hits(), Ordering::Relaxed);
        cloned.misses.store(self.misses(), Ordering::Relaxed);
        cloned
            .allocations
            .store(self.allocations(), Ordering::Relaxed);
        cloned
            .dropped
            .store(self.dropped_frames(), Ordering::Relaxed);
        cloned
    }
}
