use crossbeam_queue::ArrayQueue;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Result of attempting to enqueue.
///
/// # Example
/// ```rust
/// use lumapipe_core::prelude::{SendOutcome, bounded};
///
/// let (tx, _rx) = bounded::<u8>(1);
/// assert_eq!(tx.send(1), SendOutcome::Ok);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Value was accepted.
    Ok,
    /// Queue is full; the value was discarded.
    Full,
    /// Queue is closed.
    Closed,
}

/// Result of attempting to dequeue.
///
/// # Example
/// ```rust
/// use lumapipe_core::prelude::{RecvOutcome, bounded};
///
/// let (_tx, rx) = bounded::<u8>(1);
/// match rx.recv() {
///     RecvOutcome::Empty | RecvOutcome::Closed | RecvOutcome::Data(_) => {}
/// }
/// ```
#[derive(Debug)]
pub enum RecvOutcome<T> {
    /// Received value.
    Data(T),
    /// Queue has been closed and drained.
    Closed,
    /// Queue currently empty.
    Empty,
}

/// Bounded sender handle.
#[derive(Clone)]
pub struct BoundedTx<T> {
    inner: Arc<QueueInner<T>>,
}

impl<T> BoundedTx<T> {
    /// Attempt to send without blocking.
    pub fn send(&self, value: T) -> SendOutcome {
        if self.inner.closed.load(Ordering::Acquire) {
            return SendOutcome::Closed;
        }
        self.inner
            .queue
            .push(value)
            .map(|_| SendOutcome::Ok)
            .unwrap_or(SendOutcome::Full)
    }

    /// Close the queue to further sends.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }
}

/// Bounded receiver handle.
#[derive(Clone)]
pub struct BoundedRx<T> {
    inner: Arc<QueueInner<T>>,
}

impl<T> BoundedRx<T> {
    /// Attempt to receive without blocking.
    ///
    /// Values queued before closure still drain as `Data`.
    pub fn recv(&self) -> RecvOutcome<T> {
        match self.inner.queue.pop() {
            Some(value) => RecvOutcome::Data(value),
            None => {
                if self.inner.closed.load(Ordering::Acquire) {
                    RecvOutcome::Closed
                } else {
                    RecvOutcome::Empty
                }
            }
        }
    }

    /// Mark the queue as closed; senders will see `Closed` and stop.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }
}

struct QueueInner<T> {
    queue: ArrayQueue<T>,
    closed: AtomicBool,
}

/// Create a bounded queue with the given capacity.
///
/// Capacity 1 gives the at-most-one-in-flight handoff used between the frame
/// producer and the conversion worker.
///
/// # Example
/// ```rust
/// use lumapipe_core::prelude::{RecvOutcome, SendOutcome, bounded};
///
/// let (tx, rx) = bounded::<u8>(1);
/// assert_eq!(tx.send(1), SendOutcome::Ok);
/// assert!(matches!(rx.recv(), RecvOutcome::Data(1)));
/// ```
pub fn bounded<T>(capacity: usize) -> (BoundedTx<T>, BoundedRx<T>) {
    let inner = Arc::new(QueueInner {
        queue: ArrayQueue::new(capacity),
        closed: AtomicBool::new(false),
    });
    (
        BoundedTx {
            inner: inner.clone(),
        },
        BoundedRx { inner },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_slot_reports_full_then_drains() {
        let (tx, rx) = bounded::<u8>(1);
        assert_eq!(tx.send(1), SendOutcome::Ok);
        assert_eq!(tx.send(2), SendOutcome::Full);
        assert!(matches!(rx.recv(), RecvOutcome::Data(1)));
        assert!(matches!(rx.recv(), RecvOutcome::Empty));
    }

    #[test]
    fn closed_queue_rejects_sends_and_drains_remaining() {
        let (tx, rx) = bounded::<u8>(1);
        let _ = tx.send(7);
        tx.close();
        assert_eq!(tx.send(8), SendOutcome::Closed);
        assert!(matches!(rx.recv(), RecvOutcome::Data(7)));
        assert!(matches!(rx.recv(), RecvOutcome::Closed));
    }
}
