use std::sync::Arc;
use std::thread;

use lumapipe_core::prelude::*;

use crate::{ConversionError, pipeline::FrameConverter};

/// Dedicated conversion worker.
///
/// Frames are handed over through a single-slot queue: while one is waiting,
/// further submissions report `Full` and the producer drops them. The camera
/// runs at a fixed rate that may exceed conversion throughput, and dropping
/// excess frames beats unbounded buffering or stalling the producer. Results
/// reach the sink in arrival order. Shutdown closes the intake, lets
/// in-flight work run to completion, and joins the thread.
pub struct ConvertWorker {
    tx: BoundedTx<FrameBuffer>,
    handle: Option<thread::JoinHandle<()>>,
    metrics: Arc<Metrics>,
}

impl ConvertWorker {
    /// Spawn the worker thread. Every processed frame's outcome, success or
    /// typed error, is delivered to `sink` on the worker thread.
    pub fn spawn<F>(converter: FrameConverter, mut sink: F) -> Self
    where
        F: FnMut(Result<LumaRaster, ConversionError>) + Send + 'static,
    {
        let (tx, rx) = bounded::<FrameBuffer>(1);
        let handle = thread::spawn(move || {
            loop {
                match rx.recv() {
                    RecvOutcome::Data(frame) => {
                        let result = converter.convert(&frame);
                        // Plane memory is released before the result is surfaced.
                        drop(frame);
                        sink(result);
                    }
                    RecvOutcome::Empty => thread::yield_now(),
                    RecvOutcome::Closed => break,
                }
            }
        });
        Self {
            tx,
            handle: Some(handle),
            metrics: Arc::new(Metrics::default()),
        }
    }

    /// Offer a frame without blocking.
    ///
    /// `Full` means the worker still holds the previous frame and this one
    /// was dropped (and counted); `Closed` means the worker is shut down.
    pub fn submit(&self, frame: FrameBuffer) -> SendOutcome {
        let outcome = self.tx.send(frame);
        if outcome == SendOutcome::Full {
            self.metrics.drop_frame();
        }
        outcome
    }

    /// Number of frames dropped because the worker was busy.
    pub fn dropped_frames(&self) -> u64 {
        self.metrics.dropped_frames()
    }

    /// Stop accepting frames, finish in-flight work, and join the thread.
    pub fn shutdown(mut self) {
        self.close_and_join();
    }

    fn close_and_join(&mut self) {
        self.tx.close();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ConvertWorker {
    fn drop(&mut self) {
        self.close_and_join();
    }
}
