//! Bounded worker pool for in-flight downloads
//!
//! The pool bounds the number of downloads between "admitted" and "finished"
//! with a counting semaphore. Admission blocks until a slot frees; there is
//! no timeout and no priority. The separate single-holder write gate lives
//! with the session state, not here, and is not counted against the pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Default number of concurrent download slots.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Counting-semaphore pool bounding concurrent downloads.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    slots: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
}

/// An admitted download slot.
///
/// Dropping the slot returns the permit and decrements the in-flight count,
/// so release happens on every exit path of a worker.
#[derive(Debug)]
pub struct PoolSlot {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for PoolSlot {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl WorkerPool {
    pub fn new(concurrency: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(concurrency.max(1))),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Block until a download slot is free, then claim it.
    ///
    /// The orchestrator admits before spawning a worker task, so discovered
    /// candidates can never outrun the pool.
    pub async fn admit(&self) -> PoolSlot {
        // acquire on a non-closed semaphore cannot fail
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .expect("pool semaphore closed");
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        PoolSlot {
            _permit: permit,
            in_flight: self.in_flight.clone(),
        }
    }

    /// Downloads currently between admission and completion.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}
