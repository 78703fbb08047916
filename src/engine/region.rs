//! Per-region shared state.
//!
//! A region is the unit of parallelism: it is created when an alternation
//! runs without an active context, shared by every worker forked under
//! it and by the puller, and discarded at drain or abort. Its queues are
//! deliberately small — backpressure, not buffering, is the point — and
//! their capacities are not tunable.

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_queue::SegQueue;

use crate::engine::event::ChildEvent;
use crate::engine::ledger::WorkerLedger;
use crate::engine::queue::BoundedQueue;
use crate::stream::Stream;
use crate::types::RegionId;

/// Capacity of the child-event queue.
pub(crate) const OUTPUT_QUEUE_CAPACITY: usize = 32;
/// Capacity of the pending-stream queue.
pub(crate) const WORK_QUEUE_CAPACITY: usize = 32;
/// Backoff the puller applies before concluding producers are idle.
pub(crate) const PULL_BACKOFF: Duration = Duration::from_micros(4);

/// Shared handle to one parallel region.
pub(crate) type RegionRef<T> = Arc<Region<T>>;

/// State shared by every worker of one parallel region and its puller.
pub(crate) struct Region<T> {
    pub(crate) id: RegionId,
    /// Child events on their way to the puller.
    pub(crate) output: BoundedQueue<ChildEvent<T>>,
    /// Streams waiting for a worker to pick them up.
    pub(crate) work: BoundedQueue<Stream<T>>,
    /// Creation/completion accounting.
    pub(crate) ledger: WorkerLedger,
    /// Join handles of every thread forked for this region.
    handles: SegQueue<JoinHandle<()>>,
    closed: AtomicBool,
}

impl<T: Send + 'static> Region<T> {
    /// Creates a fresh region.
    pub(crate) fn create() -> RegionRef<T> {
        let id = RegionId::next();
        tracing::debug!(region = %id, "parallel region created");
        Arc::new(Self {
            id,
            output: BoundedQueue::new(OUTPUT_QUEUE_CAPACITY),
            work: BoundedQueue::new(WORK_QUEUE_CAPACITY),
            ledger: WorkerLedger::new(),
            handles: SegQueue::new(),
            closed: AtomicBool::new(false),
        })
    }

    /// Registers a forked thread for join at region end.
    pub(crate) fn register_handle(&self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Closes both queues, waking every blocked worker.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.output.close();
        self.work.close();
    }

    /// Normal end of region: every worker has reported, nothing pending.
    ///
    /// No assertion on the output queue: a fork-on-full worker that lost
    /// the race for its branch may announce itself between the drain
    /// check and the close, then exit silently on the closed queue.
    pub(crate) fn finish(&self) {
        debug_assert!(self.ledger.is_idle(), "region finished with live workers");
        debug_assert!(self.work.is_empty(), "region finished with pending work");
        self.close();
        self.join_workers();
        tracing::debug!(region = %self.id, "parallel region drained");
    }

    /// Fault teardown: wake everyone, then wait for every worker to exit.
    pub(crate) fn abort(&self) {
        self.close();
        self.join_workers();
        tracing::debug!(region = %self.id, "parallel region aborted");
    }

    fn join_workers(&self) {
        while let Some(handle) = self.handles.pop() {
            let _ = handle.join();
        }
    }
}

impl<T> fmt::Debug for Region<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("id", &self.id)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
