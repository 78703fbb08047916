//! Push side: worker threads draining the work queue.
//!
//! A worker repeatedly dequeues a pending stream and runs it to its stop,
//! emitting child events into the region's output queue. The re-dequeue
//! on stop is the recursion point that lets one thread process many
//! streams without a spawn per item; several workers race on the same
//! queue, and each stream is executed by exactly one worker end-to-end
//! unless it decomposes itself through alternation.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use crate::engine::event::ChildEvent;
use crate::engine::region::RegionRef;
use crate::stream::{Step, Stream};
use crate::types::{Fault, PanicPayload, WorkerId};

/// How a dequeued stream left the worker.
enum StreamEnd {
    /// The stream stopped; dequeue the next one.
    Stopped,
    /// The stream's final value went out as `Done`; retire the worker.
    Retired,
    /// The region closed underneath the worker; exit silently.
    Torn,
}

/// Forks a worker and inserts it into the running set first.
///
/// Only the pull side may use this: the puller and the new worker race on
/// the output queue, so waiting for a `Create` event could let the puller
/// see the worker's terminal event first and conclude the region drained.
pub(crate) fn spawn_worker_direct<T: Send + 'static>(region: &RegionRef<T>) {
    let id = WorkerId::next();
    region.ledger.insert_running(id);
    spawn_thread(region, id, false);
}

/// Forks a worker that announces itself through the output queue.
///
/// Used from inside workers (the full-work-queue escape hatch). The
/// `Create` event is the new worker's first push, which orders the
/// creation ahead of all of its own subsequent events.
pub(crate) fn spawn_worker_announced<T: Send + 'static>(region: &RegionRef<T>) {
    let id = WorkerId::next();
    spawn_thread(region, id, true);
}

fn spawn_thread<T: Send + 'static>(region: &RegionRef<T>, id: WorkerId, announce: bool) {
    let shared = Arc::clone(region);
    let handle = thread::Builder::new()
        .name(format!("braid-{id}"))
        .spawn(move || {
            if announce && shared.output.push(ChildEvent::Create(id)).is_err() {
                return;
            }
            run_worker(&shared, id);
        })
        .expect("failed to spawn worker thread");
    region.register_handle(handle);
    tracing::trace!(region = %region.id, worker = %id, announce, "worker forked");
}

/// Worker body: the push loop behind a panic barrier.
fn run_worker<T: Send + 'static>(region: &RegionRef<T>, id: WorkerId) {
    match panic::catch_unwind(AssertUnwindSafe(|| push_loop(region, id))) {
        Ok(Ok(())) => {}
        Ok(Err(fault)) => report_fault(region, id, fault),
        Err(payload) => {
            let fault = Fault::Panicked(PanicPayload::from_unwind(payload.as_ref()));
            report_fault(region, id, fault);
        }
    }
    tracing::trace!(region = %region.id, worker = %id, "worker exiting");
}

fn report_fault<T: Send + 'static>(region: &RegionRef<T>, id: WorkerId, fault: Fault) {
    tracing::debug!(region = %region.id, worker = %id, fault = %fault, "worker failed");
    let _ = region.output.push(ChildEvent::Stop(id, Some(fault)));
}

/// Dequeue a pending stream, run it to its stop, repeat until the work
/// queue is empty, then report the idle exit.
fn push_loop<T: Send + 'static>(region: &RegionRef<T>, id: WorkerId) -> Result<(), Fault> {
    loop {
        let Some(stream) = region.work.try_pop() else {
            let _ = region.output.push(ChildEvent::Stop(id, None));
            return Ok(());
        };
        match run_stream(region, id, stream)? {
            StreamEnd::Stopped => {}
            StreamEnd::Retired | StreamEnd::Torn => return Ok(()),
        }
    }
}

/// Runs one stream, threading the context each yield hands back.
fn run_stream<T: Send + 'static>(
    region: &RegionRef<T>,
    id: WorkerId,
    stream: Stream<T>,
) -> Result<StreamEnd, Fault> {
    let mut ctx = Some(Arc::clone(region));
    let mut current = stream;
    loop {
        match current.step(ctx.as_ref())? {
            Step::Stop => return Ok(StreamEnd::Stopped),
            Step::Yield {
                value, tail: None, ..
            } => {
                // Final value rides the terminal event: one push, not two.
                return Ok(match region.output.push(ChildEvent::Done(id, value)) {
                    Ok(()) => StreamEnd::Retired,
                    Err(_) => StreamEnd::Torn,
                });
            }
            Step::Yield {
                value,
                ctx: next_ctx,
                tail: Some(tail),
            } => {
                if region.output.push(ChildEvent::Yield(value)).is_err() {
                    return Ok(StreamEnd::Torn);
                }
                current = tail;
                ctx = next_ctx;
            }
        }
    }
}
