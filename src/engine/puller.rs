//! Consumer side of a parallel region.
//!
//! The puller is itself a stream bound to a region. It dispatches child
//! events, adds capacity when the consumer outruns the producers, and
//! detects drain through the ledger's symmetric accounting. A worker
//! retires on its final `Done` even when pending work remains, so an idle
//! ledger alone is not drain: the puller respawns a worker whenever the
//! sets empty out while streams are still queued. The region terminates
//! only with idle ledger, empty work queue, and drained output queue.

use std::thread;

use crate::engine::event::ChildEvent;
use crate::engine::region::{RegionRef, PULL_BACKOFF};
use crate::engine::worker;
use crate::stream::{Step, StepResult, Stream};

/// Builds the pulling stream for a region.
pub(crate) fn puller_stream<T: Send + 'static>(region: RegionRef<T>) -> Stream<T> {
    let puller = Puller {
        region: Some(region),
    };
    Stream::from_fn(move |_ctx| puller.run())
}

/// One pull step over a region's output queue.
///
/// The region sits behind an `Option` so that an abandoned pull (the
/// consumer drops the iterator mid-region) still closes the region and
/// lets every blocked worker exit.
struct Puller<T: Send + 'static> {
    region: Option<RegionRef<T>>,
}

impl<T: Send + 'static> Puller<T> {
    fn run(mut self) -> StepResult<T> {
        let region = self.region.take().expect("puller region already taken");
        loop {
            let event = match region.output.try_pop() {
                Some(event) => event,
                None => {
                    // Producers may merely be slow; give them a moment.
                    thread::sleep(PULL_BACKOFF);
                    if region.output.is_empty() && !region.work.is_empty() {
                        // Consumer is outrunning production: add capacity.
                        tracing::trace!(region = %region.id, "demand fork");
                        worker::spawn_worker_direct(&region);
                    }
                    match region.output.pop() {
                        Ok(event) => event,
                        // Only the puller closes the output queue.
                        Err(_) => return Ok(Step::Stop),
                    }
                }
            };
            match event {
                ChildEvent::Yield(value) => {
                    return Ok(Step::Yield {
                        value,
                        ctx: None,
                        tail: Some(puller_stream(region)),
                    });
                }
                ChildEvent::Done(id, value) => {
                    if region.ledger.account_finished(id).is_idle() && drained(&region) {
                        region.finish();
                        return Ok(Step::Yield {
                            value,
                            ctx: None,
                            tail: None,
                        });
                    }
                    return Ok(Step::Yield {
                        value,
                        ctx: None,
                        tail: Some(puller_stream(region)),
                    });
                }
                ChildEvent::Stop(id, None) => {
                    if region.ledger.account_finished(id).is_idle() && drained(&region) {
                        region.finish();
                        return Ok(Step::Stop);
                    }
                }
                ChildEvent::Stop(id, Some(fault)) => {
                    let _ = region.ledger.account_finished(id);
                    tracing::debug!(
                        region = %region.id,
                        worker = %id,
                        fault = %fault,
                        "region fault; tearing down"
                    );
                    region.abort();
                    return Err(fault);
                }
                ChildEvent::Create(id) => {
                    let _ = region.ledger.account_created(id);
                }
            }
        }
    }
}

impl<T: Send + 'static> Drop for Puller<T> {
    fn drop(&mut self) {
        if let Some(region) = self.region.take() {
            if !region.is_closed() {
                // Abandoned mid-region: close so blocked workers exit.
                tracing::debug!(region = %region.id, "pull abandoned; closing region");
                region.close();
            }
        }
    }
}

/// Completes the drain check once the ledger has gone idle.
///
/// Idle sets alone are not drain: pending work means no worker is left to
/// run it (a worker retires on its final `Done`), so one is forked; an
/// undelivered event means a worker-forked worker's `Create` has not been
/// dispatched yet, so its owner may still be alive. Either way the region
/// must keep pulling.
fn drained<T: Send + 'static>(region: &RegionRef<T>) -> bool {
    if !region.work.is_empty() {
        tracing::trace!(region = %region.id, "ledger idle with pending work; respawning");
        worker::spawn_worker_direct(region);
        return false;
    }
    region.output.is_empty()
}
