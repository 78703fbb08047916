//! The stream value and its combinators.
//!
//! A [`Stream`] is a one-shot producer step: given the (possibly absent)
//! parallel-region context, it either stops or yields one value together
//! with the context to thread forward and an optional lazy tail. The two
//! continuations of the classic CPS formulation collapse into the
//! returned [`Step`] tag, and re-continuation becomes ordinary control
//! flow.
//!
//! # Combinator contract
//!
//! - [`Stream::append`] is a monoid with [`Stream::empty`] as identity:
//!   `a`'s values in order, then `b`'s, no parallelism introduced, the
//!   context threaded through unchanged.
//! - [`Stream::bind`] is sequential dependent composition and always
//!   drops the region context: parallelism is strictly the territory of
//!   alternation, and an alternation nested under a binder must open its
//!   own region rather than emit values past `f`.
//! - [`Stream::alt`] yields the union of both branches' values in
//!   unspecified order. Outside a region it opens one; inside a region it
//!   feeds the region's work queue, forking a drain worker first when the
//!   queue is full. Large alternations compose best right-folded.

use core::fmt;
use std::sync::Arc;

use crate::engine::puller;
use crate::engine::queue::TryPushError;
use crate::engine::region::{Region, RegionRef};
use crate::engine::worker;
use crate::types::Fault;

/// Outcome of driving one step of a stream.
pub(crate) enum Step<T> {
    /// The stream is exhausted without producing another value.
    Stop,
    /// One value, the context to thread forward, and the lazy remainder.
    ///
    /// `tail: None` means the value was the stream's last. Keeping that
    /// distinct from [`Step::Stop`] lets a worker retire a stream with a
    /// single `Done` event instead of a `Yield` + `Stop` pair.
    Yield {
        value: T,
        ctx: Option<RegionRef<T>>,
        tail: Option<Stream<T>>,
    },
}

pub(crate) type StepResult<T> = Result<Step<T>, Fault>;

type StepFn<T> = Box<dyn FnOnce(Option<&RegionRef<T>>) -> StepResult<T> + Send>;

/// A lazy, possibly concurrent sequence of values of type `T`.
///
/// Streams are one-shot: pulling consumes them. Compose with
/// [`append`](Self::append), [`bind`](Self::bind) and [`alt`](Self::alt),
/// then consume with [`pull`](crate::pull).
pub struct Stream<T> {
    step: StepFn<T>,
}

impl<T: Send + 'static> Stream<T> {
    pub(crate) fn from_fn(
        step: impl FnOnce(Option<&RegionRef<T>>) -> StepResult<T> + Send + 'static,
    ) -> Self {
        Self {
            step: Box::new(step),
        }
    }

    /// Drives one step.
    pub(crate) fn step(self, ctx: Option<&RegionRef<T>>) -> StepResult<T> {
        (self.step)(ctx)
    }

    /// The zero-element stream; identity for [`append`](Self::append).
    #[must_use]
    pub fn empty() -> Self {
        Self::from_fn(|_| Ok(Step::Stop))
    }

    /// The one-element stream.
    #[must_use]
    pub fn single(value: T) -> Self {
        Self::from_fn(move |ctx| {
            Ok(Step::Yield {
                value,
                ctx: ctx.cloned(),
                tail: None,
            })
        })
    }

    /// Runs one effect when pulled and yields its result.
    #[must_use]
    pub fn lift(effect: impl FnOnce() -> T + Send + 'static) -> Self {
        Self::from_fn(move |ctx| {
            Ok(Step::Yield {
                value: effect(),
                ctx: ctx.cloned(),
                tail: None,
            })
        })
    }

    /// Runs one fallible effect when pulled.
    ///
    /// An `Err` tears down the enclosing parallel region, if any, and
    /// resurfaces at the consumer.
    #[must_use]
    pub fn try_lift(effect: impl FnOnce() -> Result<T, Fault> + Send + 'static) -> Self {
        Self::from_fn(move |ctx| {
            let value = effect()?;
            Ok(Step::Yield {
                value,
                ctx: ctx.cloned(),
                tail: None,
            })
        })
    }

    /// A stream that fails as soon as it is pulled.
    #[must_use]
    pub fn fail(fault: Fault) -> Self {
        Self::from_fn(move |_| Err(fault))
    }

    /// A serial stream over an iterator.
    #[must_use]
    pub fn from_iter<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        from_iterator(values.into_iter())
    }

    /// Serial append: `self`'s values in order, then `other`'s.
    ///
    /// Associative, with [`Stream::empty`] as identity on both sides.
    #[must_use]
    pub fn append(self, other: Self) -> Self {
        Self::from_fn(move |ctx| match self.step(ctx)? {
            Step::Stop => other.step(ctx),
            Step::Yield {
                value,
                ctx: next,
                tail,
            } => Ok(Step::Yield {
                value,
                ctx: next,
                tail: Some(match tail {
                    Some(tail) => tail.append(other),
                    None => other,
                }),
            }),
        })
    }

    /// Sequential bind: for each value `v` of `self`, every value of
    /// `f(v)`, concatenated in order.
    ///
    /// The region context is dropped on every side of the binder: the
    /// source, each `f(v)`, and the source's tail all start without one,
    /// so alternation inside them begins a fresh region.
    #[must_use]
    pub fn bind<U: Send + 'static>(
        self,
        f: impl Fn(T) -> Stream<U> + Send + Sync + 'static,
    ) -> Stream<U> {
        bind_shared(self, Arc::new(f))
    }

    /// Opportunistic-parallel alternation: the values of both branches in
    /// unspecified order.
    ///
    /// The engine may run the branches interleaved on one thread, on two
    /// threads, or any mix; no fairness between them is guaranteed beyond
    /// demand-driven forking (a starved consumer forks extra workers, so
    /// a finite branch cannot be starved forever by an infinite sibling).
    #[must_use]
    pub fn alt(self, other: Self) -> Self {
        Self::from_fn(move |ctx| match ctx {
            Some(region) => {
                if !enqueue_branch(region, self) || !enqueue_branch(region, other) {
                    // Region torn down mid-enqueue; its fault is already
                    // on the way to the consumer.
                    return Ok(Step::Stop);
                }
                drain_pending(Arc::clone(region)).step(Some(region))
            }
            None => {
                let region = Region::create();
                let seeded = enqueue_branch(&region, self) && enqueue_branch(&region, other);
                debug_assert!(seeded, "fresh region rejected a branch");
                worker::spawn_worker_direct(&region);
                puller::puller_stream(region).step(None)
            }
        })
    }

    /// Consumes the stream. Equivalent to [`pull`](crate::pull).
    #[must_use]
    pub fn pull(self) -> crate::drain::Drain<T> {
        crate::drain::pull(self)
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}

fn from_iterator<T, I>(mut values: I) -> Stream<T>
where
    T: Send + 'static,
    I: Iterator<Item = T> + Send + 'static,
{
    Stream::from_fn(move |ctx| match values.next() {
        None => Ok(Step::Stop),
        Some(value) => Ok(Step::Yield {
            value,
            ctx: ctx.cloned(),
            tail: Some(from_iterator(values)),
        }),
    })
}

fn bind_shared<T, U>(source: Stream<T>, f: Arc<dyn Fn(T) -> Stream<U> + Send + Sync>) -> Stream<U>
where
    T: Send + 'static,
    U: Send + 'static,
{
    Stream::from_fn(move |_ctx| {
        let mut outer = source;
        loop {
            match outer.step(None)? {
                Step::Stop => return Ok(Step::Stop),
                Step::Yield {
                    value,
                    tail: outer_tail,
                    ..
                } => {
                    match f(value).step(None)? {
                        // Empty inner stream: move to the next outer value
                        // iteratively, so long runs of empty results do
                        // not grow the stack.
                        Step::Stop => match outer_tail {
                            Some(tail) => outer = tail,
                            None => return Ok(Step::Stop),
                        },
                        Step::Yield {
                            value: mapped,
                            ctx,
                            tail: inner_tail,
                        } => {
                            let rest = outer_tail.map(|tail| bind_shared(tail, Arc::clone(&f)));
                            let tail = match (inner_tail, rest) {
                                (Some(inner), Some(rest)) => Some(inner.append(rest)),
                                (Some(inner), None) => Some(inner),
                                (None, Some(rest)) => Some(rest),
                                (None, None) => None,
                            };
                            return Ok(Step::Yield {
                                value: mapped,
                                ctx,
                                tail,
                            });
                        }
                    }
                }
            }
        }
    })
}

/// Enqueues an alternation branch onto the region's work queue, forking a
/// drain worker first when the queue is full. Without that fork, every
/// worker could block on a full work queue while none is left draining it
/// — the bounded-queue self-deadlock. Returns false if the region closed.
fn enqueue_branch<T: Send + 'static>(region: &RegionRef<T>, branch: Stream<T>) -> bool {
    match region.work.try_push(branch) {
        Ok(()) => true,
        Err(TryPushError::Closed(_)) => false,
        Err(TryPushError::Full(branch)) => {
            tracing::trace!(region = %region.id, "work queue full; forking drain worker");
            worker::spawn_worker_announced(region);
            region.work.push(branch).is_ok()
        }
    }
}

/// Inline dequeue loop for alternation under an existing region: pop
/// pending streams and run them on the current worker until the work
/// queue is momentarily empty.
fn drain_pending<T: Send + 'static>(region: RegionRef<T>) -> Stream<T> {
    Stream::from_fn(move |_ctx| loop {
        let Some(pending) = region.work.try_pop() else {
            return Ok(Step::Stop);
        };
        match pending.step(Some(&region))? {
            Step::Stop => {}
            Step::Yield { value, ctx, tail } => {
                let more = drain_pending(Arc::clone(&region));
                let tail = Some(match tail {
                    Some(tail) => tail.append(more),
                    None => more,
                });
                return Ok(Step::Yield { value, ctx, tail });
            }
        }
    })
}
