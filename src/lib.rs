//! Braid: a demand-driven concurrent sequence transformer.
//!
//! # Overview
//!
//! Braid lets a consumer pull a lazy, possibly infinite sequence whose
//! production steps run serially or in parallel under a demand-driven
//! scheduler. The user composes [`Stream`] values with three algebraic
//! combinators and says *what* to compute; the engine decides how many
//! worker threads to spawn, when to spawn them, and how to route values
//! and faults back to the consumer.
//!
//! - [`Stream::append`]: serial composition — `a`'s values in order, then
//!   `b`'s. Monoid, with [`Stream::empty`] as identity.
//! - [`Stream::bind`]: sequential dependent composition — for each value
//!   `v` of `a`, every value of `f(v)`, in order.
//! - [`Stream::alt`]: opportunistic-parallel alternation — the union of
//!   both branches' values in unspecified order, on one thread or many.
//!
//! # Core guarantees
//!
//! - **No orphan workers**: every thread forked for a parallel region is
//!   joined before the region's last value (or its fault) reaches the
//!   consumer.
//! - **Termination detection**: worker creation and completion events
//!   cancel symmetrically, so drain is detected even when the two events
//!   arrive out of order.
//! - **Deadlock-free handoff**: both per-region queues are bounded; an
//!   enqueue that would block on a full work queue first forks a worker
//!   to drain it.
//! - **Fault isolation**: an error or panic inside any worker tears the
//!   whole region down and resurfaces at the consumer's next pull, after
//!   every sibling worker has exited.
//!
//! # Module structure
//!
//! - [`types`]: identifier and fault types
//! - [`stream`]: the [`Stream`] value and its combinators
//! - [`drain`]: the consuming side ([`pull`] and the [`Drain`] iterator)
//! - `engine`: queues, worker ledger, region state, push/pull protocol
//!
//! # Example
//!
//! ```
//! use braid::{pull, Stream};
//!
//! let left = Stream::from_iter(1..=3);
//! let right = Stream::from_iter(4..=6);
//! let mut values: Vec<i32> = pull(left.alt(right)).map(Result::unwrap).collect();
//! values.sort_unstable();
//! assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

mod engine;

pub mod drain;
pub mod stream;
pub mod types;

pub use drain::{pull, Drain};
pub use stream::Stream;
pub use types::{Fault, PanicPayload, RegionId, WorkerId};
