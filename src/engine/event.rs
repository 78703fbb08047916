//! Child events flowing from workers to the puller.

use core::fmt;

use crate::types::{Fault, WorkerId};

/// One event emitted by the push side of a parallel region.
pub(crate) enum ChildEvent<T> {
    /// A worker produced a value and has more to do.
    Yield(T),
    /// A worker produced its final value and is exiting.
    Done(WorkerId, T),
    /// A worker exited producing nothing, or failed.
    Stop(WorkerId, Option<Fault>),
    /// A worker forked from within another worker announced itself.
    ///
    /// Pushed by the new worker as its first output-queue action, so the
    /// creation is ordered ahead of all of that worker's own events.
    /// Pull-side forks never use this variant: the puller and a fresh
    /// worker race on this queue, so those insert into the running set
    /// directly instead.
    Create(WorkerId),
}

impl<T> fmt::Debug for ChildEvent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yield(_) => f.write_str("Yield(..)"),
            Self::Done(id, _) => write!(f, "Done({id}, ..)"),
            Self::Stop(id, fault) => write!(f, "Stop({id}, {fault:?})"),
            Self::Create(id) => write!(f, "Create({id})"),
        }
    }
}
