//! Identifier types for engine entities.
//!
//! Regions and workers carry process-global sequence numbers. Numbers are
//! never reused, so a `WorkerId` observed in a creation event and one
//! observed in a completion event name the same worker exactly when they
//! compare equal.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_REGION_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_WORKER_ID: AtomicU64 = AtomicU64::new(1);

/// A unique identifier for one parallel region.
///
/// A region lives from the first alternation entered without an active
/// context until its drain (or abort); every worker forked under that
/// alternation shares it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(u64);

impl RegionId {
    /// Allocates the next region identifier.
    #[must_use]
    pub(crate) fn next() -> Self {
        Self(NEXT_REGION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionId({})", self.0)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A unique identifier for one worker thread within a parallel region.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(u64);

impl WorkerId {
    /// Allocates the next worker identifier.
    #[must_use]
    pub(crate) fn next() -> Self {
        Self(NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Total number of worker identifiers this process has allocated.
    #[doc(hidden)]
    #[must_use]
    pub fn issued() -> u64 {
        NEXT_WORKER_ID.load(Ordering::Relaxed) - 1
    }
}

impl fmt::Debug for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkerId({})", self.0)
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}
