//! Worker accounting with symmetric creation/completion cancellation.
//!
//! Creation and completion events for the same worker may be observed in
//! either order: a worker-forked worker announces itself through the
//! output queue, which can be processed out of step with its terminal
//! event. Both observations run the same symmetric account step — remove
//! the id from the expected set if present, otherwise park it in the
//! opposite set. The two sets stay disjoint, and the ledger is idle
//! exactly when a removal leaves both sets empty.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::types::WorkerId;

/// Result of one account step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Accounted {
    /// Both sets are empty: every observed worker is fully accounted for.
    Idle,
    /// At least one worker is still outstanding.
    Busy,
}

impl Accounted {
    pub(crate) const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

#[derive(Debug, Default)]
struct LedgerSets {
    running: HashSet<WorkerId>,
    done: HashSet<WorkerId>,
}

/// The running/done worker sets behind one mutex.
///
/// One lock over the pair keeps the disjointness invariant easy to state:
/// an id lives in at most one set at any instant, and moves between them
/// only under the lock.
#[derive(Debug, Default)]
pub(crate) struct WorkerLedger {
    sets: Mutex<LedgerSets>,
}

impl WorkerLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a pull-side fork before its thread can emit anything.
    pub(crate) fn insert_running(&self, id: WorkerId) {
        let mut sets = self.lock();
        debug_assert!(
            !sets.done.contains(&id),
            "worker {id} finished before direct insert"
        );
        sets.running.insert(id);
    }

    /// Accounts a creation event.
    pub(crate) fn account_created(&self, id: WorkerId) -> Accounted {
        let mut sets = self.lock();
        if sets.done.remove(&id) {
            Self::state_of(&sets)
        } else {
            sets.running.insert(id);
            Accounted::Busy
        }
    }

    /// Accounts a completion event (`Done` or `Stop`).
    pub(crate) fn account_finished(&self, id: WorkerId) -> Accounted {
        let mut sets = self.lock();
        if sets.running.remove(&id) {
            Self::state_of(&sets)
        } else {
            sets.done.insert(id);
            Accounted::Busy
        }
    }

    /// Returns true when both sets are empty.
    pub(crate) fn is_idle(&self) -> bool {
        let sets = self.lock();
        sets.running.is_empty() && sets.done.is_empty()
    }

    /// Number of workers currently believed to be running.
    #[cfg(test)]
    pub(crate) fn running_count(&self) -> usize {
        self.lock().running.len()
    }

    /// Number of completions still waiting for their creation event.
    #[cfg(test)]
    pub(crate) fn done_count(&self) -> usize {
        self.lock().done.len()
    }

    fn state_of(sets: &LedgerSets) -> Accounted {
        if sets.running.is_empty() && sets.done.is_empty() {
            Accounted::Idle
        } else {
            Accounted::Busy
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerSets> {
        self.sets.lock().expect("ledger lock poisoned")
    }
}
