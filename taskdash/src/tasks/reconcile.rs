//! Merging a full refresh into the board.
//!
//! Rules, per refreshed record:
//! - an existing controller with a request in flight keeps its displayed
//!   record (the optimistic write, or its rollback, must not be clobbered)
//! - for a numbered refresh, a controller held past that number keeps its
//!   displayed record too
//! - any other existing controller adopts the refreshed record
//! - an unseen id gets a new idle controller
//!
//! Controllers whose id is absent from the refresh are dropped, and the
//! result follows the refresh order. Applying the same refresh twice gives
//! the same board.

use std::collections::{HashMap, HashSet};

use taskdash_proto::{Task, TaskId};

use super::controller::TaskController;

/// What a reconciliation changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Existing entries that took the refreshed record.
    pub adopted: usize,
    /// Existing entries left alone because a request is in flight.
    pub kept_pending: usize,
    /// Existing entries left alone because the refresh predates their last
    /// confirmed change.
    pub kept_stale: usize,
    /// New entries.
    pub added: usize,
    /// Entries no longer present in the refresh.
    pub removed: usize,
}

/// Merges `refreshed` into `current` and returns the new board order.
///
/// Duplicate ids in `refreshed` keep their first occurrence.
#[must_use]
pub fn reconcile(
    current: Vec<TaskController>,
    refreshed: Vec<Task>,
) -> (Vec<TaskController>, ReconcileStats) {
    merge(current, refreshed, None)
}

/// [`reconcile`] for refresh number `seq`, honouring controller holds.
#[must_use]
pub fn reconcile_from(
    current: Vec<TaskController>,
    refreshed: Vec<Task>,
    seq: u64,
) -> (Vec<TaskController>, ReconcileStats) {
    merge(current, refreshed, Some(seq))
}

fn merge(
    current: Vec<TaskController>,
    refreshed: Vec<Task>,
    seq: Option<u64>,
) -> (Vec<TaskController>, ReconcileStats) {
    let mut stats = ReconcileStats::default();
    let mut existing: HashMap<TaskId, TaskController> = current
        .into_iter()
        .map(|controller| (controller.id().clone(), controller))
        .collect();
    let mut seen: HashSet<TaskId> = HashSet::with_capacity(refreshed.len());
    let mut merged = Vec::with_capacity(refreshed.len());

    for record in refreshed {
        if !seen.insert(record.id.clone()) {
            continue;
        }
        match existing.remove(&record.id) {
            Some(mut controller) => {
                if seq.is_some_and(|seq| controller.is_held_for(seq)) {
                    stats.kept_stale += 1;
                } else if controller.adopt(record) {
                    stats.adopted += 1;
                } else {
                    stats.kept_pending += 1;
                }
                merged.push(controller);
            }
            None => {
                stats.added += 1;
                merged.push(TaskController::new(record));
            }
        }
    }

    stats.removed = existing.len();
    (merged, stats)
}
