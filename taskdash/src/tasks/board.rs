//! The dashboard's task list.
//!
//! `TaskBoard` keeps one [`TaskController`] per task in store order and
//! routes status operations to them by id.

use chrono::NaiveDate;

use taskdash_proto::{Task, TaskId, TaskStatus};

use super::TaskError;
use super::controller::{Resolution, StatusCommit, StatusRequest, TaskController};
use super::reconcile::{ReconcileStats, reconcile, reconcile_from};
use crate::api::ApiError;

/// Ordered task controllers.
#[derive(Debug, Clone, Default)]
pub struct TaskBoard {
    entries: Vec<TaskController>,
}

impl TaskBoard {
    /// Creates an empty board.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the board is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Controllers in board order.
    pub fn iter(&self) -> impl Iterator<Item = &TaskController> {
        self.entries.iter()
    }

    /// Displayed records in board order.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.entries.iter().map(|c| c.displayed().clone()).collect()
    }

    /// Looks up a controller.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&TaskController> {
        self.entries.iter().find(|c| c.id() == id)
    }

    fn get_mut(&mut self, id: &TaskId) -> Result<&mut TaskController, TaskError> {
        self.entries
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or_else(|| TaskError::TaskNotFound(id.to_string()))
    }

    /// Merges a full refresh into the board.
    pub fn replace_all(&mut self, records: Vec<Task>) -> ReconcileStats {
        let current = std::mem::take(&mut self.entries);
        let (entries, stats) = reconcile(current, records);
        self.install(entries, stats)
    }

    /// Merges refresh number `seq`, skipping entries held past it.
    pub fn apply_refresh(&mut self, seq: u64, records: Vec<Task>) -> ReconcileStats {
        let current = std::mem::take(&mut self.entries);
        let (entries, stats) = reconcile_from(current, records, seq);
        self.install(entries, stats)
    }

    fn install(&mut self, entries: Vec<TaskController>, stats: ReconcileStats) -> ReconcileStats {
        self.entries = entries;
        tracing::debug!(
            adopted = stats.adopted,
            kept_pending = stats.kept_pending,
            kept_stale = stats.kept_stale,
            added = stats.added,
            removed = stats.removed,
            "board reconciled"
        );
        stats
    }

    /// Routes [`TaskController::hold_until`]. Unknown ids are ignored.
    pub fn hold_until(&mut self, id: &TaskId, seq: u64) {
        if let Ok(controller) = self.get_mut(id) {
            controller.hold_until(seq);
        }
    }

    /// Puts a newly created task at the top.
    ///
    /// A stale entry with the same id is replaced.
    pub fn insert_created(&mut self, task: Task) {
        self.entries.retain(|c| c.id() != &task.id);
        self.entries.insert(0, TaskController::new(task));
    }

    /// Drops a task once the store has deleted it.
    pub fn remove(&mut self, id: &TaskId) -> Option<TaskController> {
        let index = self.entries.iter().position(|c| c.id() == id)?;
        Some(self.entries.remove(index))
    }

    /// Drops every task.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Routes [`TaskController::request_status_change`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::TaskNotFound`] for an unknown id.
    pub fn request_status_change(
        &mut self,
        id: &TaskId,
        target: TaskStatus,
        today: NaiveDate,
    ) -> Result<StatusRequest, TaskError> {
        Ok(self.get_mut(id)?.request_status_change(target, today))
    }

    /// Routes [`TaskController::cycle_status`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::TaskNotFound`] for an unknown id.
    pub fn cycle_status(
        &mut self,
        id: &TaskId,
        today: NaiveDate,
    ) -> Result<StatusRequest, TaskError> {
        Ok(self.get_mut(id)?.cycle_status(today))
    }

    /// Routes [`TaskController::toggle_done`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::TaskNotFound`] for an unknown id.
    pub fn toggle_done(
        &mut self,
        id: &TaskId,
        today: NaiveDate,
    ) -> Result<StatusRequest, TaskError> {
        Ok(self.get_mut(id)?.toggle_done(today))
    }

    /// Routes [`TaskController::confirm`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::TaskNotFound`] for an unknown id.
    pub fn confirm(&mut self, id: &TaskId) -> Result<Option<StatusCommit>, TaskError> {
        Ok(self.get_mut(id)?.confirm())
    }

    /// Routes [`TaskController::cancel_confirmation`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::TaskNotFound`] for an unknown id.
    pub fn cancel_confirmation(&mut self, id: &TaskId) -> Result<(), TaskError> {
        self.get_mut(id)?.cancel_confirmation();
        Ok(())
    }

    /// Routes a store response. Responses for tasks no longer on the board
    /// are dropped and return `None`.
    pub fn resolve(
        &mut self,
        id: &TaskId,
        result: Result<Task, ApiError>,
    ) -> Option<Resolution> {
        match self.get_mut(id) {
            Ok(controller) => Some(controller.resolve(result)),
            Err(_) => {
                tracing::debug!(task_id = %id, "update response for task no longer listed");
                None
            }
        }
    }

    /// The first task awaiting confirmation, with its target.
    #[must_use]
    pub fn awaiting_confirmation(&self) -> Option<(&Task, TaskStatus)> {
        self.entries
            .iter()
            .find_map(|c| c.confirmation_target().map(|t| (c.displayed(), t)))
    }

    /// Number of tasks with a request in flight.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|c| c.is_pending()).count()
    }
}
