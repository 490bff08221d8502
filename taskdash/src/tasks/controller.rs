//! Per-task status mutation state machine.
//!
//! ```text
//! Idle --request(t), gate false--> Committing
//! Idle --request(t), gate true---> AwaitingConfirmation
//! AwaitingConfirmation --cancel--> Idle
//! AwaitingConfirmation --confirm-> Committing
//! Committing --success-----------> Idle   (displayed kept)
//! Committing --failure-----------> Idle   (displayed restored)
//! ```
//!
//! The gate holds when the target is `done` and the due date lies strictly
//! after today. The controller performs no I/O: entering `Committing` hands
//! back a [`StatusCommit`] that the caller sends to the store, and the
//! outcome is fed back through [`TaskController::resolve`].
//!
//! After a confirmed change the caller may hold the controller with
//! [`TaskController::hold_until`] so refreshes issued before the change do
//! not paint the old status back over it.

use chrono::NaiveDate;

use taskdash_proto::{Task, TaskId, TaskPatch, TaskStatus};

use crate::api::{ApiError, TaskStore};

/// Where a controller is in its mutation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// No mutation in progress.
    Idle,
    /// Waiting for the user to confirm completing a future task.
    AwaitingConfirmation {
        /// The status that will be committed on confirmation.
        target: TaskStatus,
    },
    /// An update request is in flight.
    Committing {
        /// The status sent to the store.
        target: TaskStatus,
        /// `displayed` as it was before the optimistic write.
        snapshot: Box<Task>,
    },
}

/// An update the caller must send to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCommit {
    /// The task to update.
    pub id: TaskId,
    /// The new status.
    pub target: TaskStatus,
}

impl StatusCommit {
    /// The update body: only the status field.
    #[must_use]
    pub fn patch(&self) -> TaskPatch {
        TaskPatch::status(self.target)
    }
}

/// Outcome of a status change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusRequest {
    /// A mutation is already in flight; nothing happened.
    Ignored,
    /// The confirmation gate fired; nothing was sent.
    NeedsConfirmation(TaskStatus),
    /// `displayed` was updated optimistically; send this to the store.
    Commit(StatusCommit),
}

/// Outcome of feeding a store response back into a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The store accepted the change; `displayed` is kept.
    Confirmed,
    /// The store rejected the change; `displayed` was restored.
    RolledBack(ApiError),
    /// No mutation was in flight; the response was dropped.
    Unexpected,
}

/// Owns one task's displayed record and its status transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskController {
    displayed: Task,
    phase: Phase,
    /// Refreshes numbered below this predate the last confirmed change.
    held_until: Option<u64>,
}

impl TaskController {
    /// Starts idle, displaying the authoritative record.
    #[must_use]
    pub const fn new(task: Task) -> Self {
        Self {
            displayed: task,
            phase: Phase::Idle,
            held_until: None,
        }
    }

    /// The record currently rendered.
    #[must_use]
    pub const fn displayed(&self) -> &Task {
        &self.displayed
    }

    /// The task id.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.displayed.id
    }

    /// The current phase.
    #[must_use]
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Whether an update request is in flight.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.phase, Phase::Committing { .. })
    }

    /// The target awaiting confirmation, if any.
    #[must_use]
    pub const fn confirmation_target(&self) -> Option<TaskStatus> {
        match self.phase {
            Phase::AwaitingConfirmation { target } => Some(target),
            _ => None,
        }
    }

    /// Whether moving to `target` needs explicit confirmation.
    #[must_use]
    pub fn needs_confirmation(&self, target: TaskStatus, today: NaiveDate) -> bool {
        target == TaskStatus::Done && self.displayed.is_due_after(today)
    }

    /// Requests a move to `target`.
    ///
    /// Ignored while a request is in flight. A request made while a
    /// confirmation is open replaces it.
    pub fn request_status_change(&mut self, target: TaskStatus, today: NaiveDate) -> StatusRequest {
        if self.is_pending() {
            tracing::debug!(task_id = %self.displayed.id, "status change ignored, update in flight");
            return StatusRequest::Ignored;
        }
        if self.needs_confirmation(target, today) {
            self.phase = Phase::AwaitingConfirmation { target };
            return StatusRequest::NeedsConfirmation(target);
        }
        self.phase = Phase::Idle;
        self.commit_status_change(target)
            .map_or(StatusRequest::Ignored, StatusRequest::Commit)
    }

    /// Snapshots `displayed`, writes `target` into it and enters `Committing`.
    ///
    /// Bypasses the confirmation gate. Returns `None` while a request is
    /// already in flight.
    pub fn commit_status_change(&mut self, target: TaskStatus) -> Option<StatusCommit> {
        if self.is_pending() {
            return None;
        }
        let snapshot = Box::new(self.displayed.clone());
        self.displayed.status = target;
        self.phase = Phase::Committing { target, snapshot };
        Some(StatusCommit {
            id: self.displayed.id.clone(),
            target,
        })
    }

    /// Commits the target awaiting confirmation.
    ///
    /// Returns `None` when no confirmation is open.
    pub fn confirm(&mut self) -> Option<StatusCommit> {
        let target = self.confirmation_target()?;
        self.phase = Phase::Idle;
        self.commit_status_change(target)
    }

    /// Closes an open confirmation. `displayed` is untouched.
    pub fn cancel_confirmation(&mut self) {
        if matches!(self.phase, Phase::AwaitingConfirmation { .. }) {
            self.phase = Phase::Idle;
        }
    }

    /// Requests the next status in the cycle.
    pub fn cycle_status(&mut self, today: NaiveDate) -> StatusRequest {
        let target = self.displayed.status.next();
        self.request_status_change(target, today)
    }

    /// Checkbox behaviour: `done` goes back to `pending`, anything else
    /// goes to `done`.
    pub fn toggle_done(&mut self, today: NaiveDate) -> StatusRequest {
        let target = if self.displayed.status == TaskStatus::Done {
            TaskStatus::Pending
        } else {
            TaskStatus::Done
        };
        self.request_status_change(target, today)
    }

    /// Applies the store's answer to the in-flight request.
    pub fn resolve(&mut self, result: Result<Task, ApiError>) -> Resolution {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        let Phase::Committing { target, snapshot } = phase else {
            self.phase = phase;
            tracing::debug!(task_id = %self.displayed.id, "update response with nothing in flight");
            return Resolution::Unexpected;
        };

        match result {
            Ok(_) => {
                tracing::debug!(task_id = %self.displayed.id, status = %target, "status change confirmed");
                Resolution::Confirmed
            }
            Err(error) => {
                tracing::warn!(
                    task_id = %self.displayed.id,
                    status = %target,
                    error = %error,
                    "status change failed, rolling back"
                );
                self.displayed = *snapshot;
                Resolution::RolledBack(error)
            }
        }
    }

    /// Replaces `displayed` with a fresh authoritative record.
    ///
    /// Returns `false`, leaving `displayed` alone, while a request is in
    /// flight or when the record belongs to another task.
    pub fn adopt(&mut self, task: Task) -> bool {
        if self.is_pending() || task.id != self.displayed.id {
            return false;
        }
        self.displayed = task;
        self.held_until = None;
        true
    }

    /// Ignore refreshes numbered below `seq` until the next adopt.
    pub const fn hold_until(&mut self, seq: u64) {
        self.held_until = Some(seq);
    }

    /// Whether refresh number `seq` was issued before the last confirmed
    /// change.
    #[must_use]
    pub fn is_held_for(&self, seq: u64) -> bool {
        self.held_until.is_some_and(|until| seq < until)
    }

    /// Sends `commit` to `store` and resolves with the answer.
    pub async fn run_commit<S: TaskStore>(
        &mut self,
        store: &S,
        commit: &StatusCommit,
    ) -> Resolution {
        let result = store.update(&commit.id, &commit.patch()).await;
        self.resolve(result)
    }
}
