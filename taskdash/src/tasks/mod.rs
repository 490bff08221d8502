//! Task state on the client side.
//!
//! The store owns every task; this module holds local copies for
//! optimistic rendering:
//! - [`controller`]: the per-task status mutation state machine
//! - [`board`]: the ordered set of controllers shown on the dashboard
//! - [`reconcile`]: how a full refresh is merged into the board
//! - [`sort`]: the list comparator
//!
//! It also validates the create-task form before anything is sent.

pub mod board;
pub mod controller;
pub mod reconcile;
pub mod sort;

pub use board::TaskBoard;
pub use controller::{Phase, Resolution, StatusCommit, StatusRequest, TaskController};
pub use reconcile::{ReconcileStats, reconcile, reconcile_from};
pub use sort::{SortKey, SortOrder, compare, sort_tasks};

use chrono::NaiveDate;
use thiserror::Error;

use taskdash_proto::{NewTask, Priority};

/// Errors raised when addressing a task on the board.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    /// No task with the given id is on the board.
    #[error("task not found: {0}")]
    TaskNotFound(String),
}

/// Create-form validation failures, shown inline under the form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    /// Task title cannot be empty.
    #[error("Title is required")]
    TitleEmpty,
    /// Task title exceeds the maximum length.
    #[error("Title is too long (max {max} characters)")]
    TitleTooLong {
        /// The configured limit.
        max: usize,
    },
    /// The due date is not `YYYY-MM-DD`.
    #[error("Due date must be YYYY-MM-DD, got {0:?}")]
    InvalidDueDate(String),
}

/// Raw create-form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    /// Title text.
    pub title: String,
    /// Description text.
    pub description: String,
    /// Selected priority.
    pub priority: Priority,
    /// Due date text; empty for none.
    pub due_date: String,
}

impl TaskDraft {
    /// Validates the draft and builds the create payload.
    ///
    /// New tasks always start `pending`.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::TitleEmpty`] for a blank title,
    /// [`FormError::TitleTooLong`] if it exceeds `max_title_len` characters,
    /// or [`FormError::InvalidDueDate`] for an unparseable date.
    pub fn to_new_task(&self, max_title_len: usize) -> Result<NewTask, FormError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormError::TitleEmpty);
        }
        if title.chars().count() > max_title_len {
            return Err(FormError::TitleTooLong { max: max_title_len });
        }

        let due = self.due_date.trim();
        let due_date = if due.is_empty() {
            None
        } else {
            Some(
                NaiveDate::parse_from_str(due, "%Y-%m-%d")
                    .map_err(|_| FormError::InvalidDueDate(due.to_string()))?,
            )
        };

        Ok(NewTask::new(title)
            .with_description(self.description.trim())
            .with_priority(self.priority)
            .with_due_date(due_date))
    }
}
