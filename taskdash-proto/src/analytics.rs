//! Read-only dashboard aggregates.
//!
//! The store computes these; clients only display them. Every field
//! defaults so a partial or older response still decodes.

use serde::{Deserialize, Serialize};

/// Task counts per priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityBreakdown {
    /// High-priority tasks.
    pub high: u32,
    /// Medium-priority tasks.
    pub medium: u32,
    /// Low-priority tasks.
    pub low: u32,
}

/// Task counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusBreakdown {
    /// Pending tasks.
    pub pending: u32,
    /// In-progress tasks.
    #[serde(rename = "in-progress")]
    pub in_progress: u32,
    /// Done tasks.
    pub done: u32,
}

/// Aggregate counts for the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analytics {
    /// All tasks.
    pub total_tasks: u32,
    /// Tasks with status `done`.
    pub completed_tasks: u32,
    /// Tasks with status `in-progress`.
    pub in_progress: u32,
    /// Tasks with status `pending`.
    pub pending: u32,
    /// Unfinished tasks whose due date has passed.
    pub overdue: u32,
    /// Tasks completed today.
    pub done_today: u32,
    /// Tasks completed since the start of the week.
    pub done_this_week: u32,
    /// Percentage of tasks done, one decimal.
    pub completion_rate: f64,
    /// Counts per priority.
    pub priority_breakdown: PriorityBreakdown,
    /// Counts per status.
    pub status_breakdown: StatusBreakdown,
}

/// Short textual insights derived from the analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insights {
    /// One line per observation.
    pub insights: Vec<String>,
    /// A single suggestion; empty when the store has none.
    pub suggestion: String,
    /// Percentage of tasks done.
    pub completion_rate: f64,
    /// Overdue task count.
    pub overdue_count: u32,
    /// Unfinished tasks due between today and the end of the week.
    pub due_this_week: u32,
}

impl Insights {
    /// The suggestion, or `None` when blank.
    #[must_use]
    pub fn suggestion_text(&self) -> Option<&str> {
        Some(self.suggestion.trim()).filter(|s| !s.is_empty())
    }
}

/// Body of the health endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    /// `healthy` when the service is up.
    pub status: String,
    /// Server time, as sent.
    pub timestamp: String,
}

impl HealthStatus {
    /// Whether the service reported itself healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
