//! Shared wire definitions for the `TaskDash` task API.
//!
//! Every type here mirrors a JSON body exchanged with the remote API.
//! The client crate never builds request or response JSON by hand.

pub mod analytics;
pub mod auth;
pub mod task;
pub mod timestamp;

pub use analytics::{Analytics, HealthStatus, Insights, PriorityBreakdown, StatusBreakdown};
pub use auth::{AuthResponse, ErrorBody, LoginRequest, SignupRequest, User};
pub use task::{
    MAX_TASK_TITLE_LENGTH, NewTask, ParseEnumError, Priority, Task, TaskFilters, TaskId, TaskPatch,
    TaskStatus,
};
