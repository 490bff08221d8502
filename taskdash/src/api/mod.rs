//! Remote API collaborators.
//!
//! Defines the traits the rest of the client talks to:
//! - [`TaskStore`]: create/list/update/delete tasks
//! - [`InsightsSource`]: read-only analytics and insights
//! - [`AuthApi`]: signup, login, current user, bearer token
//!
//! Implementations:
//! - [`http::HttpClient`]: the real JSON-over-HTTP client
//! - [`memory::InMemoryApi`]: in-process store for tests and offline runs

pub mod http;
pub mod memory;

use std::future::Future;

use taskdash_proto::{
    Analytics, AuthResponse, Insights, LoginRequest, NewTask, SignupRequest, Task, TaskFilters,
    TaskId, TaskPatch, User,
};

/// Errors returned by remote API calls.
///
/// Every variant is recoverable. The mutation controller treats all of them
/// alike (rollback); outer layers may react to [`ApiError::Auth`] by
/// returning to the login screen.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request was rejected as invalid (client-side or by the store).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The target resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Missing, expired or invalid credentials.
    #[error("not authenticated: {0}")]
    Auth(String),

    /// Transport failure or timeout.
    #[error("network error: {0}")]
    Network(String),

    /// Any other non-success response.
    #[error("server error {status}: {detail}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Detail text from the response body.
        detail: String,
    },

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The configured base URL cannot be used.
    #[error("invalid API url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Classifies a non-success HTTP status.
    #[must_use]
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        let detail = detail.unwrap_or_else(|| format!("HTTP {status}"));
        match status {
            400 | 422 => Self::Validation(detail),
            401 | 403 => Self::Auth(detail),
            404 => Self::NotFound(detail),
            _ => Self::Server { status, detail },
        }
    }

    /// Whether the session is no longer valid.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Short text suitable for an inline error or status line.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(detail) | Self::NotFound(detail) | Self::Auth(detail) => {
                detail.clone()
            }
            Self::Network(_) => "Connection error. Please try again.".to_string(),
            Self::Server { detail, .. } => format!("Server error: {detail}"),
            Self::Decode(_) => "Unexpected response from server".to_string(),
            Self::InvalidUrl(url) => format!("Invalid API url: {url}"),
        }
    }
}

/// Rejects create payloads the store would refuse.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] when the title is empty or blank.
pub fn validate_new_task(fields: &NewTask) -> Result<(), ApiError> {
    if fields.title.trim().is_empty() {
        return Err(ApiError::Validation("title must not be empty".to_string()));
    }
    Ok(())
}

/// The remote task store.
///
/// The store is authoritative for every task field; callers hold copies.
pub trait TaskStore: Send + Sync {
    /// Lists the user's tasks matching `filters`, in store order.
    fn list(
        &self,
        filters: &TaskFilters,
    ) -> impl Future<Output = Result<Vec<Task>, ApiError>> + Send;

    /// Creates a task and returns the stored record.
    ///
    /// Fails with [`ApiError::Validation`] if the title is empty.
    fn create(&self, fields: &NewTask) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// Applies `patch` and returns the stored record.
    ///
    /// Fails with [`ApiError::NotFound`] for an unknown id and
    /// [`ApiError::Auth`] when unauthenticated.
    fn update(
        &self,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// Deletes a task.
    ///
    /// Fails with [`ApiError::NotFound`] for an unknown id.
    fn delete(&self, id: &TaskId) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Read-only dashboard aggregates. Best-effort, may be stale.
pub trait InsightsSource: Send + Sync {
    /// Aggregate counts.
    fn analytics(&self) -> impl Future<Output = Result<Analytics, ApiError>> + Send;

    /// Textual insights and a suggestion.
    fn insights(&self) -> impl Future<Output = Result<Insights, ApiError>> + Send;
}

/// Account endpoints and the bearer credential attached to every call.
pub trait AuthApi: Send + Sync {
    /// Registers a new account.
    fn signup(
        &self,
        request: &SignupRequest,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    /// Exchanges credentials for a token.
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    /// Returns the user the current token belongs to.
    fn me(&self) -> impl Future<Output = Result<User, ApiError>> + Send;

    /// Replaces the bearer token used for subsequent calls.
    fn set_token(&self, token: Option<String>);
}
