//! JSON-over-HTTP client for the task API.
//!
//! Every task, analytics and insights call carries
//! `Authorization: Bearer <token>`. Calls made without a token fail locally
//! with [`ApiError::Auth`] instead of reaching the server.

use std::time::Duration;

use parking_lot::RwLock;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use taskdash_proto::{
    Analytics, AuthResponse, ErrorBody, HealthStatus, Insights, LoginRequest, NewTask,
    SignupRequest, Task, TaskFilters, TaskId, TaskPatch, User,
};

use super::{ApiError, AuthApi, InsightsSource, TaskStore, validate_new_task};

/// HTTP implementation of every API collaborator.
pub struct HttpClient {
    /// Shared connection pool.
    client: Client,
    /// API root; always ends with `/`.
    base: Url,
    /// Current bearer token.
    token: RwLock<Option<String>>,
}

impl HttpClient {
    /// Creates a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if `base_url` is not an absolute
    /// http(s) URL, or [`ApiError::Network`] if the TLS backend cannot be
    /// initialized.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base,
            token: RwLock::new(None),
        })
    }

    /// Sets the initial bearer token.
    #[must_use]
    pub fn with_token(self, token: impl Into<String>) -> Self {
        *self.token.write() = Some(token.into());
        self
    }

    /// Whether a bearer token is set.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.read().is_some()
    }

    /// The API root.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Checks the service health endpoint. Needs no token.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the service is unreachable or answers
    /// with a non-success status.
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = self.endpoint(&["api", "health"])?;
        self.execute_json(self.client.get(url)).await
    }

    /// Builds `base/segment/segment…`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Attaches the bearer token, or fails if there is none.
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.token.read();
        match token.as_deref() {
            Some(token) => Ok(request.bearer_auth(token)),
            None => Err(ApiError::Auth("not signed in".to_string())),
        }
    }

    /// Sends a request and turns non-success statuses into [`ApiError`]s.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message())
            .or_else(|| Some(text.trim().to_string()).filter(|t| !t.is_empty()));
        tracing::debug!(status = status.as_u16(), detail = ?detail, "api request rejected");
        Err(ApiError::from_status(status.as_u16(), detail))
    }

    /// Sends a request and decodes a JSON body.
    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        self.execute(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Maps a `reqwest` transport failure.
fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Network("request timed out".to_string())
    } else {
        ApiError::Network(e.to_string())
    }
}

impl TaskStore for HttpClient {
    async fn list(&self, filters: &TaskFilters) -> Result<Vec<Task>, ApiError> {
        let url = self.endpoint(&["api", "tasks"])?;
        let request = self.authorized(self.client.get(url).query(&filters.to_query()))?;
        let tasks: Vec<Task> = self.execute_json(request).await?;
        tracing::debug!(count = tasks.len(), "listed tasks");
        Ok(tasks)
    }

    async fn create(&self, fields: &NewTask) -> Result<Task, ApiError> {
        validate_new_task(fields)?;
        let url = self.endpoint(&["api", "tasks"])?;
        let request = self.authorized(self.client.post(url).json(fields))?;
        let task: Task = self.execute_json(request).await?;
        tracing::info!(task_id = %task.id, "task created");
        Ok(task)
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, ApiError> {
        let url = self.endpoint(&["api", "tasks", id.as_str()])?;
        let request = self.authorized(self.client.patch(url).json(patch))?;
        let task: Task = self.execute_json(request).await?;
        tracing::debug!(task_id = %id, "task updated");
        Ok(task)
    }

    async fn delete(&self, id: &TaskId) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "tasks", id.as_str()])?;
        let request = self.authorized(self.client.delete(url))?;
        self.execute(request).await?;
        tracing::info!(task_id = %id, "task deleted");
        Ok(())
    }
}

impl InsightsSource for HttpClient {
    async fn analytics(&self) -> Result<Analytics, ApiError> {
        let url = self.endpoint(&["api", "analytics"])?;
        let request = self.authorized(self.client.get(url))?;
        self.execute_json(request).await
    }

    async fn insights(&self) -> Result<Insights, ApiError> {
        let url = self.endpoint(&["api", "insights"])?;
        let request = self.authorized(self.client.get(url))?;
        self.execute_json(request).await
    }
}

impl AuthApi for HttpClient {
    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint(&["api", "auth", "signup"])?;
        self.execute_json(self.client.post(url).json(request)).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint(&["api", "auth", "login"])?;
        self.execute_json(self.client.post(url).json(request)).await
    }

    async fn me(&self) -> Result<User, ApiError> {
        let url = self.endpoint(&["api", "auth", "me"])?;
        let request = self.authorized(self.client.get(url))?;
        self.execute_json(request).await
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }
}
