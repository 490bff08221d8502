//! In-process implementation of the API traits.
//!
//! Behaves like the remote store for the parts clients can observe: it
//! assigns ids and timestamps, filters listings, issues tokens and checks
//! them on every task call. Failures can be injected per operation, and
//! update calls are recorded so tests can count remote writes.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use taskdash_proto::{
    Analytics, AuthResponse, Insights, LoginRequest, NewTask, SignupRequest, Task, TaskFilters,
    TaskId, TaskPatch, TaskStatus, User,
};

use super::{ApiError, AuthApi, InsightsSource, TaskStore, validate_new_task};

/// Operations that can be made to fail with [`InMemoryApi::fail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `list`
    List,
    /// `create`
    Create,
    /// `update`
    Update,
    /// `delete`
    Delete,
    /// `analytics`
    Analytics,
    /// `insights`
    Insights,
}

/// A registered account.
struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
struct State {
    /// Newest first, like the remote listing.
    tasks: Vec<Task>,
    /// Email -> account.
    accounts: HashMap<String, Account>,
    /// Token -> email.
    tokens: HashMap<String, String>,
    failures: HashMap<Operation, ApiError>,
    update_calls: Vec<(TaskId, TaskPatch)>,
    analytics: Analytics,
    insights: Insights,
}

/// In-memory task store, insights source and auth provider.
#[derive(Default)]
pub struct InMemoryApi {
    state: Mutex<State>,
    token: RwLock<Option<String>>,
}

/// Email of the account created by [`InMemoryApi::signed_in`].
pub const TEST_EMAIL: &str = "test@example.com";

/// Password of the account created by [`InMemoryApi::signed_in`].
pub const TEST_PASSWORD: &str = "secret1";

impl InMemoryApi {
    /// Creates an empty store with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with one account whose token is already in use.
    #[must_use]
    pub fn signed_in() -> Self {
        let api = Self::new();
        let response = api.register("Test User", TEST_EMAIL, TEST_PASSWORD);
        *api.token.write() = Some(response.token);
        api
    }

    /// Registers an account and issues a token for it.
    pub fn register(&self, name: &str, email: &str, password: &str) -> AuthResponse {
        let user = User {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            created_at: Some(Utc::now().to_rfc3339()),
        };
        let mut state = self.state.lock();
        state.accounts.insert(
            email.to_string(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        let token = Uuid::now_v7().to_string();
        state.tokens.insert(token.clone(), email.to_string());
        AuthResponse { token, user }
    }

    /// Inserts an existing record at the end of the listing.
    pub fn seed(&self, task: Task) {
        self.state.lock().tasks.push(task);
    }

    /// Snapshot of every stored task, newest first.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.clone()
    }

    /// Looks up one stored task.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.state.lock().tasks.iter().find(|t| &t.id == id).cloned()
    }

    /// Makes every later call of `op` fail with `error`.
    pub fn fail(&self, op: Operation, error: ApiError) {
        self.state.lock().failures.insert(op, error);
    }

    /// Undoes [`fail`](Self::fail).
    pub fn clear_failure(&self, op: Operation) {
        self.state.lock().failures.remove(&op);
    }

    /// Every update call received, in order, including failed ones.
    #[must_use]
    pub fn update_calls(&self) -> Vec<(TaskId, TaskPatch)> {
        self.state.lock().update_calls.clone()
    }

    /// Replaces the analytics returned by [`InsightsSource::analytics`].
    pub fn set_analytics(&self, analytics: Analytics) {
        self.state.lock().analytics = analytics;
    }

    /// Replaces the insights returned by [`InsightsSource::insights`].
    pub fn set_insights(&self, insights: Insights) {
        self.state.lock().insights = insights;
    }

    /// Current bearer token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Checks the bearer token and any injected failure for `op`.
    fn authorize(&self, state: &State, op: Option<Operation>) -> Result<User, ApiError> {
        let token = self.token.read().clone();
        let email = token
            .as_deref()
            .and_then(|t| state.tokens.get(t))
            .ok_or_else(|| ApiError::Auth("Invalid authentication credentials".to_string()))?;
        let account = state
            .accounts
            .get(email)
            .ok_or_else(|| ApiError::Auth("User not found".to_string()))?;
        if let Some(err) = op.and_then(|op| state.failures.get(&op)) {
            return Err(err.clone());
        }
        Ok(account.user.clone())
    }
}

fn matches_filters(task: &Task, filters: &TaskFilters) -> bool {
    if filters.status.is_some_and(|s| s != task.status) {
        return false;
    }
    if filters.priority.is_some_and(|p| p != task.priority) {
        return false;
    }
    match filters.search.as_deref().map(str::trim) {
        Some(search) if !search.is_empty() => {
            let needle = search.to_lowercase();
            task.title.to_lowercase().contains(&needle)
                || task
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        }
        _ => true,
    }
}

impl TaskStore for InMemoryApi {
    async fn list(&self, filters: &TaskFilters) -> Result<Vec<Task>, ApiError> {
        let state = self.state.lock();
        let user = self.authorize(&state, Some(Operation::List))?;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.user_id.as_deref().is_none_or(|owner| owner == user.id))
            .filter(|t| matches_filters(t, filters))
            .cloned()
            .collect())
    }

    async fn create(&self, fields: &NewTask) -> Result<Task, ApiError> {
        validate_new_task(fields)?;
        let mut state = self.state.lock();
        let user = self.authorize(&state, Some(Operation::Create))?;
        let now = Utc::now();
        let task = Task {
            id: TaskId::new(Uuid::now_v7().to_string()),
            user_id: Some(user.id),
            title: fields.title.clone(),
            description: Some(fields.description.clone()),
            status: fields.status,
            priority: fields.priority,
            due_date: fields.due_date,
            created_at: now,
            updated_at: now,
            completed_at: (fields.status == TaskStatus::Done).then_some(now),
        };
        state.tasks.insert(0, task.clone());
        Ok(task)
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, ApiError> {
        let mut state = self.state.lock();
        state.update_calls.push((id.clone(), patch.clone()));
        self.authorize(&state, Some(Operation::Update))?;
        let task = state
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

        let now = Utc::now();
        if let Some(title) = &patch.title {
            task.title.clone_from(title);
        }
        if let Some(description) = &patch.description {
            task.description = Some(description.clone());
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if patch.due_date.is_some() {
            task.due_date = patch.due_date;
        }
        if let Some(status) = patch.status {
            task.status = status;
            task.completed_at = (status == TaskStatus::Done).then_some(now);
        }
        task.updated_at = now;
        Ok(task.clone())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), ApiError> {
        let mut state = self.state.lock();
        self.authorize(&state, Some(Operation::Delete))?;
        let before = state.tasks.len();
        state.tasks.retain(|t| &t.id != id);
        if state.tasks.len() == before {
            return Err(ApiError::NotFound("Task not found".to_string()));
        }
        Ok(())
    }
}

impl InsightsSource for InMemoryApi {
    async fn analytics(&self) -> Result<Analytics, ApiError> {
        let state = self.state.lock();
        self.authorize(&state, Some(Operation::Analytics))?;
        Ok(state.analytics.clone())
    }

    async fn insights(&self) -> Result<Insights, ApiError> {
        let state = self.state.lock();
        self.authorize(&state, Some(Operation::Insights))?;
        Ok(state.insights.clone())
    }
}

impl AuthApi for InMemoryApi {
    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, ApiError> {
        if self.state.lock().accounts.contains_key(&request.email) {
            return Err(ApiError::Validation("Email already registered".to_string()));
        }
        Ok(self.register(&request.name, &request.email, &request.password))
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let mut state = self.state.lock();
        let user = match state.accounts.get(&request.email) {
            Some(account) if account.password == request.password => account.user.clone(),
            _ => return Err(ApiError::Auth("Invalid email or password".to_string())),
        };
        let token = Uuid::now_v7().to_string();
        state.tokens.insert(token.clone(), request.email.clone());
        Ok(AuthResponse { token, user })
    }

    async fn me(&self) -> Result<User, ApiError> {
        let state = self.state.lock();
        self.authorize(&state, None)
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }
}
