//! Background API worker wiring the TUI to the remote task API.
//!
//! This module bridges the synchronous TUI event loop (crossterm poll-based)
//! with the async API client. It spawns a tokio task that receives
//! [`ApiCommand`]s and runs each one on its own task, so a slow call never
//! holds up the others. Results come back as [`ApiEvent`]s.
//!
//! # Architecture
//!
//! ```text
//! TUI (main thread)  ←── ApiEvent ────  tokio background tasks
//!                     ─── ApiCommand →
//! ```
//!
//! The main thread sends commands and drains events on each tick of the
//! poll-based event loop. The worker also owns the saved session file.
//!
//! Task commands carry the sign-in epoch they were issued under and the
//! matching events echo it, so the UI can drop results that belong to a
//! session that has since ended.

use std::sync::Arc;

use tokio::sync::mpsc;

use taskdash_proto::{
    Analytics, AuthResponse, Insights, LoginRequest, NewTask, SignupRequest, Task, TaskFilters,
    TaskId,
};

use crate::api::{ApiError, AuthApi, InsightsSource, TaskStore};
use crate::auth::{Session, SessionStore};
use crate::tasks::StatusCommit;

/// Commands sent from the TUI main loop to the API worker.
#[derive(Debug)]
pub enum ApiCommand {
    /// Load the saved session and check it is still valid.
    RestoreSession,
    /// Sign in with credentials.
    Login(LoginRequest),
    /// Register and sign in.
    Signup(SignupRequest),
    /// Fetch tasks, analytics and insights together.
    Refresh {
        /// Sign-in epoch, echoed in the result.
        epoch: u64,
        /// Sequence number echoed in the result.
        seq: u64,
        /// Listing filters.
        filters: TaskFilters,
    },
    /// Create a task.
    CreateTask {
        /// Sign-in epoch, echoed in the result.
        epoch: u64,
        /// The create payload.
        fields: NewTask,
    },
    /// Send a status change produced by a task controller.
    UpdateStatus {
        /// Sign-in epoch, echoed in the result.
        epoch: u64,
        /// The change to send.
        commit: StatusCommit,
    },
    /// Delete a task.
    DeleteTask {
        /// Sign-in epoch, echoed in the result.
        epoch: u64,
        /// The task to delete.
        id: TaskId,
    },
    /// Drop the token and forget the saved session.
    Logout,
    /// Stop the worker.
    Shutdown,
}

/// Events sent from the API worker to the TUI main loop.
#[derive(Debug)]
pub enum ApiEvent {
    /// A saved session was found and accepted by the store.
    SessionRestored(Session),
    /// No usable saved session; the user must sign in.
    SessionUnavailable {
        /// Why a saved session was rejected, if there was one.
        reason: Option<String>,
    },
    /// Login or signup succeeded.
    SignedIn(Session),
    /// Login or signup failed.
    SignInFailed(ApiError),
    /// A refresh completed.
    Refreshed {
        /// Epoch from the command.
        epoch: u64,
        /// Sequence number from the command.
        seq: u64,
        /// Tasks in store order.
        tasks: Vec<Task>,
        /// Analytics, if that call succeeded.
        analytics: Option<Analytics>,
        /// Insights, if that call succeeded.
        insights: Option<Insights>,
    },
    /// The task listing failed.
    RefreshFailed {
        /// Epoch from the command.
        epoch: u64,
        /// Sequence number from the command.
        seq: u64,
        /// What went wrong.
        error: ApiError,
    },
    /// A task was created.
    TaskCreated {
        /// Epoch from the command.
        epoch: u64,
        /// The stored record.
        task: Task,
    },
    /// Creating a task failed.
    CreateFailed {
        /// Epoch from the command.
        epoch: u64,
        /// What went wrong.
        error: ApiError,
    },
    /// The store answered a status change.
    StatusResolved {
        /// Epoch from the command.
        epoch: u64,
        /// The task that was updated.
        id: TaskId,
        /// The stored record, or the failure.
        result: Result<Task, ApiError>,
    },
    /// A task was deleted.
    TaskDeleted {
        /// Epoch from the command.
        epoch: u64,
        /// The deleted task.
        id: TaskId,
    },
    /// Deleting a task failed.
    DeleteFailed {
        /// Epoch from the command.
        epoch: u64,
        /// The task that was not deleted.
        id: TaskId,
        /// What went wrong.
        error: ApiError,
    },
}

impl ApiEvent {
    /// The sign-in epoch a task event belongs to. `None` for session events.
    #[must_use]
    pub const fn epoch(&self) -> Option<u64> {
        match self {
            Self::Refreshed { epoch, .. }
            | Self::RefreshFailed { epoch, .. }
            | Self::TaskCreated { epoch, .. }
            | Self::CreateFailed { epoch, .. }
            | Self::StatusResolved { epoch, .. }
            | Self::TaskDeleted { epoch, .. }
            | Self::DeleteFailed { epoch, .. } => Some(*epoch),
            Self::SessionRestored(_)
            | Self::SessionUnavailable { .. }
            | Self::SignedIn(_)
            | Self::SignInFailed(_) => None,
        }
    }
}

/// Default channel capacity for commands and events.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Configuration for the API worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Channel capacity for command/event mpsc channels.
    pub channel_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Spawn the API worker and return channel handles.
///
/// `session` is the saved-session file, or `None` to never persist one.
/// Must be called from within a tokio runtime.
pub fn spawn_api_worker<A>(
    api: Arc<A>,
    session: Option<SessionStore>,
    config: &WorkerConfig,
) -> (mpsc::Sender<ApiCommand>, mpsc::Receiver<ApiEvent>)
where
    A: TaskStore + InsightsSource + AuthApi + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel::<ApiCommand>(config.channel_capacity);
    let (evt_tx, evt_rx) = mpsc::channel::<ApiEvent>(config.channel_capacity);

    let worker = Worker {
        api,
        session: session.map(Arc::new),
        events: evt_tx,
    };
    tokio::spawn(async move {
        command_handler(worker, cmd_rx).await;
    });

    (cmd_tx, evt_rx)
}

/// Shared state cloned into every per-command task.
struct Worker<A> {
    api: Arc<A>,
    session: Option<Arc<SessionStore>>,
    events: mpsc::Sender<ApiEvent>,
}

impl<A> Clone for Worker<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            session: self.session.clone(),
            events: self.events.clone(),
        }
    }
}

/// Background task: receive commands and run each on its own task.
async fn command_handler<A>(worker: Worker<A>, mut cmd_rx: mpsc::Receiver<ApiCommand>)
where
    A: TaskStore + InsightsSource + AuthApi + 'static,
{
    while let Some(cmd) = cmd_rx.recv().await {
        if matches!(cmd, ApiCommand::Shutdown) {
            tracing::info!("api worker shutting down");
            break;
        }
        let worker = worker.clone();
        tokio::spawn(async move {
            worker.run(cmd).await;
        });
    }
}

impl<A> Worker<A>
where
    A: TaskStore + InsightsSource + AuthApi + 'static,
{
    async fn emit(&self, event: ApiEvent) {
        if self.events.send(event).await.is_err() {
            tracing::debug!("event receiver dropped");
        }
    }

    async fn run(&self, cmd: ApiCommand) {
        match cmd {
            ApiCommand::RestoreSession => self.restore_session().await,
            ApiCommand::Login(request) => {
                let result = self.api.login(&request).await;
                self.finish_sign_in(result).await;
            }
            ApiCommand::Signup(request) => {
                let result = self.api.signup(&request).await;
                self.finish_sign_in(result).await;
            }
            ApiCommand::Refresh {
                epoch,
                seq,
                filters,
            } => self.refresh(epoch, seq, &filters).await,
            ApiCommand::CreateTask { epoch, fields } => match self.api.create(&fields).await {
                Ok(task) => self.emit(ApiEvent::TaskCreated { epoch, task }).await,
                Err(error) => {
                    tracing::warn!(error = %error, "create failed");
                    self.emit(ApiEvent::CreateFailed { epoch, error }).await;
                }
            },
            ApiCommand::UpdateStatus { epoch, commit } => {
                let result = self.api.update(&commit.id, &commit.patch()).await;
                self.emit(ApiEvent::StatusResolved {
                    epoch,
                    id: commit.id,
                    result,
                })
                .await;
            }
            ApiCommand::DeleteTask { epoch, id } => match self.api.delete(&id).await {
                Ok(()) => self.emit(ApiEvent::TaskDeleted { epoch, id }).await,
                Err(error) => {
                    tracing::warn!(task_id = %id, error = %error, "delete failed");
                    self.emit(ApiEvent::DeleteFailed { epoch, id, error }).await;
                }
            },
            ApiCommand::Logout => {
                self.api.set_token(None);
                self.forget_session();
                tracing::info!("signed out");
            }
            ApiCommand::Shutdown => {}
        }
    }

    async fn restore_session(&self) {
        let saved = match self.session.as_deref().map(SessionStore::load) {
            Some(Ok(Some(saved))) => saved,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "ignoring unreadable session file");
                self.emit(ApiEvent::SessionUnavailable { reason: None }).await;
                return;
            }
            Some(Ok(None)) | None => {
                self.emit(ApiEvent::SessionUnavailable { reason: None }).await;
                return;
            }
        };

        self.api.set_token(Some(saved.token.clone()));
        match self.api.me().await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "session restored");
                let session = Session {
                    token: saved.token,
                    user,
                };
                self.remember(&session);
                self.emit(ApiEvent::SessionRestored(session)).await;
            }
            Err(error) => {
                tracing::info!(error = %error, "saved session rejected");
                self.api.set_token(None);
                if error.is_auth() {
                    self.forget_session();
                }
                self.emit(ApiEvent::SessionUnavailable {
                    reason: Some(error.user_message()),
                })
                .await;
            }
        }
    }

    async fn finish_sign_in(&self, result: Result<AuthResponse, ApiError>) {
        match result {
            Ok(response) => {
                let session = Session::from(response);
                self.api.set_token(Some(session.token.clone()));
                self.remember(&session);
                tracing::info!(user_id = %session.user.id, "signed in");
                self.emit(ApiEvent::SignedIn(session)).await;
            }
            Err(error) => {
                tracing::info!(error = %error, "sign in failed");
                self.emit(ApiEvent::SignInFailed(error)).await;
            }
        }
    }

    async fn refresh(&self, epoch: u64, seq: u64, filters: &TaskFilters) {
        let (tasks, analytics, insights) =
            tokio::join!(self.api.list(filters), self.api.analytics(), self.api.insights());

        let tasks = match tasks {
            Ok(tasks) => tasks,
            Err(error) => {
                tracing::warn!(seq, error = %error, "refresh failed");
                self.emit(ApiEvent::RefreshFailed { epoch, seq, error })
                    .await;
                return;
            }
        };
        let analytics = analytics
            .inspect_err(|e| tracing::warn!(error = %e, "analytics unavailable"))
            .ok();
        let insights = insights
            .inspect_err(|e| tracing::warn!(error = %e, "insights unavailable"))
            .ok();

        tracing::debug!(seq, count = tasks.len(), "refresh complete");
        self.emit(ApiEvent::Refreshed {
            epoch,
            seq,
            tasks,
            analytics,
            insights,
        })
        .await;
    }

    fn remember(&self, session: &Session) {
        if let Some(store) = &self.session
            && let Err(e) = store.save(session)
        {
            tracing::warn!(error = %e, "could not save session");
        }
    }

    fn forget_session(&self) {
        if let Some(store) = &self.session
            && let Err(e) = store.clear()
        {
            tracing::warn!(error = %e, "could not remove session file");
        }
    }
}
