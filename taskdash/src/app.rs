//! Application state and event handling.
//!
//! [`App`] is driven by two inputs: key presses from the terminal and
//! [`ApiEvent`]s from the background worker. Both handlers may return an
//! [`ApiCommand`] for the main loop to forward. Nothing here blocks or
//! touches the network.

use std::collections::HashSet;

use chrono::{DateTime, Local, NaiveDate, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use taskdash_proto::{Analytics, Insights, Priority, Task, TaskFilters, TaskId, TaskStatus, User};

use crate::api::ApiError;
use crate::auth::{self, Session};
use crate::net::{ApiCommand, ApiEvent};
use crate::tasks::{
    Resolution, SortKey, SortOrder, StatusRequest, TaskBoard, TaskDraft, sort_tasks,
};

/// Shown on the login screen when a refresh is rejected for auth reasons.
pub const SESSION_EXPIRED: &str = "Session expired. Please sign in again.";

/// Which screen is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Sign in or sign up.
    Login,
    /// Task list, stats and filters.
    Dashboard,
}

/// Whether the login form signs in or registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    /// Existing account.
    SignIn,
    /// New account; asks for a name too.
    SignUp,
}

/// Focused login field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    /// Display name (sign up only).
    Name,
    /// Email address.
    Email,
    /// Password.
    Password,
}

/// Login screen state.
#[derive(Debug, Clone)]
pub struct LoginForm {
    /// Sign in or sign up.
    pub mode: LoginMode,
    /// Name input.
    pub name: String,
    /// Email input.
    pub email: String,
    /// Password input. Never rendered in clear.
    pub password: String,
    /// Focused field.
    pub focus: LoginField,
    /// Message under the form.
    pub error: Option<String>,
    /// A request is in flight.
    pub submitting: bool,
}

impl LoginForm {
    fn new(email: String) -> Self {
        let focus = if email.is_empty() {
            LoginField::Email
        } else {
            LoginField::Password
        };
        Self {
            mode: LoginMode::SignIn,
            name: String::new(),
            email,
            password: String::new(),
            focus,
            error: None,
            submitting: false,
        }
    }

    /// Fields shown in the current mode, top to bottom.
    #[must_use]
    pub fn fields(&self) -> &'static [LoginField] {
        match self.mode {
            LoginMode::SignIn => &[LoginField::Email, LoginField::Password],
            LoginMode::SignUp => &[LoginField::Name, LoginField::Email, LoginField::Password],
        }
    }

    fn focus_step(&mut self, forward: bool) {
        let fields = self.fields();
        let index = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (index + 1) % fields.len()
        } else {
            (index + fields.len() - 1) % fields.len()
        };
        self.focus = fields[next];
    }

    fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            LoginMode::SignIn => LoginMode::SignUp,
            LoginMode::SignUp => LoginMode::SignIn,
        };
        if !self.fields().contains(&self.focus) {
            self.focus = LoginField::Email;
        }
        self.error = None;
    }

    fn focused_text(&mut self) -> &mut String {
        match self.focus {
            LoginField::Name => &mut self.name,
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }
}

/// Focused create-form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    /// Title.
    Title,
    /// Description.
    Description,
    /// Priority selector.
    Priority,
    /// Due date text.
    DueDate,
}

impl FormField {
    /// Every field, top to bottom.
    pub const ALL: [Self; 4] = [Self::Title, Self::Description, Self::Priority, Self::DueDate];

    const fn next(self) -> Self {
        match self {
            Self::Title => Self::Description,
            Self::Description => Self::Priority,
            Self::Priority => Self::DueDate,
            Self::DueDate => Self::Title,
        }
    }

    const fn prev(self) -> Self {
        match self {
            Self::Title => Self::DueDate,
            Self::Description => Self::Title,
            Self::Priority => Self::Description,
            Self::DueDate => Self::Priority,
        }
    }
}

/// Create-task form state.
#[derive(Debug, Clone)]
pub struct TaskForm {
    /// Raw input.
    pub draft: TaskDraft,
    /// Focused field.
    pub focus: FormField,
    /// Inline error.
    pub error: Option<String>,
    /// The create request is in flight.
    pub submitting: bool,
}

impl TaskForm {
    fn new() -> Self {
        Self {
            draft: TaskDraft::default(),
            focus: FormField::Title,
            error: None,
            submitting: false,
        }
    }
}

/// One-line message at the bottom of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Message text.
    pub text: String,
    /// Rendered as an error.
    pub is_error: bool,
}

/// Refresh bookkeeping: one listing in flight at a time, later requests
/// coalesce into a single follow-up.
#[derive(Debug, Clone, Default)]
struct RefreshState {
    next_seq: u64,
    in_flight: Option<u64>,
    dirty: bool,
    applied: Option<u64>,
}

/// Main application state.
#[allow(clippy::struct_excessive_bools)]
pub struct App {
    /// Current screen.
    pub screen: Screen,
    /// Signed-in user.
    pub user: Option<User>,
    /// Tasks from the last refresh, with local status edits.
    pub board: TaskBoard,
    /// Latest analytics, kept across failed fetches.
    pub analytics: Option<Analytics>,
    /// Latest insights, kept across failed fetches.
    pub insights: Option<Insights>,
    /// Active listing filters.
    pub filters: TaskFilters,
    /// Search text being typed.
    pub search_input: String,
    /// The search box has focus.
    pub editing_search: bool,
    /// List sort key.
    pub sort_key: SortKey,
    /// List sort direction.
    pub sort_order: SortOrder,
    /// Tasks showing their details.
    pub expanded: HashSet<TaskId>,
    /// Create-task form, when open.
    pub task_form: Option<TaskForm>,
    /// Login screen state.
    pub login: LoginForm,
    /// Bottom status message.
    pub status: Option<StatusLine>,
    /// Waiting on the saved-session check.
    pub restoring: bool,
    /// Whether the app should quit.
    pub should_quit: bool,
    selected: Option<TaskId>,
    refresh: RefreshState,
    /// Bumped on every sign-in and sign-out; task commands carry it.
    epoch: u64,
    clock: fn() -> NaiveDate,
    max_task_title_len: usize,
    date_format: String,
    timestamp_format: String,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl App {
    /// Create a new application on the login screen.
    #[must_use]
    pub fn new() -> Self {
        Self {
            screen: Screen::Login,
            user: None,
            board: TaskBoard::new(),
            analytics: None,
            insights: None,
            filters: TaskFilters::default(),
            search_input: String::new(),
            editing_search: false,
            sort_key: SortKey::default(),
            sort_order: SortOrder::default(),
            expanded: HashSet::new(),
            task_form: None,
            login: LoginForm::new(String::new()),
            status: None,
            restoring: false,
            should_quit: false,
            selected: None,
            refresh: RefreshState::default(),
            epoch: 0,
            clock: local_today,
            max_task_title_len: taskdash_proto::MAX_TASK_TITLE_LENGTH,
            date_format: "%Y-%m-%d".to_string(),
            timestamp_format: "%Y-%m-%d %H:%M".to_string(),
        }
    }

    /// Use `clock` for "today" instead of the local date.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> NaiveDate) -> Self {
        self.clock = clock;
        self
    }

    /// Initial sort.
    #[must_use]
    pub const fn with_sort(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort_key = key;
        self.sort_order = order;
        self
    }

    /// Prefill the login email.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.login = LoginForm::new(email.unwrap_or_default());
        self
    }

    /// Set the maximum task title length.
    #[must_use]
    pub const fn with_max_task_title_len(mut self, max: usize) -> Self {
        self.max_task_title_len = max;
        self
    }

    /// Set the chrono formats for due dates and timestamps.
    #[must_use]
    pub fn with_formats(mut self, date_format: String, timestamp_format: String) -> Self {
        self.date_format = date_format;
        self.timestamp_format = timestamp_format;
        self
    }

    /// First command to send: check for a saved session.
    pub const fn start(&mut self) -> ApiCommand {
        self.restoring = true;
        ApiCommand::RestoreSession
    }

    /// Today's date from the app clock.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// "Welcome back" header text.
    #[must_use]
    pub fn greeting(&self) -> String {
        match &self.user {
            Some(user) => format!("Welcome back, {}", user.name),
            None => "Welcome back".to_string(),
        }
    }

    /// Due date in the configured format.
    #[must_use]
    pub fn format_date(&self, date: NaiveDate) -> String {
        date.format(&self.date_format).to_string()
    }

    /// Store timestamp in local time and the configured format.
    #[must_use]
    pub fn format_timestamp(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&Local)
            .format(&self.timestamp_format)
            .to_string()
    }

    /// Board tasks in display order.
    #[must_use]
    pub fn visible_tasks(&self) -> Vec<Task> {
        sort_tasks(&self.board.tasks(), self.sort_key, self.sort_order)
    }

    /// Index of the selected task in [`Self::visible_tasks`].
    #[must_use]
    pub fn selected_index(&self) -> usize {
        self.selected
            .as_ref()
            .and_then(|id| self.visible_tasks().iter().position(|t| &t.id == id))
            .unwrap_or(0)
    }

    /// The selected task, if the list is not empty.
    #[must_use]
    pub fn selected_task(&self) -> Option<Task> {
        let visible = self.visible_tasks();
        let index = self
            .selected
            .as_ref()
            .and_then(|id| visible.iter().position(|t| &t.id == id))
            .unwrap_or(0);
        visible.into_iter().nth(index)
    }

    /// The task awaiting confirmation and its target status.
    #[must_use]
    pub fn confirmation(&self) -> Option<(&Task, TaskStatus)> {
        self.board.awaiting_confirmation()
    }

    /// Sign-in epoch stamped on task commands. Events carrying any other
    /// epoch are dropped.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether a refresh is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.refresh.in_flight.is_some()
    }

    /// Whether the task has a status change in flight.
    #[must_use]
    pub fn is_pending(&self, id: &TaskId) -> bool {
        self.board.get(id).is_some_and(|c| c.is_pending())
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error: false,
        });
    }

    fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error: true,
        });
    }

    // -----------------------------------------------------------------------
    // Refresh
    // -----------------------------------------------------------------------

    /// Ask for a full refresh. While one is in flight the request is
    /// remembered and a single follow-up runs when it completes.
    pub fn request_refresh(&mut self) -> Option<ApiCommand> {
        if self.screen != Screen::Dashboard {
            return None;
        }
        if self.refresh.in_flight.is_some() {
            self.refresh.dirty = true;
            return None;
        }
        let seq = self.refresh.next_seq;
        self.refresh.next_seq += 1;
        self.refresh.in_flight = Some(seq);
        self.refresh.dirty = false;
        tracing::debug!(seq, "refresh requested");
        Some(ApiCommand::Refresh {
            epoch: self.epoch,
            seq,
            filters: self.filters.clone(),
        })
    }

    /// Marks `seq` finished and returns whether its result is current.
    fn finish_refresh(&mut self, seq: u64) -> bool {
        if self.refresh.in_flight == Some(seq) {
            self.refresh.in_flight = None;
        }
        if self.refresh.applied.is_some_and(|applied| seq < applied) {
            tracing::debug!(seq, "discarding stale refresh");
            return false;
        }
        true
    }

    fn follow_up_refresh(&mut self) -> Option<ApiCommand> {
        if self.refresh.dirty {
            self.request_refresh()
        } else {
            None
        }
    }

    // -----------------------------------------------------------------------
    // Worker events
    // -----------------------------------------------------------------------

    /// Apply an event from the API worker.
    pub fn handle_api_event(&mut self, event: ApiEvent) -> Option<ApiCommand> {
        match event {
            ApiEvent::SessionRestored(session) | ApiEvent::SignedIn(session) => {
                self.enter_dashboard(session)
            }
            ApiEvent::SessionUnavailable { reason } => {
                self.restoring = false;
                self.login.error = reason;
                None
            }
            ApiEvent::SignInFailed(error) => {
                self.login.submitting = false;
                self.login.error = Some(auth::failure_message(&error));
                None
            }
            event if self.screen != Screen::Dashboard => {
                tracing::debug!(?event, "ignoring task event while signed out");
                None
            }
            event if event.epoch() != Some(self.epoch) => {
                tracing::debug!(?event, epoch = self.epoch, "ignoring event from an earlier sign-in");
                None
            }
            ApiEvent::Refreshed {
                seq,
                tasks,
                analytics,
                insights,
                ..
            } => {
                if self.finish_refresh(seq) {
                    self.refresh.applied = Some(seq);
                    self.board.apply_refresh(seq, tasks);
                    if analytics.is_some() {
                        self.analytics = analytics;
                    }
                    if insights.is_some() {
                        self.insights = insights;
                    }
                    self.expanded.retain(|id| self.board.get(id).is_some());
                }
                self.follow_up_refresh()
            }
            ApiEvent::RefreshFailed { seq, error, .. } => {
                self.finish_refresh(seq);
                if error.is_auth() {
                    tracing::info!(error = %error, "refresh rejected, signing out");
                    self.sign_out(Some(SESSION_EXPIRED.to_string()));
                    return Some(ApiCommand::Logout);
                }
                self.set_error(format!("Could not load tasks: {}", error.user_message()));
                self.follow_up_refresh()
            }
            ApiEvent::TaskCreated { task, .. } => {
                self.selected = Some(task.id.clone());
                self.board.insert_created(task);
                self.task_form = None;
                self.set_status("Task created");
                self.request_refresh()
            }
            ApiEvent::CreateFailed { error, .. } => {
                if let Some(form) = &mut self.task_form {
                    form.submitting = false;
                    form.error = Some(error.user_message());
                } else {
                    self.set_error(format!("Could not create task: {}", error.user_message()));
                }
                None
            }
            ApiEvent::StatusResolved { id, result, .. } => match self.board.resolve(&id, result) {
                Some(Resolution::Confirmed) => {
                    // Listings already issued were fetched before the change.
                    self.board.hold_until(&id, self.refresh.next_seq);
                    self.request_refresh()
                }
                Some(Resolution::RolledBack(_) | Resolution::Unexpected) | None => None,
            },
            ApiEvent::TaskDeleted { id, .. } => {
                if self.selected.as_ref() == Some(&id) {
                    self.selected = self.neighbour_of(&id);
                }
                self.board.remove(&id);
                self.expanded.remove(&id);
                self.set_status("Task deleted");
                self.request_refresh()
            }
            ApiEvent::DeleteFailed { error, .. } => {
                self.set_error(format!("Could not delete task: {}", error.user_message()));
                None
            }
        }
    }

    /// Undo the bookkeeping for a command the worker never received, as if
    /// it had failed.
    pub fn command_dropped(&mut self, cmd: ApiCommand) {
        let error = ApiError::Network("command queue full".to_string());
        let event = match cmd {
            ApiCommand::RestoreSession => ApiEvent::SessionUnavailable {
                reason: Some(error.user_message()),
            },
            ApiCommand::Login(_) | ApiCommand::Signup(_) => ApiEvent::SignInFailed(error),
            ApiCommand::Refresh { epoch, seq, .. } => ApiEvent::RefreshFailed { epoch, seq, error },
            ApiCommand::CreateTask { epoch, .. } => ApiEvent::CreateFailed { epoch, error },
            ApiCommand::UpdateStatus { epoch, commit } => ApiEvent::StatusResolved {
                epoch,
                id: commit.id,
                result: Err(error),
            },
            ApiCommand::DeleteTask { epoch, id } => ApiEvent::DeleteFailed { epoch, id, error },
            ApiCommand::Logout | ApiCommand::Shutdown => return,
        };
        // A follow-up here would hit the same full queue.
        let _ = self.handle_api_event(event);
    }

    fn enter_dashboard(&mut self, session: Session) -> Option<ApiCommand> {
        self.epoch += 1;
        tracing::info!(user_id = %session.user.id, epoch = self.epoch, "entering dashboard");
        self.restoring = false;
        self.user = Some(session.user);
        self.screen = Screen::Dashboard;
        let email = std::mem::take(&mut self.login.email);
        self.login = LoginForm::new(email);
        self.status = None;
        self.request_refresh()
    }

    /// Drop all session state and return to the login screen.
    fn sign_out(&mut self, reason: Option<String>) {
        self.epoch += 1;
        self.screen = Screen::Login;
        self.user = None;
        self.board.clear();
        self.analytics = None;
        self.insights = None;
        self.filters = TaskFilters::default();
        self.search_input.clear();
        self.editing_search = false;
        self.expanded.clear();
        self.task_form = None;
        self.status = None;
        self.selected = None;
        self.refresh.in_flight = None;
        self.refresh.dirty = false;
        let email = std::mem::take(&mut self.login.email);
        self.login = LoginForm::new(email);
        self.login.error = reason;
    }

    fn neighbour_of(&self, id: &TaskId) -> Option<TaskId> {
        let visible = self.visible_tasks();
        let index = visible.iter().position(|t| &t.id == id)?;
        visible
            .get(index + 1)
            .or_else(|| index.checked_sub(1).and_then(|i| visible.get(i)))
            .map(|t| t.id.clone())
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    /// Handle a key event.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<ApiCommand> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        match self.screen {
            Screen::Login => self.handle_login_key(key),
            Screen::Dashboard => {
                if self.confirmation().is_some() {
                    self.handle_confirm_key(key)
                } else if self.task_form.is_some() {
                    self.handle_form_key(key)
                } else if self.editing_search {
                    self.handle_search_key(key)
                } else {
                    self.handle_dashboard_key(key)
                }
            }
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> Option<ApiCommand> {
        if self.restoring {
            if key.code == KeyCode::Esc {
                self.should_quit = true;
            }
            return None;
        }
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Down => self.login.focus_step(true),
            KeyCode::BackTab | KeyCode::Up => self.login.focus_step(false),
            KeyCode::F(2) => self.login.toggle_mode(),
            KeyCode::Enter => return self.submit_login(),
            KeyCode::Backspace => {
                self.login.focused_text().pop();
            }
            KeyCode::Char(c) => self.login.focused_text().push(c),
            _ => {}
        }
        None
    }

    fn submit_login(&mut self) -> Option<ApiCommand> {
        if self.login.submitting {
            return None;
        }
        let form = &self.login;
        let command = match form.mode {
            LoginMode::SignIn => {
                auth::validate_login(&form.email, &form.password).map(ApiCommand::Login)
            }
            LoginMode::SignUp => auth::validate_signup(&form.name, &form.email, &form.password)
                .map(ApiCommand::Signup),
        };
        match command {
            Ok(command) => {
                self.login.error = None;
                self.login.submitting = true;
                Some(command)
            }
            Err(e) => {
                self.login.error = Some(e.to_string());
                None
            }
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Option<ApiCommand> {
        let id = self.confirmation().map(|(task, _)| task.id.clone())?;
        match key.code {
            KeyCode::Char('y' | 'Y') | KeyCode::Enter => match self.board.confirm(&id) {
                Ok(Some(commit)) => Some(ApiCommand::UpdateStatus {
                    epoch: self.epoch,
                    commit,
                }),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "confirmation for missing task");
                    None
                }
            },
            KeyCode::Char('n' | 'N') | KeyCode::Esc => {
                if let Err(e) = self.board.cancel_confirmation(&id) {
                    tracing::warn!(error = %e, "cancel for missing task");
                }
                None
            }
            _ => None,
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<ApiCommand> {
        let max_title_len = self.max_task_title_len;
        let epoch = self.epoch;
        let form = self.task_form.as_mut()?;
        match key.code {
            KeyCode::Esc => {
                self.task_form = None;
                return None;
            }
            KeyCode::Tab | KeyCode::Down => form.focus = form.focus.next(),
            KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.prev(),
            KeyCode::Enter => {
                if form.submitting {
                    return None;
                }
                return match form.draft.to_new_task(max_title_len) {
                    Ok(fields) => {
                        form.error = None;
                        form.submitting = true;
                        Some(ApiCommand::CreateTask { epoch, fields })
                    }
                    Err(e) => {
                        form.error = Some(e.to_string());
                        None
                    }
                };
            }
            KeyCode::Left if form.focus == FormField::Priority => {
                form.draft.priority = form.draft.priority.prev();
            }
            KeyCode::Right | KeyCode::Char(' ') if form.focus == FormField::Priority => {
                form.draft.priority = form.draft.priority.next();
            }
            KeyCode::Backspace => {
                if let Some(text) = form_text(form) {
                    text.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(text) = form_text(form) {
                    text.push(c);
                }
            }
            _ => {}
        }
        None
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Option<ApiCommand> {
        match key.code {
            KeyCode::Esc => {
                self.editing_search = false;
                self.search_input = self.filters.search.clone().unwrap_or_default();
                None
            }
            KeyCode::Enter => {
                self.editing_search = false;
                let search = self.search_input.trim();
                let search = (!search.is_empty()).then(|| search.to_string());
                if search == self.filters.search {
                    return None;
                }
                self.filters.search = search;
                self.request_refresh()
            }
            KeyCode::Backspace => {
                self.search_input.pop();
                None
            }
            KeyCode::Char(c) => {
                self.search_input.push(c);
                None
            }
            _ => None,
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) -> Option<ApiCommand> {
        let today = self.today();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(-1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(1);
                None
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.selected = self.visible_tasks().first().map(|t| t.id.clone());
                None
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.selected = self.visible_tasks().last().map(|t| t.id.clone());
                None
            }
            KeyCode::Char('n') => {
                self.task_form = Some(TaskForm::new());
                None
            }
            KeyCode::Char(' ' | 'x') => {
                let id = self.selected_task()?.id;
                let request = self.board.toggle_done(&id, today);
                status_command(self.epoch, request.ok()?)
            }
            KeyCode::Char('s') => {
                let id = self.selected_task()?.id;
                let request = self.board.cycle_status(&id, today);
                status_command(self.epoch, request.ok()?)
            }
            KeyCode::Enter => {
                let id = self.selected_task()?.id;
                if !self.expanded.remove(&id) {
                    self.expanded.insert(id);
                }
                None
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                let task = self.selected_task()?;
                tracing::debug!(task_id = %task.id, "delete requested");
                Some(ApiCommand::DeleteTask {
                    epoch: self.epoch,
                    id: task.id,
                })
            }
            KeyCode::Char('/') => {
                self.editing_search = true;
                self.search_input = self.filters.search.clone().unwrap_or_default();
                None
            }
            KeyCode::Char('f') => {
                self.filters.status = next_status_filter(self.filters.status);
                self.request_refresh()
            }
            KeyCode::Char('p') => {
                self.filters.priority = next_priority_filter(self.filters.priority);
                self.request_refresh()
            }
            KeyCode::Char('c') => {
                if self.filters.is_empty() {
                    return None;
                }
                self.filters = TaskFilters::default();
                self.search_input.clear();
                self.request_refresh()
            }
            KeyCode::Char('o') => {
                self.sort_key = self.sort_key.next();
                None
            }
            KeyCode::Char('r') => {
                self.sort_order = self.sort_order.flip();
                None
            }
            KeyCode::Char('R') => self.request_refresh(),
            KeyCode::Char('L') => {
                tracing::info!("logout requested");
                self.sign_out(None);
                Some(ApiCommand::Logout)
            }
            _ => None,
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let visible = self.visible_tasks();
        if visible.is_empty() {
            self.selected = None;
            return;
        }
        let current = self.selected_index();
        let last = visible.len() - 1;
        let next = current.saturating_add_signed(delta).min(last);
        self.selected = Some(visible[next].id.clone());
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

fn status_command(epoch: u64, request: StatusRequest) -> Option<ApiCommand> {
    match request {
        StatusRequest::Commit(commit) => Some(ApiCommand::UpdateStatus { epoch, commit }),
        StatusRequest::NeedsConfirmation(_) | StatusRequest::Ignored => None,
    }
}

fn form_text(form: &mut TaskForm) -> Option<&mut String> {
    match form.focus {
        FormField::Title => Some(&mut form.draft.title),
        FormField::Description => Some(&mut form.draft.description),
        FormField::DueDate => Some(&mut form.draft.due_date),
        FormField::Priority => None,
    }
}

/// All → pending → in progress → done → all.
const fn next_status_filter(current: Option<TaskStatus>) -> Option<TaskStatus> {
    match current {
        None => Some(TaskStatus::Pending),
        Some(TaskStatus::Pending) => Some(TaskStatus::InProgress),
        Some(TaskStatus::InProgress) => Some(TaskStatus::Done),
        Some(TaskStatus::Done) => None,
    }
}

/// All → high → medium → low → all.
const fn next_priority_filter(current: Option<Priority>) -> Option<Priority> {
    match current {
        None => Some(Priority::High),
        Some(Priority::High) => Some(Priority::Medium),
        Some(Priority::Medium) => Some(Priority::Low),
        Some(Priority::Low) => None,
    }
}
