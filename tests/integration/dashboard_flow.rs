//! End-to-end dashboard flows: `App` wired to the API worker over an
//! `InMemoryApi`, driven by key events the way the terminal loop drives it.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate, TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use taskdash::api::memory::{InMemoryApi, Operation, TEST_EMAIL, TEST_PASSWORD};
use taskdash::api::{ApiError, AuthApi};
use taskdash::app::{App, SESSION_EXPIRED, Screen};
use taskdash::auth::{Session, SessionStore};
use taskdash::net::{ApiCommand, ApiEvent, WorkerConfig, spawn_api_worker};
use taskdash_proto::{Priority, Task, TaskId, TaskPatch, TaskStatus};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

fn in_days(n: u64) -> Option<NaiveDate> {
    today().checked_add_days(Days::new(n))
}

/// A stored task; `minute` orders creation so the newest is listed first.
fn make_task(id: &str, minute: u32, status: TaskStatus, due_date: Option<NaiveDate>) -> Task {
    let at = Utc.with_ymd_and_hms(2025, 6, 1, 9, minute, 0).unwrap();
    Task {
        id: TaskId::new(id),
        user_id: None,
        title: format!("task {id}"),
        description: None,
        status,
        priority: Priority::Medium,
        due_date,
        created_at: at,
        updated_at: at,
        completed_at: None,
    }
}

/// An app and a live worker, pumped by hand.
struct Harness {
    app: App,
    api: Arc<InMemoryApi>,
    tx: mpsc::Sender<ApiCommand>,
    rx: mpsc::Receiver<ApiEvent>,
}

impl Harness {
    fn new(api: Arc<InMemoryApi>, session: Option<SessionStore>) -> Self {
        let (tx, rx) = spawn_api_worker(Arc::clone(&api), session, &WorkerConfig::default());
        Self {
            app: App::new().with_clock(today),
            api,
            tx,
            rx,
        }
    }

    async fn send(&mut self, cmd: Option<ApiCommand>) {
        if let Some(cmd) = cmd {
            self.tx.send(cmd).await.expect("worker stopped");
        }
    }

    async fn press(&mut self, code: KeyCode) {
        let cmd = self
            .app
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
        self.send(cmd).await;
    }

    async fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.press(KeyCode::Char(c)).await;
        }
    }

    /// Applies worker events, forwarding follow-up commands, until `done`
    /// holds.
    async fn until(&mut self, done: impl Fn(&App) -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !done(&self.app) {
            let event = tokio::time::timeout_at(deadline, self.rx.recv())
                .await
                .expect("timed out waiting for app state")
                .expect("worker event channel closed");
            let cmd = self.app.handle_api_event(event);
            self.send(cmd).await;
        }
    }

    async fn settle(&mut self) {
        self.until(|app| !app.is_loading() && app.board.pending_count() == 0)
            .await;
    }

    /// Signs in through the login form with the given credentials.
    async fn sign_in(&mut self, email: &str, password: &str) {
        let start = self.app.start();
        self.send(Some(start)).await;
        self.until(|app| !app.restoring).await;

        self.type_text(email).await;
        self.press(KeyCode::Tab).await;
        self.type_text(password).await;
        self.press(KeyCode::Enter).await;
        self.until(|app| app.screen == Screen::Dashboard || !app.login.submitting)
            .await;
        self.settle().await;
    }

    fn displayed(&self, id: &TaskId) -> Task {
        self.app.board.get(id).unwrap().displayed().clone()
    }
}

/// Polls `check` until it holds, for effects with no event of their own.
async fn eventually(check: impl Fn() -> bool) {
    for _ in 0..100 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition never held");
}

async fn signed_in_with(tasks: Vec<Task>) -> Harness {
    let api = Arc::new(InMemoryApi::signed_in());
    for task in tasks {
        api.seed(task);
    }
    let mut h = Harness::new(api, None);
    h.sign_in(TEST_EMAIL, TEST_PASSWORD).await;
    assert_eq!(h.app.screen, Screen::Dashboard);
    h
}

// ===========================================================================
// Sign in
// ===========================================================================

#[tokio::test]
async fn login_loads_dashboard() {
    let api = Arc::new(InMemoryApi::new());
    api.register("Ada", "ada@example.com", "secret1");
    api.seed(make_task("a", 1, TaskStatus::Pending, None));
    api.seed(make_task("b", 2, TaskStatus::Done, None));
    let mut h = Harness::new(api, None);

    h.sign_in("ada@example.com", "secret1").await;

    assert_eq!(h.app.screen, Screen::Dashboard);
    assert_eq!(h.app.greeting(), "Welcome back, Ada");
    assert_eq!(h.app.board.len(), 2);
    assert!(h.app.analytics.is_some());
    assert!(h.app.insights.is_some());
    // created_at descending by default
    let ids: Vec<String> = h.app.visible_tasks().iter().map(|t| t.id.to_string()).collect();
    assert_eq!(ids, ["b", "a"]);
}

#[tokio::test]
async fn wrong_password_stays_on_login() {
    let api = Arc::new(InMemoryApi::signed_in());
    let mut h = Harness::new(api, None);

    h.sign_in(TEST_EMAIL, "wrong-password").await;

    assert_eq!(h.app.screen, Screen::Login);
    assert_eq!(h.app.login.error.as_deref(), Some("Invalid email or password"));
    assert!(!h.app.login.submitting);
}

#[tokio::test]
async fn signup_enters_dashboard() {
    let api = Arc::new(InMemoryApi::new());
    let mut h = Harness::new(Arc::clone(&api), None);
    let start = h.app.start();
    h.send(Some(start)).await;
    h.until(|app| !app.restoring).await;

    h.press(KeyCode::F(2)).await;
    h.press(KeyCode::BackTab).await;
    h.type_text("Grace").await;
    h.press(KeyCode::Tab).await;
    h.type_text("grace@example.com").await;
    h.press(KeyCode::Tab).await;
    h.type_text("hopper1").await;
    h.press(KeyCode::Enter).await;
    h.until(|app| app.screen == Screen::Dashboard).await;
    h.settle().await;

    assert_eq!(h.app.greeting(), "Welcome back, Grace");
    assert!(h.app.board.is_empty());
}

// ===========================================================================
// Status changes
// ===========================================================================

#[tokio::test]
async fn toggle_updates_store_and_refreshes() {
    let mut h = signed_in_with(vec![make_task("a", 1, TaskStatus::Pending, None)]).await;
    let id = TaskId::new("a");

    h.press(KeyCode::Char(' ')).await;
    assert!(h.app.is_pending(&id));
    assert_eq!(h.displayed(&id).status, TaskStatus::Done);

    h.settle().await;

    assert!(!h.app.is_pending(&id));
    assert_eq!(h.api.task(&id).unwrap().status, TaskStatus::Done);
    // the refresh after the update brought back the store's completion time
    assert!(h.displayed(&id).completed_at.is_some());
}

#[tokio::test]
async fn future_task_asks_before_completing() {
    let mut h = signed_in_with(vec![make_task("f", 1, TaskStatus::Pending, in_days(30))]).await;
    let id = TaskId::new("f");

    h.press(KeyCode::Char(' ')).await;
    let (task, target) = h.app.confirmation().unwrap();
    assert_eq!(task.id, id);
    assert_eq!(target, TaskStatus::Done);
    assert_eq!(h.displayed(&id).status, TaskStatus::Pending);
    assert!(h.api.update_calls().is_empty());

    h.press(KeyCode::Char('y')).await;
    assert!(h.app.confirmation().is_none());
    h.settle().await;

    assert_eq!(
        h.api.update_calls(),
        vec![(id.clone(), TaskPatch::status(TaskStatus::Done))]
    );
    assert_eq!(h.displayed(&id).status, TaskStatus::Done);
}

#[tokio::test]
async fn declining_confirmation_changes_nothing() {
    let mut h = signed_in_with(vec![make_task("f", 1, TaskStatus::InProgress, in_days(3))]).await;
    let id = TaskId::new("f");

    h.press(KeyCode::Char('s')).await;
    assert!(h.app.confirmation().is_some());
    h.press(KeyCode::Char('n')).await;

    assert!(h.app.confirmation().is_none());
    assert_eq!(h.displayed(&id).status, TaskStatus::InProgress);
    assert!(h.api.update_calls().is_empty());
    assert!(!h.app.is_loading());
}

#[tokio::test]
async fn failed_update_rolls_back_silently() {
    let mut h = signed_in_with(vec![make_task("a", 1, TaskStatus::Pending, None)]).await;
    let id = TaskId::new("a");
    let before = h.displayed(&id);
    h.api
        .fail(Operation::Update, ApiError::Network("reset".to_string()));

    h.press(KeyCode::Char('s')).await;
    assert_eq!(h.displayed(&id).status, TaskStatus::InProgress);
    h.settle().await;

    assert_eq!(h.displayed(&id), before);
    assert!(h.app.status.is_none());
    assert!(!h.app.is_loading());
    assert_eq!(h.api.update_calls().len(), 1);
}

#[tokio::test]
async fn keys_while_pending_do_not_send_again() {
    let mut h = signed_in_with(vec![make_task("a", 1, TaskStatus::Pending, None)]).await;

    h.press(KeyCode::Char('s')).await;
    h.press(KeyCode::Char('s')).await;
    h.press(KeyCode::Char(' ')).await;
    h.settle().await;

    assert_eq!(h.api.update_calls().len(), 1);
    assert_eq!(
        h.displayed(&TaskId::new("a")).status,
        TaskStatus::InProgress
    );
}

// ===========================================================================
// Create and delete
// ===========================================================================

#[tokio::test]
async fn create_form_adds_task() {
    let mut h = signed_in_with(vec![make_task("a", 1, TaskStatus::Pending, None)]).await;

    h.press(KeyCode::Char('n')).await;
    h.type_text("Ship release").await;
    h.press(KeyCode::Tab).await;
    h.type_text("tag and publish").await;
    h.press(KeyCode::Tab).await;
    h.press(KeyCode::Right).await;
    h.press(KeyCode::Enter).await;
    h.until(|app| app.task_form.is_none()).await;
    h.settle().await;

    assert_eq!(h.app.board.len(), 2);
    let created = h.app.selected_task().unwrap();
    assert_eq!(created.title, "Ship release");
    assert_eq!(created.priority, Priority::High);
    assert_eq!(created.status, TaskStatus::Pending);
    assert_eq!(h.app.status.as_ref().unwrap().text, "Task created");
    assert_eq!(h.api.tasks().len(), 2);
}

#[tokio::test]
async fn failed_create_keeps_form_open() {
    let mut h = signed_in_with(Vec::new()).await;
    h.api
        .fail(Operation::Create, ApiError::Network("down".to_string()));

    h.press(KeyCode::Char('n')).await;
    h.type_text("Doomed").await;
    h.press(KeyCode::Enter).await;
    h.until(|app| app.task_form.as_ref().is_some_and(|f| !f.submitting))
        .await;

    let form = h.app.task_form.as_ref().unwrap();
    assert_eq!(
        form.error.as_deref(),
        Some("Connection error. Please try again.")
    );
    assert_eq!(form.draft.title, "Doomed");
    assert!(h.app.board.is_empty());
}

#[tokio::test]
async fn blank_title_is_caught_before_sending() {
    let mut h = signed_in_with(Vec::new()).await;

    h.press(KeyCode::Char('n')).await;
    h.press(KeyCode::Enter).await;

    let form = h.app.task_form.as_ref().unwrap();
    assert_eq!(form.error.as_deref(), Some("Title is required"));
    assert!(!form.submitting);
    assert!(h.api.tasks().is_empty());
}

#[tokio::test]
async fn delete_removes_task_without_confirmation() {
    let mut h = signed_in_with(vec![
        make_task("a", 1, TaskStatus::Pending, None),
        make_task("b", 2, TaskStatus::Pending, None),
    ])
    .await;
    let b = TaskId::new("b");
    assert_eq!(h.app.selected_task().unwrap().id, b);

    h.press(KeyCode::Char('d')).await;
    h.until(|app| app.board.get(&TaskId::new("b")).is_none()).await;
    h.settle().await;

    assert!(h.api.task(&b).is_none());
    assert_eq!(h.app.selected_task().unwrap().id, TaskId::new("a"));
    assert_eq!(h.app.status.as_ref().unwrap().text, "Task deleted");
}

// ===========================================================================
// Filters
// ===========================================================================

#[tokio::test]
async fn status_filter_queries_the_store() {
    let mut h = signed_in_with(vec![
        make_task("p", 1, TaskStatus::Pending, None),
        make_task("i", 2, TaskStatus::InProgress, None),
        make_task("d", 3, TaskStatus::Done, None),
    ])
    .await;

    h.press(KeyCode::Char('f')).await;
    h.settle().await;
    let ids: Vec<String> = h.app.board.iter().map(|c| c.id().to_string()).collect();
    assert_eq!(ids, ["p"]);

    h.press(KeyCode::Char('c')).await;
    h.settle().await;
    assert_eq!(h.app.board.len(), 3);
}

#[tokio::test]
async fn search_filters_by_title() {
    let mut a = make_task("a", 1, TaskStatus::Pending, None);
    a.title = "Buy milk".to_string();
    let mut b = make_task("b", 2, TaskStatus::Pending, None);
    b.title = "Write report".to_string();
    let mut h = signed_in_with(vec![a, b]).await;

    h.press(KeyCode::Char('/')).await;
    h.type_text("  MILK ").await;
    h.press(KeyCode::Enter).await;
    h.settle().await;

    assert_eq!(h.app.filters.search.as_deref(), Some("MILK"));
    assert_eq!(h.app.board.len(), 1);
    assert_eq!(h.app.board.tasks()[0].title, "Buy milk");
}

// ===========================================================================
// Session
// ===========================================================================

#[tokio::test]
async fn rejected_token_returns_to_login() {
    let mut h = signed_in_with(vec![make_task("a", 1, TaskStatus::Pending, None)]).await;
    h.api.set_token(Some("revoked".to_string()));

    h.press(KeyCode::Char('R')).await;
    h.until(|app| app.screen == Screen::Login).await;

    assert_eq!(h.app.login.error.as_deref(), Some(SESSION_EXPIRED));
    assert!(h.app.board.is_empty());
    assert!(h.app.user.is_none());
    let api = Arc::clone(&h.api);
    eventually(|| api.token().is_none()).await;
}

#[tokio::test]
async fn saved_session_skips_login() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("session.json"));
    let api = Arc::new(InMemoryApi::new());
    let response = api.register("Ada", "ada@example.com", "secret1");
    api.seed(make_task("a", 1, TaskStatus::Pending, None));
    store.save(&Session::from(response)).unwrap();

    let mut h = Harness::new(Arc::clone(&api), Some(store.clone()));
    let start = h.app.start();
    h.send(Some(start)).await;
    h.until(|app| app.screen == Screen::Dashboard).await;
    h.settle().await;

    assert_eq!(h.app.greeting(), "Welcome back, Ada");
    assert_eq!(h.app.board.len(), 1);

    h.press(KeyCode::Char('L')).await;
    assert_eq!(h.app.screen, Screen::Login);
    let path = store.path().to_path_buf();
    eventually(|| !path.exists()).await;
    assert!(api.token().is_none());
}

#[tokio::test]
async fn stale_saved_session_is_forgotten() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("session.json"));
    let api = Arc::new(InMemoryApi::signed_in());
    let mut session = Session::from(api.register("Ada", "ada@example.com", "secret1"));
    session.token = "expired".to_string();
    store.save(&session).unwrap();

    let mut h = Harness::new(api, Some(store.clone()));
    let start = h.app.start();
    h.send(Some(start)).await;
    h.until(|app| !app.restoring).await;

    assert_eq!(h.app.screen, Screen::Login);
    assert!(h.app.login.error.is_some());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn login_remembers_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("session.json"));
    let api = Arc::new(InMemoryApi::signed_in());
    let mut h = Harness::new(api, Some(store.clone()));

    h.sign_in(TEST_EMAIL, TEST_PASSWORD).await;

    let saved = store.load().unwrap().expect("session saved");
    assert_eq!(saved.user.email, TEST_EMAIL);
}
