//! Integration tests for the task mutation controller.
//!
//! Drives `TaskController` and `TaskBoard` against `InMemoryApi`, checking
//! the optimistic write, the confirmation gate for tasks due in the future,
//! rollback on store failure and how a refresh treats in-flight entries.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{Days, NaiveDate, TimeZone, Utc};

use taskdash::api::memory::{InMemoryApi, Operation};
use taskdash::api::{ApiError, TaskStore};
use taskdash::tasks::{Phase, Resolution, StatusRequest, TaskBoard, TaskController};
use taskdash_proto::{Priority, Task, TaskFilters, TaskId, TaskPatch, TaskStatus};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

fn in_days(n: u64) -> Option<NaiveDate> {
    today().checked_add_days(Days::new(n))
}

fn days_ago(n: u64) -> Option<NaiveDate> {
    today().checked_sub_days(Days::new(n))
}

/// A stored task with every field set, so rollbacks can be checked field by
/// field.
fn make_task(id: &str, status: TaskStatus, due_date: Option<NaiveDate>) -> Task {
    let created = Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap();
    let updated = Utc.with_ymd_and_hms(2025, 6, 2, 17, 5, 0).unwrap();
    Task {
        id: TaskId::new(id),
        user_id: None,
        title: format!("task {id}"),
        description: Some("details\nmore details".to_string()),
        status,
        priority: Priority::Medium,
        due_date,
        created_at: created,
        updated_at: updated,
        completed_at: (status == TaskStatus::Done).then_some(updated),
    }
}

/// A signed-in store holding `task`, and an idle controller for it.
fn seeded(task: Task) -> (InMemoryApi, TaskController) {
    let api = InMemoryApi::signed_in();
    api.seed(task.clone());
    (api, TaskController::new(task))
}

fn commit_of(request: StatusRequest) -> taskdash::tasks::StatusCommit {
    match request {
        StatusRequest::Commit(commit) => commit,
        other => panic!("expected a commit, got {other:?}"),
    }
}

// ===========================================================================
// Confirmation gate
// ===========================================================================

#[tokio::test]
async fn done_without_due_date_commits_immediately() {
    let (api, mut controller) = seeded(make_task("a", TaskStatus::Pending, None));

    let commit = commit_of(controller.request_status_change(TaskStatus::Done, today()));
    assert!(controller.is_pending());
    assert_eq!(controller.displayed().status, TaskStatus::Done);

    let resolution = controller.run_commit(&api, &commit).await;
    assert_eq!(resolution, Resolution::Confirmed);
    assert_eq!(api.update_calls().len(), 1);
}

#[tokio::test]
async fn done_with_past_or_current_due_date_commits_immediately() {
    for due in [days_ago(3), Some(today())] {
        let (api, mut controller) = seeded(make_task("a", TaskStatus::InProgress, due));
        let commit = commit_of(controller.request_status_change(TaskStatus::Done, today()));
        assert_eq!(
            controller.run_commit(&api, &commit).await,
            Resolution::Confirmed
        );
        assert_eq!(controller.displayed().status, TaskStatus::Done);
    }
}

#[tokio::test]
async fn future_due_date_waits_for_confirmation() {
    let (api, mut controller) = seeded(make_task("a", TaskStatus::Pending, in_days(1)));

    let request = controller.request_status_change(TaskStatus::Done, today());

    assert_eq!(request, StatusRequest::NeedsConfirmation(TaskStatus::Done));
    assert_eq!(
        controller.phase(),
        &Phase::AwaitingConfirmation {
            target: TaskStatus::Done
        }
    );
    assert_eq!(controller.displayed().status, TaskStatus::Pending);
    assert!(api.update_calls().is_empty());
}

#[tokio::test]
async fn cancel_returns_to_idle_without_remote_call() {
    let original = make_task("a", TaskStatus::Pending, in_days(10));
    let (api, mut controller) = seeded(original.clone());

    controller.request_status_change(TaskStatus::Done, today());
    controller.cancel_confirmation();

    assert_eq!(controller.phase(), &Phase::Idle);
    assert_eq!(controller.displayed(), &original);
    assert!(api.update_calls().is_empty());
    assert_eq!(api.task(&TaskId::new("a")).unwrap().status, TaskStatus::Pending);
}

#[tokio::test]
async fn cycling_into_done_hits_the_gate() {
    let (_api, mut controller) = seeded(make_task("a", TaskStatus::InProgress, in_days(2)));
    assert_eq!(
        controller.cycle_status(today()),
        StatusRequest::NeedsConfirmation(TaskStatus::Done)
    );
}

// ===========================================================================
// Scenarios
// ===========================================================================

#[tokio::test]
async fn future_task_confirmed_sends_exactly_one_update() {
    let (api, mut controller) = seeded(make_task("future", TaskStatus::Pending, in_days(30)));

    assert_eq!(
        controller.request_status_change(TaskStatus::Done, today()),
        StatusRequest::NeedsConfirmation(TaskStatus::Done)
    );
    assert_eq!(controller.displayed().status, TaskStatus::Pending);

    let commit = controller.confirm().expect("confirmation was open");
    assert_eq!(controller.displayed().status, TaskStatus::Done);
    let resolution = controller.run_commit(&api, &commit).await;

    assert_eq!(resolution, Resolution::Confirmed);
    assert_eq!(
        api.update_calls(),
        vec![(TaskId::new("future"), TaskPatch::status(TaskStatus::Done))]
    );
    assert_eq!(controller.displayed().status, TaskStatus::Done);
    assert!(!controller.is_pending());
    assert_eq!(controller.confirmation_target(), None);

    let stored = api.task(&TaskId::new("future")).unwrap();
    assert_eq!(stored.status, TaskStatus::Done);
    assert!(stored.completed_at.is_some());
}

#[tokio::test]
async fn failed_update_reverts_to_in_progress() {
    let original = make_task("nodue", TaskStatus::InProgress, None);
    let (api, mut controller) = seeded(original.clone());
    api.fail(
        Operation::Update,
        ApiError::Network("connection reset".to_string()),
    );

    let commit = commit_of(controller.request_status_change(TaskStatus::Done, today()));
    assert_eq!(controller.displayed().status, TaskStatus::Done);

    let resolution = controller.run_commit(&api, &commit).await;

    assert_eq!(
        resolution,
        Resolution::RolledBack(ApiError::Network("connection reset".to_string()))
    );
    assert_eq!(controller.displayed().status, TaskStatus::InProgress);
    assert!(!controller.is_pending());
}

// ===========================================================================
// Rollback
// ===========================================================================

#[tokio::test]
async fn rollback_restores_every_field() {
    let mut original = make_task("a", TaskStatus::Pending, days_ago(1));
    original.priority = Priority::High;
    original.user_id = Some("someone".to_string());
    let api = InMemoryApi::signed_in();
    let mut controller = TaskController::new(original.clone());

    // Not seeded: the store answers 404.
    let commit = commit_of(controller.cycle_status(today()));
    let resolution = controller.run_commit(&api, &commit).await;

    assert!(matches!(
        resolution,
        Resolution::RolledBack(ApiError::NotFound(_))
    ));
    assert_eq!(controller.displayed(), &original);
    assert_eq!(controller.phase(), &Phase::Idle);
}

#[tokio::test]
async fn every_error_kind_rolls_back() {
    let errors = [
        ApiError::Validation("bad status".to_string()),
        ApiError::NotFound("Task not found".to_string()),
        ApiError::Auth("expired".to_string()),
        ApiError::Network("timed out".to_string()),
        ApiError::Server {
            status: 503,
            detail: "maintenance".to_string(),
        },
        ApiError::Decode("truncated body".to_string()),
    ];
    for error in errors {
        let original = make_task("a", TaskStatus::Done, None);
        let (api, mut controller) = seeded(original.clone());
        api.fail(Operation::Update, error.clone());

        let commit = commit_of(controller.toggle_done(today()));
        assert_eq!(controller.displayed().status, TaskStatus::Pending);
        assert_eq!(
            controller.run_commit(&api, &commit).await,
            Resolution::RolledBack(error)
        );
        assert_eq!(controller.displayed(), &original);
    }
}

#[tokio::test]
async fn failure_is_not_retried() {
    let (api, mut controller) = seeded(make_task("a", TaskStatus::Pending, None));
    api.fail(Operation::Update, ApiError::Network("down".to_string()));

    let commit = commit_of(controller.request_status_change(TaskStatus::InProgress, today()));
    controller.run_commit(&api, &commit).await;

    assert_eq!(api.update_calls().len(), 1);
}

#[tokio::test]
async fn controller_is_usable_again_after_rollback() {
    let (api, mut controller) = seeded(make_task("a", TaskStatus::Pending, None));
    api.fail(Operation::Update, ApiError::Network("down".to_string()));
    let commit = commit_of(controller.request_status_change(TaskStatus::Done, today()));
    controller.run_commit(&api, &commit).await;

    api.clear_failure(Operation::Update);
    let commit = commit_of(controller.request_status_change(TaskStatus::Done, today()));
    assert_eq!(
        controller.run_commit(&api, &commit).await,
        Resolution::Confirmed
    );
    assert_eq!(api.task(&TaskId::new("a")).unwrap().status, TaskStatus::Done);
}

// ===========================================================================
// Concurrency guard
// ===========================================================================

#[tokio::test]
async fn second_request_while_pending_sends_nothing() {
    let (api, mut controller) = seeded(make_task("a", TaskStatus::Pending, None));

    let commit = commit_of(controller.request_status_change(TaskStatus::InProgress, today()));
    assert_eq!(
        controller.request_status_change(TaskStatus::Done, today()),
        StatusRequest::Ignored
    );
    assert_eq!(controller.toggle_done(today()), StatusRequest::Ignored);
    assert_eq!(controller.commit_status_change(TaskStatus::Done), None);

    controller.run_commit(&api, &commit).await;

    assert_eq!(
        api.update_calls(),
        vec![(TaskId::new("a"), TaskPatch::status(TaskStatus::InProgress))]
    );
    assert_eq!(controller.displayed().status, TaskStatus::InProgress);
}

#[tokio::test]
async fn cycle_three_times_returns_to_pending() {
    let (api, mut controller) = seeded(make_task("a", TaskStatus::Pending, None));
    for _ in 0..3 {
        let commit = commit_of(controller.cycle_status(today()));
        assert_eq!(
            controller.run_commit(&api, &commit).await,
            Resolution::Confirmed
        );
    }
    assert_eq!(controller.displayed().status, TaskStatus::Pending);
    assert_eq!(api.update_calls().len(), 3);
}

// ===========================================================================
// Board and reconciliation
// ===========================================================================

#[tokio::test]
async fn refresh_does_not_clobber_in_flight_entry() {
    let api = InMemoryApi::signed_in();
    api.seed(make_task("a", TaskStatus::Pending, None));
    api.seed(make_task("b", TaskStatus::Pending, None));
    let mut board = TaskBoard::new();
    board.replace_all(api.list(&TaskFilters::default()).await.unwrap());

    let a = TaskId::new("a");
    let commit = commit_of(board.request_status_change(&a, TaskStatus::Done, today()).unwrap());

    // The store still says pending; the refresh must not undo the optimistic write.
    let stats = board.replace_all(api.list(&TaskFilters::default()).await.unwrap());
    assert_eq!(stats.kept_pending, 1);
    assert_eq!(stats.adopted, 1);
    assert_eq!(board.get(&a).unwrap().displayed().status, TaskStatus::Done);
    assert!(board.get(&a).unwrap().is_pending());

    let result = api.update(&commit.id, &commit.patch()).await;
    assert_eq!(board.resolve(&a, result), Some(Resolution::Confirmed));

    board.replace_all(api.list(&TaskFilters::default()).await.unwrap());
    let shown = board.get(&a).unwrap().displayed();
    assert_eq!(shown.status, TaskStatus::Done);
    assert!(shown.completed_at.is_some());
}

#[tokio::test]
async fn refresh_during_failed_update_still_rolls_back() {
    let api = InMemoryApi::signed_in();
    let original = make_task("a", TaskStatus::InProgress, None);
    api.seed(original.clone());
    let mut board = TaskBoard::new();
    board.replace_all(api.list(&TaskFilters::default()).await.unwrap());

    let a = TaskId::new("a");
    let commit = commit_of(board.toggle_done(&a, today()).unwrap());
    board.replace_all(api.list(&TaskFilters::default()).await.unwrap());

    api.fail(Operation::Update, ApiError::Network("down".to_string()));
    let result = api.update(&commit.id, &commit.patch()).await;
    assert!(matches!(
        board.resolve(&a, result),
        Some(Resolution::RolledBack(_))
    ));
    assert_eq!(board.get(&a).unwrap().displayed(), &original);
}

#[tokio::test]
async fn board_follows_store_order_and_drops_deleted() {
    let api = InMemoryApi::signed_in();
    for id in ["a", "b", "c"] {
        api.seed(make_task(id, TaskStatus::Pending, None));
    }
    let mut board = TaskBoard::new();
    board.replace_all(api.list(&TaskFilters::default()).await.unwrap());
    assert_eq!(board.len(), 3);

    api.delete(&TaskId::new("b")).await.unwrap();
    let stats = board.replace_all(api.list(&TaskFilters::default()).await.unwrap());

    assert_eq!(stats.removed, 1);
    let ids: Vec<String> = board.iter().map(|c| c.id().to_string()).collect();
    assert_eq!(ids, ["a", "c"]);
}

#[tokio::test]
async fn late_response_for_removed_task_is_dropped() {
    let api = InMemoryApi::signed_in();
    api.seed(make_task("a", TaskStatus::Pending, None));
    let mut board = TaskBoard::new();
    board.replace_all(api.list(&TaskFilters::default()).await.unwrap());

    let a = TaskId::new("a");
    let commit = commit_of(board.cycle_status(&a, today()).unwrap());
    board.remove(&a);

    let result = api.update(&commit.id, &commit.patch()).await;
    assert_eq!(board.resolve(&a, result), None);
    assert!(board.is_empty());
}

#[tokio::test]
async fn board_confirmation_round_trip() {
    let api = InMemoryApi::signed_in();
    api.seed(make_task("f", TaskStatus::Pending, in_days(7)));
    let mut board = TaskBoard::new();
    board.replace_all(api.list(&TaskFilters::default()).await.unwrap());
    let f = TaskId::new("f");

    board.toggle_done(&f, today()).unwrap();
    let (task, target) = board.awaiting_confirmation().unwrap();
    assert_eq!(task.id, f);
    assert_eq!(target, TaskStatus::Done);

    board.cancel_confirmation(&f).unwrap();
    assert!(board.awaiting_confirmation().is_none());

    board.toggle_done(&f, today()).unwrap();
    let commit = board.confirm(&f).unwrap().unwrap();
    assert_eq!(board.pending_count(), 1);
    let result = api.update(&commit.id, &commit.patch()).await;
    board.resolve(&f, result);
    assert_eq!(board.pending_count(), 0);
    assert_eq!(api.update_calls().len(), 1);
}

#[test]
fn unknown_id_is_an_error() {
    let mut board = TaskBoard::new();
    assert!(board.cycle_status(&TaskId::new("ghost"), today()).is_err());
    assert!(board.confirm(&TaskId::new("ghost")).is_err());
}
