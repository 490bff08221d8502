//! Property tests for list ordering and the status mutation laws.
//!
//! Uses proptest to verify:
//! 1. `sort_tasks` is idempotent and returns a permutation of its input.
//! 2. Adjacent results respect the requested direction.
//! 3. Equal keys keep input order in both directions.
//! 4. Missing due dates sort as the epoch.
//! 5. Three status cycles return to the start.
//! 6. The confirmation gate fires exactly for `done` with a future due date.
//! 7. A failed commit restores the displayed record.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::cmp::Ordering;

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

use taskdash::api::ApiError;
use taskdash::tasks::{SortKey, SortOrder, StatusRequest, TaskController, compare, sort_tasks};
use taskdash_proto::{Priority, Task, TaskId, TaskStatus};

// --- Strategies ---

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::ALL.to_vec())
}

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop::sample::select(Priority::ALL.to_vec())
}

fn arb_sort_key() -> impl Strategy<Value = SortKey> {
    prop::sample::select(SortKey::ALL.to_vec())
}

fn arb_sort_order() -> impl Strategy<Value = SortOrder> {
    prop::sample::select(vec![SortOrder::Asc, SortOrder::Desc])
}

/// Due dates within a year of the base date, or none. Small ranges make
/// ties likely, which is what the stability checks need.
fn arb_due_date() -> impl Strategy<Value = Option<NaiveDate>> {
    prop::option::of((0u64..365).prop_map(|n| base_date().checked_add_days(Days::new(n)).unwrap()))
}

fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..20).prop_map(|minutes| {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
    })
}

/// A task without an id; ids are assigned by position.
fn arb_task_fields() -> impl Strategy<Value = Task> {
    (
        prop::sample::select(vec!["alpha", "beta", "gamma", "Beta", ""]),
        arb_status(),
        arb_priority(),
        arb_due_date(),
        arb_timestamp(),
        arb_timestamp(),
    )
        .prop_map(|(title, status, priority, due_date, created_at, updated_at)| Task {
            id: TaskId::new(""),
            user_id: None,
            title: title.to_string(),
            description: None,
            status,
            priority,
            due_date,
            created_at,
            updated_at,
            completed_at: None,
        })
}

/// Tasks with ids `"0"`, `"1"`, ... in input order.
fn arb_tasks() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(arb_task_fields(), 0..24).prop_map(|tasks| {
        tasks
            .into_iter()
            .enumerate()
            .map(|(i, mut task)| {
                task.id = TaskId::new(i.to_string());
                task
            })
            .collect()
    })
}

fn input_index(task: &Task) -> usize {
    task.id.as_str().parse().unwrap()
}

fn ids(tasks: &[Task]) -> Vec<String> {
    tasks.iter().map(|t| t.id.to_string()).collect()
}

proptest! {
    /// Sorting a sorted list changes nothing.
    #[test]
    fn sort_is_idempotent(tasks in arb_tasks(), key in arb_sort_key(), order in arb_sort_order()) {
        let once = sort_tasks(&tasks, key, order);
        let twice = sort_tasks(&once, key, order);
        prop_assert_eq!(once, twice);
    }

    /// The result holds exactly the input tasks.
    #[test]
    fn sort_is_a_permutation(tasks in arb_tasks(), key in arb_sort_key(), order in arb_sort_order()) {
        let sorted = sort_tasks(&tasks, key, order);
        let mut got = ids(&sorted);
        let mut want = ids(&tasks);
        got.sort();
        want.sort();
        prop_assert_eq!(got, want);
    }

    /// Ascending never has a larger key before a smaller one; descending
    /// never the reverse.
    #[test]
    fn adjacent_pairs_follow_order(tasks in arb_tasks(), key in arb_sort_key(), order in arb_sort_order()) {
        let sorted = sort_tasks(&tasks, key, order);
        for pair in sorted.windows(2) {
            let ordering = compare(&pair[0], &pair[1], key);
            match order {
                SortOrder::Asc => prop_assert_ne!(ordering, Ordering::Greater),
                SortOrder::Desc => prop_assert_ne!(ordering, Ordering::Less),
            }
        }
    }

    /// Ties keep their input order regardless of direction.
    #[test]
    fn equal_keys_keep_input_order(tasks in arb_tasks(), key in arb_sort_key(), order in arb_sort_order()) {
        let sorted = sort_tasks(&tasks, key, order);
        for pair in sorted.windows(2) {
            if compare(&pair[0], &pair[1], key) == Ordering::Equal {
                prop_assert!(input_index(&pair[0]) < input_index(&pair[1]));
            }
        }
    }

    /// Undated tasks come first ascending and last descending.
    #[test]
    fn missing_due_date_sorts_as_epoch(tasks in arb_tasks()) {
        let asc = sort_tasks(&tasks, SortKey::DueDate, SortOrder::Asc);
        let first_dated = asc.iter().position(|t| t.due_date.is_some()).unwrap_or(asc.len());
        prop_assert!(asc[first_dated..].iter().all(|t| t.due_date.is_some()));

        let desc = sort_tasks(&tasks, SortKey::DueDate, SortOrder::Desc);
        let first_undated = desc.iter().position(|t| t.due_date.is_none()).unwrap_or(desc.len());
        prop_assert!(desc[first_undated..].iter().all(|t| t.due_date.is_none()));
    }

    /// `next` applied three times is the identity.
    #[test]
    fn status_cycle_has_period_three(status in arb_status()) {
        prop_assert_eq!(status.next().next().next(), status);
        prop_assert_ne!(status.next(), status);
    }

    /// The gate fires iff the target is `done` and the due date is after today.
    #[test]
    fn confirmation_gate(
        task in arb_task_fields(),
        target in arb_status(),
        offset in 0u64..365,
    ) {
        let today = base_date().checked_add_days(Days::new(offset)).unwrap();
        let mut controller = TaskController::new(task.clone());
        let request = controller.request_status_change(target, today);

        let gated = target == TaskStatus::Done && task.due_date.is_some_and(|due| due > today);
        if gated {
            prop_assert_eq!(request, StatusRequest::NeedsConfirmation(target));
            prop_assert_eq!(controller.displayed(), &task);
            prop_assert!(!controller.is_pending());
        } else {
            prop_assert!(matches!(request, StatusRequest::Commit(_)), "expected commit");
            prop_assert_eq!(controller.displayed().status, target);
            prop_assert!(controller.is_pending());
        }
    }

    /// Whatever was committed, a failure puts back the original record.
    #[test]
    fn failed_commit_restores_record(task in arb_task_fields(), target in arb_status()) {
        let mut controller = TaskController::new(task.clone());
        let commit = controller.commit_status_change(target).unwrap();
        prop_assert_eq!(commit.target, target);

        controller.resolve(Err(ApiError::Network("down".to_string())));

        prop_assert_eq!(controller.displayed(), &task);
        prop_assert!(!controller.is_pending());
    }
}
