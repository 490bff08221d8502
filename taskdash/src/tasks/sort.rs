//! List ordering for the task panel.
//!
//! Sorting is pure and stable: equal keys keep their input order in both
//! directions. Missing due dates compare as the Unix epoch, so they sort
//! first ascending and last descending.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use taskdash_proto::{ParseEnumError, Task};

/// Field the task list is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Creation time.
    #[default]
    CreatedAt,
    /// Last store write.
    UpdatedAt,
    /// Due date.
    DueDate,
    /// `low < medium < high`.
    Priority,
    /// Title, lexical.
    Title,
    /// `pending < in-progress < done`.
    Status,
}

impl SortKey {
    /// Every key, in the order the UI cycles through them.
    pub const ALL: [Self; 6] = [
        Self::CreatedAt,
        Self::UpdatedAt,
        Self::DueDate,
        Self::Priority,
        Self::Title,
        Self::Status,
    ];

    /// The following key, wrapping around.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::CreatedAt => Self::UpdatedAt,
            Self::UpdatedAt => Self::DueDate,
            Self::DueDate => Self::Priority,
            Self::Priority => Self::Title,
            Self::Title => Self::Status,
            Self::Status => Self::CreatedAt,
        }
    }

    /// Config spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::DueDate => "due_date",
            Self::Priority => "priority",
            Self::Title => "title",
            Self::Status => "status",
        }
    }

    /// Label shown in the filter bar.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreatedAt => "Created",
            Self::UpdatedAt => "Updated",
            Self::DueDate => "Due date",
            Self::Priority => "Priority",
            Self::Title => "Title",
            Self::Status => "Status",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "sort key",
                value: s.to_string(),
            })
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smaller first.
    Asc,
    /// Larger first.
    #[default]
    Desc,
}

impl SortOrder {
    /// The opposite direction.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Config spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Arrow shown next to the sort key.
    #[must_use]
    pub const fn arrow(self) -> &'static str {
        match self {
            Self::Asc => "↑",
            Self::Desc => "↓",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ParseEnumError {
                kind: "sort order",
                value: s.to_string(),
            }),
        }
    }
}

/// Ascending comparison of two tasks on `key`.
#[must_use]
pub fn compare(a: &Task, b: &Task, key: SortKey) -> Ordering {
    match key {
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        // `NaiveDate::default()` is 1970-01-01.
        SortKey::DueDate => a
            .due_date
            .unwrap_or_default()
            .cmp(&b.due_date.unwrap_or_default()),
        SortKey::Priority => a.priority.cmp(&b.priority),
        SortKey::Title => a.title.cmp(&b.title),
        SortKey::Status => a.status.cmp(&b.status),
    }
}

/// Returns `tasks` ordered by `key` in `order`. The input is not touched.
#[must_use]
pub fn sort_tasks(tasks: &[Task], key: SortKey, order: SortOrder) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| match order {
        SortOrder::Asc => compare(a, b, key),
        SortOrder::Desc => compare(b, a, key),
    });
    sorted
}
