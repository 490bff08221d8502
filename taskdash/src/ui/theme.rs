//! Colors and text styles shared by the dashboard panels.

use ratatui::style::{Color, Modifier, Style};

use taskdash_proto::{Priority, TaskStatus};

/// Body text.
pub const FG_PRIMARY: Color = Color::White;

/// Labels, metadata and placeholders.
pub const FG_SECONDARY: Color = Color::DarkGray;

/// Focus: selected row, active field, dialog border.
pub const HIGHLIGHT: Color = Color::LightCyan;

/// Done tasks and completion figures.
pub const SUCCESS: Color = Color::Green;

/// In-progress tasks and due-this-week figures.
pub const WARNING: Color = Color::Yellow;

/// Overdue dates and failures.
pub const ERROR: Color = Color::LightRed;

/// App name and the insight suggestion.
pub const ACCENT: Color = Color::LightMagenta;

/// Stat card borders.
pub const STATS_TITLE: Color = Color::Blue;

/// Task list border.
pub const TASKS_TITLE: Color = Color::Green;

const STATUS_BAR_BG: Color = Color::Rgb(24, 28, 40);

#[must_use]
pub fn normal() -> Style {
    Style::default().fg(FG_PRIMARY)
}

#[must_use]
pub fn dimmed() -> Style {
    Style::default().fg(FG_SECONDARY)
}

#[must_use]
pub fn bold() -> Style {
    normal().add_modifier(Modifier::BOLD)
}

/// Focused borders, labels and help keys.
#[must_use]
pub fn highlighted() -> Style {
    Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

/// The selected task row.
#[must_use]
pub fn selected() -> Style {
    Style::default().bg(Color::Rgb(36, 52, 71))
}

#[must_use]
pub fn error() -> Style {
    Style::default().fg(ERROR)
}

/// A finished task's title.
#[must_use]
pub fn done_title() -> Style {
    dimmed().add_modifier(Modifier::CROSSED_OUT)
}

/// A task with a status change in flight.
#[must_use]
pub fn pending_update() -> Style {
    dimmed().add_modifier(Modifier::ITALIC)
}

/// Bottom line: help text and status message.
#[must_use]
pub fn status_bar_bg() -> Style {
    Style::default().fg(FG_PRIMARY).bg(STATUS_BAR_BG)
}

/// Block titles, in the panel's color.
#[must_use]
pub fn panel_title(color: Color) -> Style {
    badge(color)
}

/// Badge color for a priority.
#[must_use]
pub const fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::LightRed,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::LightGreen,
    }
}

/// Badge color for a status.
#[must_use]
pub const fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Pending => Color::LightBlue,
        TaskStatus::InProgress => WARNING,
        TaskStatus::Done => SUCCESS,
    }
}

/// `[HIGH]`, `[DONE]` and similar tags.
#[must_use]
pub fn badge(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}
