//! Terminal UI rendering.

pub mod filter_bar;
pub mod login;
pub mod modal;
pub mod stats;
pub mod status_bar;
pub mod task_panel;
pub mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::{App, Screen};

/// Main draw function for the entire UI.
pub fn draw(frame: &mut Frame, app: &App) {
    match app.screen {
        Screen::Login => login::render(frame, frame.area(), app),
        Screen::Dashboard => draw_dashboard(frame, app),
    }
}

fn draw_dashboard(frame: &mut Frame, app: &App) {
    let insights_height = if app.insights.is_some() { 4 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),               // Header
            Constraint::Length(4),               // Stat cards
            Constraint::Length(insights_height), // Insights
            Constraint::Length(3),               // Filters
            Constraint::Min(3),                  // Tasks
            Constraint::Length(1),               // Status bar
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app);
    stats::render(frame, chunks[1], app);
    if app.insights.is_some() {
        stats::render_insights(frame, chunks[2], app);
    }
    filter_bar::render(frame, chunks[3], app);
    task_panel::render(frame, chunks[4], app);
    status_bar::render(frame, chunks[5], app);

    // Dialogs draw last, over everything else.
    if let Some((task, target)) = app.confirmation() {
        modal::render_confirmation(frame, app, task, target);
    } else if let Some(form) = &app.task_form {
        modal::render_task_form(frame, form);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled("TaskDash", theme::bold().fg(theme::ACCENT)),
        Span::raw("  "),
        Span::styled(app.greeting(), theme::normal()),
    ];
    if let Some(user) = &app.user {
        spans.push(Span::styled(format!(" <{}>", user.email), theme::dimmed()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// A `width` x `height` rect centered in `area`, clamped to fit.
#[must_use]
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
