//! Stat cards and the insights strip.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Color,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use taskdash_proto::Analytics;

use super::theme;
use crate::app::App;

/// Card label, value and accent color, left to right.
fn cards(analytics: Option<&Analytics>) -> [(&'static str, String, Color); 4] {
    let count = |f: fn(&Analytics) -> u32| {
        analytics.map_or_else(|| "-".to_string(), |a| f(a).to_string())
    };
    [
        ("Total Tasks", count(|a| a.total_tasks), theme::HIGHLIGHT),
        ("Completed", count(|a| a.completed_tasks), theme::SUCCESS),
        (
            "In Progress",
            count(|a| a.status_breakdown.in_progress),
            theme::WARNING,
        ),
        (
            "Pending",
            count(|a| a.status_breakdown.pending),
            Color::LightBlue,
        ),
    ]
}

/// Render the four stat cards.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let cards = cards(app.analytics.as_ref());
    for ((label, value, color), column) in cards.into_iter().zip(columns.iter()) {
        let block = Block::default()
            .title(Span::styled(label, theme::dimmed()))
            .borders(Borders::ALL)
            .border_style(theme::normal().fg(color));
        let value = Line::from(Span::styled(value, theme::badge(color)));
        frame.render_widget(Paragraph::new(value).block(block), *column);
    }
}

/// Render completion rate, overdue and due-this-week counts plus the
/// store's suggestion.
pub fn render_insights(frame: &mut Frame, area: Rect, app: &App) {
    let Some(insights) = &app.insights else {
        return;
    };

    let mut lines = vec![Line::from(vec![
        Span::styled("Completion ", theme::dimmed()),
        Span::styled(
            format!("{:.1}%", insights.completion_rate),
            theme::badge(theme::ACCENT),
        ),
        Span::raw("   "),
        Span::styled("Overdue ", theme::dimmed()),
        Span::styled(
            insights.overdue_count.to_string(),
            theme::badge(theme::ERROR),
        ),
        Span::raw("   "),
        Span::styled("Due this week ", theme::dimmed()),
        Span::styled(
            insights.due_this_week.to_string(),
            theme::badge(theme::WARNING),
        ),
    ])];
    if let Some(suggestion) = insights.suggestion_text() {
        lines.push(Line::from(vec![
            Span::styled("Suggestion: ", theme::badge(theme::ACCENT)),
            Span::styled(suggestion, theme::normal()),
        ]));
    } else if let Some(first) = insights.insights.first() {
        lines.push(Line::from(Span::styled(first.as_str(), theme::dimmed())));
    }

    let block = Block::default()
        .title(Span::styled(
            "Insights",
            theme::panel_title(theme::STATS_TITLE),
        ))
        .borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
