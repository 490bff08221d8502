//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::App;

/// Render the status bar at the bottom of the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let help_text = if app.confirmation().is_some() {
        "y: confirm | n: cancel"
    } else if app.task_form.is_some() {
        "Enter: create | Esc: cancel"
    } else if app.editing_search {
        "Enter: apply search | Esc: cancel"
    } else {
        "n: new | space: done | s: status | d: delete | /: search | f/p: filter | o/r: sort | L: logout | q: quit"
    };

    let mut spans = vec![
        Span::styled("TaskDash", theme::bold()),
        Span::raw(" | "),
    ];
    let pending = app.board.pending_count();
    if pending > 0 {
        spans.push(Span::styled(
            format!("{pending} saving"),
            theme::normal().fg(theme::WARNING),
        ));
        spans.push(Span::raw(" | "));
    }
    if let Some(status) = &app.status {
        let style = if status.is_error {
            theme::error()
        } else {
            theme::normal().fg(theme::SUCCESS)
        };
        spans.push(Span::styled(status.text.clone(), style));
        spans.push(Span::raw(" | "));
    }
    spans.push(Span::styled(help_text, theme::dimmed()));

    let paragraph = Paragraph::new(Line::from(spans)).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
