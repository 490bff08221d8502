//! Search, filter and sort bar.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use taskdash_proto::{Priority, TaskStatus};

use super::theme;
use crate::app::App;

/// Render the filter bar.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let search = if app.editing_search {
        Span::styled(format!("{}█", app.search_input), theme::highlighted())
    } else {
        match app.filters.search.as_deref() {
            Some(search) => Span::styled(search.to_string(), theme::normal()),
            None => Span::styled("Search tasks...", theme::dimmed()),
        }
    };

    let status = app.filters.status.map_or("All Status", TaskStatus::label);
    let priority = app.filters.priority.map_or("All Priority", Priority::as_str);

    let line = Line::from(vec![
        Span::styled("/ ", theme::dimmed()),
        search,
        Span::raw("  "),
        Span::styled("status: ", theme::dimmed()),
        Span::styled(status, theme::normal()),
        Span::raw("  "),
        Span::styled("priority: ", theme::dimmed()),
        Span::styled(priority, theme::normal()),
        Span::raw("  "),
        Span::styled("sort: ", theme::dimmed()),
        Span::styled(
            format!("{} {}", app.sort_key.label(), app.sort_order.arrow()),
            theme::normal(),
        ),
    ]);

    let block = Block::default()
        .title("Filters")
        .borders(Borders::ALL)
        .border_style(if app.editing_search {
            theme::highlighted()
        } else {
            theme::normal()
        });

    frame.render_widget(Paragraph::new(line).block(block), area);
}
