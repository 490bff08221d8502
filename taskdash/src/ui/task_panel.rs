//! Task list rendering.
//!
//! One item per task: checkbox, title, priority and status badges and the
//! due date, then the description. Expanded tasks also show their
//! timestamps. Tasks with an update in flight are drawn dimmed.

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use taskdash_proto::{Task, TaskStatus};

use super::theme;
use crate::app::App;

/// Render the task list.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let tasks = app.visible_tasks();
    let title = if app.is_loading() {
        format!("Tasks ({}) loading...", tasks.len())
    } else {
        format!("Tasks ({})", tasks.len())
    };
    let block = Block::default()
        .title(Span::styled(title, theme::panel_title(theme::TASKS_TITLE)))
        .borders(Borders::ALL)
        .border_style(theme::highlighted());

    if tasks.is_empty() {
        let empty = Text::from(vec![
            Line::from(Span::styled("No tasks found", theme::bold())),
            Line::from(Span::styled(
                "Press n to create your first task",
                theme::dimmed(),
            )),
        ]);
        let paragraph = Paragraph::new(empty)
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = tasks
        .iter()
        .map(|task| ListItem::new(task_text(app, task)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(theme::selected())
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.selected_index()));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Lines for one task.
fn task_text(app: &App, task: &Task) -> Text<'static> {
    let pending = app.is_pending(&task.id);
    let today = app.today();

    let checkbox = if task.status == TaskStatus::Done {
        "[x]"
    } else {
        "[ ]"
    };
    let title_style = if pending {
        theme::pending_update()
    } else if task.status == TaskStatus::Done {
        theme::done_title()
    } else {
        theme::bold()
    };

    let mut header = vec![
        Span::styled(checkbox, theme::normal()),
        Span::raw(" "),
        Span::styled(task.title.clone(), title_style),
        Span::raw(" "),
        Span::styled(
            format!("[{}]", task.priority.as_str().to_uppercase()),
            theme::badge(theme::priority_color(task.priority)),
        ),
        Span::raw(" "),
        Span::styled(
            format!("[{}]", task.status.label()),
            theme::badge(theme::status_color(task.status)),
        ),
    ];
    if let Some(due) = task.due_date {
        header.push(Span::raw("  "));
        if task.is_overdue(today) {
            header.push(Span::styled(
                format!("overdue {}", app.format_date(due)),
                theme::error(),
            ));
        } else {
            header.push(Span::styled(
                format!("due {}", app.format_date(due)),
                theme::dimmed(),
            ));
        }
    }
    if let Some(completed) = task.completed_at {
        header.push(Span::styled(
            format!("  completed {}", app.format_timestamp(completed)),
            theme::normal().fg(theme::SUCCESS),
        ));
    }
    if pending {
        header.push(Span::styled("  saving...", theme::dimmed()));
    }

    let mut lines = vec![Line::from(header)];
    let expanded = app.expanded.contains(&task.id);
    if let Some(description) = task.description_text() {
        if expanded {
            lines.extend(
                description
                    .lines()
                    .map(|l| Line::from(Span::styled(format!("    {l}"), theme::dimmed()))),
            );
        } else if let Some(first) = description.lines().next() {
            lines.push(Line::from(Span::styled(
                format!("    {first}"),
                theme::dimmed(),
            )));
        }
    }
    if expanded {
        lines.push(Line::from(vec![
            Span::styled("    Created: ", theme::dimmed()),
            Span::styled(app.format_timestamp(task.created_at), theme::normal()),
            Span::styled("  Updated: ", theme::dimmed()),
            Span::styled(app.format_timestamp(task.updated_at), theme::normal()),
        ]));
    }
    Text::from(lines)
}
