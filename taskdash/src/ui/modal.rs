//! Dialogs drawn over the dashboard.

use ratatui::{
    Frame,
    layout::Alignment,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use taskdash_proto::{Task, TaskStatus};

use super::{centered, theme};
use crate::app::{App, FormField, TaskForm};

/// Render the "complete a future task?" dialog.
pub fn render_confirmation(frame: &mut Frame, app: &App, task: &Task, target: TaskStatus) {
    let area = centered(frame.area(), 56, 8);
    let due = task
        .due_date
        .map_or_else(String::new, |d| app.format_date(d));

    let lines = vec![
        Line::from(Span::styled(task.title.clone(), theme::bold())),
        Line::from(vec![
            Span::raw("This task is due on "),
            Span::styled(due, theme::bold()),
            Span::raw(format!(". Mark it as {}?", target.as_str())),
        ]),
        Line::raw(""),
        Line::from(vec![
            Span::styled("y", theme::highlighted()),
            Span::raw(": yes, complete   "),
            Span::styled("n", theme::highlighted()),
            Span::raw(": cancel"),
        ]),
    ];

    let block = Block::default()
        .title(Span::styled(
            "Complete Future Task?",
            theme::panel_title(theme::WARNING),
        ))
        .borders(Borders::ALL)
        .border_style(theme::normal().fg(theme::WARNING));
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

/// Render the create-task form.
pub fn render_task_form(frame: &mut Frame, form: &TaskForm) {
    let area = centered(frame.area(), 60, 12);

    let mut lines: Vec<Line> = FormField::ALL
        .into_iter()
        .map(|field| field_line(form, field))
        .collect();
    lines.push(Line::raw(""));
    match (&form.error, form.submitting) {
        (_, true) => lines.push(Line::from(Span::styled("Creating...", theme::dimmed()))),
        (Some(error), false) => {
            lines.push(Line::from(Span::styled(error.clone(), theme::error())));
        }
        (None, false) => lines.push(Line::from(Span::styled(
            "Tab: next field | ←→: priority | Enter: create | Esc: cancel",
            theme::dimmed(),
        ))),
    }

    let block = Block::default()
        .title(Span::styled(
            "Create New Task",
            theme::panel_title(theme::HIGHLIGHT),
        ))
        .borders(Borders::ALL)
        .border_style(theme::highlighted());

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn field_line(form: &TaskForm, field: FormField) -> Line<'static> {
    let focused = form.focus == field;
    let (label, value, placeholder) = match field {
        FormField::Title => ("Title", form.draft.title.clone(), "Enter task title..."),
        FormField::Description => (
            "Description",
            form.draft.description.clone(),
            "Enter task description...",
        ),
        FormField::Priority => (
            "Priority",
            format!("< {} >", form.draft.priority),
            "",
        ),
        FormField::DueDate => ("Due date", form.draft.due_date.clone(), "YYYY-MM-DD"),
    };

    let label_style = if focused {
        theme::highlighted()
    } else {
        theme::dimmed()
    };
    let mut spans = vec![Span::styled(format!("{label:>12}: "), label_style)];
    if value.is_empty() && !focused {
        spans.push(Span::styled(placeholder, theme::dimmed()));
    } else {
        spans.push(Span::styled(value, theme::normal()));
    }
    if focused && field != FormField::Priority {
        spans.push(Span::styled("█", theme::normal()));
    }
    Line::from(spans)
}
