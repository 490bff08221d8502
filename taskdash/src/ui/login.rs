//! Login and signup screen.

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::{centered, theme};
use crate::app::{App, LoginField, LoginForm, LoginMode};

/// Render the login screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let form = &app.login;
    let title = match form.mode {
        LoginMode::SignIn => "Sign in to TaskDash",
        LoginMode::SignUp => "Create an account",
    };

    let mut lines = vec![Line::raw("")];
    if app.restoring {
        lines.push(Line::from(Span::styled(
            "Checking saved session...",
            theme::dimmed(),
        )));
    } else {
        lines.extend(form.fields().iter().map(|field| field_line(form, *field)));
        lines.push(Line::raw(""));
        if form.submitting {
            lines.push(Line::from(Span::styled("Signing in...", theme::dimmed())));
        } else if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(error.clone(), theme::error())));
        }
        lines.push(Line::raw(""));
        let switch = match form.mode {
            LoginMode::SignIn => "F2: sign up instead",
            LoginMode::SignUp => "F2: sign in instead",
        };
        lines.push(Line::from(Span::styled(
            format!("Tab: next field | Enter: submit | {switch} | Esc: quit"),
            theme::dimmed(),
        )));
    }

    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_add(2);
    let rect = centered(area, 64, height);
    let block = Block::default()
        .title(Span::styled(title, theme::panel_title(theme::ACCENT)))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(theme::highlighted());

    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

fn field_line(form: &LoginForm, field: LoginField) -> Line<'static> {
    let focused = form.focus == field;
    let (label, value) = match field {
        LoginField::Name => ("Name", form.name.clone()),
        LoginField::Email => ("Email", form.email.clone()),
        LoginField::Password => ("Password", mask(&form.password)),
    };
    let label_style = if focused {
        theme::highlighted()
    } else {
        theme::dimmed()
    };
    let mut spans = vec![
        Span::styled(format!("{label:>10}: "), label_style),
        Span::styled(value, theme::normal()),
    ];
    if focused {
        spans.push(Span::styled("█", theme::normal()));
    }
    Line::from(spans)
}

fn mask(password: &str) -> String {
    "*".repeat(password.chars().count())
}
