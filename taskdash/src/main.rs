//! `TaskDash`: terminal dashboard for a remote task-management API.
//!
//! Launches the TUI against the task API. Configuration via CLI flags,
//! environment variables, or config file
//! (`~/.config/taskdash/config.toml`).
//!
//! ```bash
//! # Local API on the default port
//! cargo run --bin taskdash
//!
//! # Another API, prefilled email, nothing written to disk
//! cargo run --bin taskdash -- --api-url https://tasks.example.com \
//!     --email ada@example.com --no-remember
//!
//! # Or via environment variables
//! TASKDASH_API_URL=http://127.0.0.1:8000 TASKDASH_LOG=debug cargo run
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use taskdash::api::http::HttpClient;
use taskdash::app::App;
use taskdash::auth::SessionStore;
use taskdash::config::{CliArgs, ClientConfig};
use taskdash::net::{self, ApiCommand, ApiEvent};
use taskdash::ui;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    let config = ClientConfig::load(&cli).unwrap_or_else(|e| {
        eprintln!("Warning: {e}; ignoring config file");
        ClientConfig::from_cli(&cli)
    });

    // The guard flushes the log file on drop.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(api_url = %config.api_url, "taskdash starting");

    let client = match HttpClient::new(&config.api_url, config.request_timeout) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            return Err(io::Error::new(io::ErrorKind::InvalidInput, e.to_string()));
        }
    };
    let session = config.session_path().map(SessionStore::new);
    let (cmd_tx, evt_rx) =
        net::spawn_api_worker(Arc::new(client), session, &config.to_worker_config());

    let mut terminal = enter_terminal()?;
    let result = run_app(&mut terminal, &config, &cmd_tx, evt_rx);

    if cmd_tx.try_send(ApiCommand::Shutdown).is_err() {
        tracing::debug!("worker already gone");
    }
    leave_terminal(&mut terminal)?;

    tracing::info!("taskdash exiting");
    result
}

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

fn enter_terminal() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn leave_terminal(terminal: &mut Tui) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

/// Sends `tracing` output to `file_path` (default `$TMPDIR/taskdash.log`).
///
/// The terminal belongs to the UI, so nothing is ever logged to stdout.
/// `RUST_LOG` overrides `level`. Returns `None`, leaving logging off, when
/// the path has no usable file name.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let path = file_path.map_or_else(
        || std::env::temp_dir().join("taskdash.log"),
        Path::to_path_buf,
    );
    let dir = path.parent()?;
    let name = path.file_name()?.to_str()?;

    let appender = tracing_appender::rolling::never(dir, name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Draw, apply worker events, read one key; repeat until the app quits.
fn run_app(
    terminal: &mut Tui,
    config: &ClientConfig,
    cmd_tx: &mpsc::Sender<ApiCommand>,
    mut evt_rx: mpsc::Receiver<ApiEvent>,
) -> io::Result<()> {
    let mut app = App::new()
        .with_sort(config.default_sort, config.default_order)
        .with_email(config.email.clone())
        .with_max_task_title_len(config.max_task_title_len)
        .with_formats(config.date_format.clone(), config.timestamp_format.clone());

    let start = app.start();
    dispatch(&mut app, cmd_tx, start);

    loop {
        terminal.draw(|frame| ui::draw(frame, &app))?;

        while let Ok(event) = evt_rx.try_recv() {
            if let Some(cmd) = app.handle_api_event(event) {
                dispatch(&mut app, cmd_tx, cmd);
            }
        }

        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let Some(cmd) = app.handle_key_event(key)
        {
            dispatch(&mut app, cmd_tx, cmd);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Hand a command to the worker without blocking the UI.
fn dispatch(app: &mut App, tx: &mpsc::Sender<ApiCommand>, cmd: ApiCommand) {
    match tx.try_send(cmd) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(cmd)) => {
            tracing::warn!(?cmd, "command dropped, worker busy");
            app.command_dropped(cmd);
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::error!("api worker stopped");
            app.should_quit = true;
        }
    }
}
