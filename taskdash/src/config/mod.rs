//! Client settings.
//!
//! Each value comes from the first source that sets it:
//! 1. a command-line flag
//! 2. its `TASKDASH_*` environment variable (clap reads both)
//! 3. `~/.config/taskdash/config.toml`, or the file named by `--config`
//! 4. the built-in default
//!
//! The default file may be absent. A file named with `--config` must exist.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::net::WorkerConfig;
use crate::tasks::{SortKey, SortOrder};

/// Default API root.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Config file problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read, or `--config` names a missing
    /// file.
    #[error("cannot read {path}: {source}")]
    ReadFile {
        /// The config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for these settings.
    #[error("invalid config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// File layout. Every key is optional.
// ---------------------------------------------------------------------------

/// The whole config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    api: ApiFileConfig,
    session: SessionFileConfig,
    ui: UiFileConfig,
}

/// `[api]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ApiFileConfig {
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    channel_capacity: Option<usize>,
}

/// `[session]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    token_file: Option<PathBuf>,
    remember: Option<bool>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
    date_format: Option<String>,
    timestamp_format: Option<String>,
    max_task_title_len: Option<usize>,
    default_sort: Option<SortKey>,
    default_order: Option<SortOrder>,
}

// ---------------------------------------------------------------------------
// Effective settings
// ---------------------------------------------------------------------------

/// Settings after all sources are merged.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- API --
    /// Root URL of the task API.
    pub api_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Bound of the worker's command and event queues.
    pub channel_capacity: usize,

    // -- Session --
    /// Where the session token is persisted; `None` when no data directory
    /// is known.
    pub token_file: Option<PathBuf>,
    /// Whether to persist the session between runs.
    pub remember_session: bool,
    /// Email to prefill on the login screen.
    pub email: Option<String>,

    // -- UI --
    /// How long the UI loop waits for a key before redrawing.
    pub poll_timeout: Duration,
    /// Due date display format (chrono).
    pub date_format: String,
    /// Timestamp display format (chrono).
    pub timestamp_format: String,
    /// Longest accepted task title, in characters.
    pub max_task_title_len: usize,
    /// Initial sort key.
    pub default_sort: SortKey,
    /// Initial sort direction.
    pub default_order: SortOrder,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(15),
            channel_capacity: 256,
            token_file: default_token_file(),
            remember_session: true,
            email: None,
            poll_timeout: Duration::from_millis(50),
            date_format: "%Y-%m-%d".to_string(),
            timestamp_format: "%Y-%m-%d %H:%M".to_string(),
            max_task_title_len: taskdash_proto::MAX_TASK_TITLE_LENGTH,
            default_sort: SortKey::CreatedAt,
            default_order: SortOrder::Desc,
        }
    }
}

impl ClientConfig {
    /// Reads the config file and merges it under `cli`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = match cli.config.as_deref() {
            Some(path) => ConfigFile::read(path)?,
            None => ConfigFile::read_default()?,
        };
        Ok(Self::resolve(cli, &file))
    }

    /// Flags and environment over defaults, with no config file.
    #[must_use]
    pub fn from_cli(cli: &CliArgs) -> Self {
        Self::resolve(cli, &ConfigFile::default())
    }

    /// Flags (already merged with the environment by clap) win over the
    /// file, which wins over the defaults.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            api_url: cli
                .api_url
                .clone()
                .or_else(|| file.api.base_url.clone())
                .unwrap_or(defaults.api_url),
            request_timeout: file
                .api
                .request_timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
            channel_capacity: file
                .api
                .channel_capacity
                .unwrap_or(defaults.channel_capacity),
            token_file: file.session.token_file.clone().or(defaults.token_file),
            remember_session: !cli.no_remember
                && file.session.remember.unwrap_or(defaults.remember_session),
            email: cli.email.clone(),
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
            date_format: file
                .ui
                .date_format
                .clone()
                .unwrap_or(defaults.date_format),
            timestamp_format: file
                .ui
                .timestamp_format
                .clone()
                .unwrap_or(defaults.timestamp_format),
            max_task_title_len: file
                .ui
                .max_task_title_len
                .unwrap_or(defaults.max_task_title_len),
            default_sort: file.ui.default_sort.unwrap_or(defaults.default_sort),
            default_order: file.ui.default_order.unwrap_or(defaults.default_order),
        }
    }

    /// Settings for [`crate::net::spawn_api_worker`].
    #[must_use]
    pub const fn to_worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            channel_capacity: self.channel_capacity,
        }
    }

    /// The token file to use, or `None` when sessions are not remembered.
    #[must_use]
    pub fn session_path(&self) -> Option<&Path> {
        if self.remember_session {
            self.token_file.as_deref()
        } else {
            None
        }
    }
}

/// Command-line flags.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Terminal dashboard for a remote task-management API")]
pub struct CliArgs {
    /// Root URL of the task API.
    #[arg(long, env = "TASKDASH_API_URL")]
    pub api_url: Option<String>,

    /// Config file to use instead of `~/.config/taskdash/config.toml`.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Email to prefill on the login screen.
    #[arg(long, env = "TASKDASH_EMAIL")]
    pub email: Option<String>,

    /// `tracing` filter, e.g. `info` or `taskdash=debug`. `RUST_LOG` wins.
    #[arg(long, default_value = "info", env = "TASKDASH_LOG")]
    pub log_level: String,

    /// Log file (default: `$TMPDIR/taskdash.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Do not read or write the saved session.
    #[arg(long)]
    pub no_remember: bool,
}

/// `<data_dir>/taskdash/session.json`.
fn default_token_file() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("taskdash").join("session.json"))
}

/// `<config_dir>/taskdash/config.toml`.
fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("taskdash").join("config.toml"))
}

impl ConfigFile {
    /// Parses `path`, which must exist.
    fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Parses the default file; empty when there is none.
    fn read_default() -> Result<Self, ConfigError> {
        let Some(path) = default_config_file() else {
            return Ok(Self::default());
        };
        match Self::read(&path) {
            Err(ConfigError::ReadFile { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(Self::default())
            }
            other => other,
        }
    }
}
