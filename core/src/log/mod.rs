//! Logging bootstrap for the file browser.
//!
//! Installs a `tracing` subscriber with two sinks: a rolling file under the application data
//! directory and a console layer on stderr. Records emitted through the `log` crate are bridged
//! into `tracing`. [`init`] may be called more than once; only the first call configures
//! anything.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use anyhow::{Context, Result};
use tracing_appender::rolling::Rotation;
use tracing_log::AsLog;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, util::SubscriberInitExt};

/// Environment variables consulted, in order, when no filter directive is configured.
const ENV_FILTER_VARS: [&str; 2] = ["FILE_BROWSER_LOG", "RUST_LOG"];

/// Handle installed by the first successful [`init`].
static LOG_HANDLE: OnceLock<LogHandle> = OnceLock::new();

/// Level type accepted by [`LogConfig`], re-exported so callers need not name
/// `tracing-subscriber`.
pub use tracing_subscriber::filter::LevelFilter as LogLevel;

/// When the file sink starts a new log file.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LogRolling {
    /// A new file every hour.
    Hourly,
    /// A new file every calendar day.
    Daily,
    /// One append-only file.
    Never,
}

impl LogRolling {
    fn rotation(self) -> Rotation {
        match self {
            LogRolling::Hourly => Rotation::HOURLY,
            LogRolling::Daily => Rotation::DAILY,
            LogRolling::Never => Rotation::NEVER,
        }
    }
}

/// Settings for [`init`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory holding the rolling log files. Defaults to `logs/` under the application data
    /// directory.
    pub directory: PathBuf,
    /// Log files are named `<prefix>.<date>.log`.
    pub file_prefix: String,
    /// Number of log files kept on startup. `None` keeps everything.
    pub retention: Option<usize>,
    /// Most verbose level written to the log file.
    pub file_level: LevelFilter,
    /// Most verbose level written to stderr.
    pub console_level: LevelFilter,
    /// Forward `log` crate records into `tracing`.
    pub capture_log: bool,
    /// Filter directive such as `browser_core=debug`. Falls back to the environment.
    pub env_filter: Option<String>,
    /// Rotation of the file sink.
    pub rolling: LogRolling,
}

impl Default for LogConfig {
    fn default() -> Self {
        let console_level =
            if cfg!(debug_assertions) { LevelFilter::INFO } else { LevelFilter::WARN };

        Self {
            directory: crate::config::data_root().join("logs"),
            file_prefix: "browser".to_string(),
            retention: Some(7),
            file_level: LevelFilter::DEBUG,
            console_level,
            capture_log: true,
            env_filter: None,
            rolling: LogRolling::Daily,
        }
    }
}

impl LogConfig {
    /// Write log files to `path` instead of the default directory.
    pub fn with_directory<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.directory = path.into();
        self
    }

    /// Name log files `<prefix>.<date>.log`.
    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// The configured directive, else the first non-empty environment variable, else a
    /// build-dependent default.
    fn directive(&self) -> String {
        self.env_filter
            .clone()
            .or_else(|| ENV_FILTER_VARS.iter().find_map(|var| std::env::var(var).ok()))
            .filter(|directive| !directive.trim().is_empty())
            .unwrap_or_else(|| if cfg!(debug_assertions) { "debug" } else { "info" }.to_string())
    }
}

/// Owns the background writer; dropping it would stop file logging.
#[derive(Debug)]
pub struct LogHandle {
    _guard: tracing_appender::non_blocking::WorkerGuard,
    directory: PathBuf,
    file_prefix: String,
}

impl LogHandle {
    /// Directory the file sink writes to.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Prefix of the files the sink creates.
    pub fn file_prefix(&self) -> &str {
        &self.file_prefix
    }
}

/// Install the global subscriber. Later calls return the first handle and ignore `config`.
pub fn init(config: LogConfig) -> Result<&'static LogHandle> {
    if let Some(handle) = LOG_HANDLE.get() {
        return Ok(handle);
    }

    let handle = setup(config)?;
    Ok(LOG_HANDLE.get_or_init(|| handle))
}

fn setup(config: LogConfig) -> Result<LogHandle> {
    if config.capture_log {
        let _ = tracing_log::LogTracer::builder()
            .with_max_level(config.file_level.max(config.console_level).as_log())
            .init();
    }

    fs::create_dir_all(&config.directory)
        .with_context(|| format!("creating log directory at {}", config.directory.display()))?;

    if let Some(retention) = config.retention.filter(|keep| *keep > 0) {
        prune_old_logs(&config.directory, &config.file_prefix, retention)
            .context("applying log retention")?;
    }

    let appender = tracing_appender::rolling::Builder::new()
        .rotation(config.rolling.rotation())
        .filename_prefix(&config.file_prefix)
        .filename_suffix("log")
        .build(&config.directory)
        .context("creating rolling log appender")?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter = EnvFilter::try_new(config.directive()).context("parsing log filter")?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_target(true)
        .with_filter(config.file_level);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(config.console_level);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))?;

    Ok(LogHandle { _guard: guard, directory: config.directory, file_prefix: config.file_prefix })
}

/// Delete the oldest `<prefix>*` files in `dir` until `retention` remain.
fn prune_old_logs(dir: &Path, prefix: &str, retention: usize) -> Result<()> {
    let mut logs: Vec<(PathBuf, SystemTime)> = fs::read_dir(dir)
        .with_context(|| format!("reading log directory at {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            let path = entry.path();
            if !meta.is_file() || !has_prefix(&path, prefix) {
                return None;
            }
            Some((path, meta.modified().unwrap_or(SystemTime::UNIX_EPOCH)))
        })
        .collect();

    if logs.len() <= retention {
        return Ok(());
    }

    logs.sort_by_key(|(_, modified)| *modified);
    let excess = logs.len() - retention;
    for (path, _) in logs.into_iter().take(excess) {
        let _ = fs::remove_file(&path);
    }
    Ok(())
}

fn has_prefix(path: &Path, prefix: &str) -> bool {
    path.file_name().and_then(OsStr::to_str).is_some_and(|name| name.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn init_is_idempotent() {
        let temp = tempfile::tempdir().expect("temp dir");
        let config =
            LogConfig::default().with_directory(temp.path().join("logs")).with_prefix("test-log");

        let first = init(config.clone()).expect("init once");
        assert!(first.directory().exists());
        assert_eq!(first.file_prefix(), "test-log");

        let second = init(config).expect("init twice");
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn default_directory_sits_under_the_data_root() {
        let config = LogConfig::default();
        assert_eq!(config.directory, crate::config::data_root().join("logs"));
        assert_eq!(config.retention, Some(7));
    }

    #[test]
    fn prune_keeps_newest_files() {
        let temp = tempfile::tempdir().unwrap();
        let base = SystemTime::now() - Duration::from_secs(3_600);
        for (idx, name) in ["app.1.log", "app.2.log", "app.3.log"].iter().enumerate() {
            let path = temp.path().join(name);
            fs::write(&path, b"line").unwrap();
            fs::File::options()
                .write(true)
                .open(&path)
                .unwrap()
                .set_modified(base + Duration::from_secs(idx as u64 * 60))
                .unwrap();
        }
        fs::write(temp.path().join("other.log"), b"keep").unwrap();

        prune_old_logs(temp.path(), "app", 2).unwrap();

        assert!(!temp.path().join("app.1.log").exists());
        assert!(temp.path().join("app.2.log").exists());
        assert!(temp.path().join("app.3.log").exists());
        assert!(temp.path().join("other.log").exists());
    }
}
