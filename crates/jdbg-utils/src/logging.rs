//! # Logging Utilities
//!
//! Logging infrastructure for jdbg using `tracing`.
//!
//! Log records always go to stderr so they never mix with resolver output on
//! stdout. This module provides:
//! - Pretty (development) and JSON (machine-readable) output formats
//! - Environment variable configuration
//! - Level filtering, with `RUST_LOG` directives for per-crate control
//! - An optional log file next to the console output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jdbg_utils::init_logging;
//!
//! // Reads RUST_LOG, JDBG_LOG_FORMAT and JDBG_LOG_FILE
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=jdbg_core=trace`)
//! - `JDBG_LOG_FORMAT`: Set output format (`json` or `pretty`, default: `pretty`)
//! - `JDBG_LOG_FILE`: Optional log file path. A directory gets a dated file
//!   named `YYYY-MM-DD-jdbg.log`.
//!
//! Keep the returned [`LoggingGuard`] alive for as long as records should
//! reach the log file; dropping it flushes and stops the file writer.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format
pub const LOG_FORMAT_ENV: &str = "JDBG_LOG_FORMAT";
/// Environment variable naming an optional log file
pub const LOG_FILE_ENV: &str = "JDBG_LOG_FILE";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    #[default]
    Pretty,
    /// JSON format, one object per line
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level (default)
    Warn,
    /// Info level
    Info,
    /// Debug level
    Debug,
    /// Trace level (every table lookup)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Keeps the background file writer alive.
///
/// Holds nothing when logging goes to the console only.
#[derive(Debug)]
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard
{
    _file: Option<WorkerGuard>,
    /// Log file in use, if any
    pub log_file: Option<PathBuf>,
}

/// Initialize logging from the environment
///
/// Reads configuration from environment variables:
/// - `RUST_LOG`: Log filter (e.g., `debug`, `jdbg_core=trace`), default `warn`
/// - `JDBG_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
/// - `JDBG_LOG_FILE`: Optional log file or directory
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `JDBG_LOG_FORMAT` names an unknown format
/// - The log file cannot be created
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    let format = match env::var(LOG_FORMAT_ENV) {
        Ok(value) => value.parse::<LogFormat>().map_err(LoggingError::InvalidFormat)?,
        Err(_) => LogFormat::default(),
    };
    init_logging_internal(format, None)
}

/// Initialize logging with explicit level and format
///
/// The explicit level overrides `RUST_LOG`. `JDBG_LOG_FILE` is still honored.
///
/// ## Example
///
/// ```rust,no_run
/// use jdbg_utils::{LogFormat, LogLevel, init_logging_with_level};
///
/// let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
///     .expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized or file logging fails.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    init_logging_internal(format, Some(level.into()))
}

/// Build the level filter.
///
/// Priority:
/// 1. An explicit level (from the `--log-level` CLI flag)
/// 2. `RUST_LOG`, which may carry per-crate directives
/// 3. `WARN`, so a plain run only reports suspect blobs
fn build_filter(explicit_level: Option<Level>) -> Result<EnvFilter, LoggingError>
{
    if let Some(level) = explicit_level {
        return Ok(EnvFilter::new(level.to_string()));
    }
    match env::var("RUST_LOG") {
        Ok(directives) => EnvFilter::try_new(&directives).map_err(|err| LoggingError::InvalidLevel(err.to_string())),
        Err(_) => Ok(EnvFilter::new(Level::WARN.to_string())),
    }
}

/// Where the log file goes for a configured path.
///
/// A directory (existing, or spelled with a trailing separator) gets a file
/// named after today's date.
#[must_use]
pub fn resolve_log_path(configured: &Path) -> PathBuf
{
    let is_dir = configured.is_dir() || configured.as_os_str().to_string_lossy().ends_with(['/', '\\']);
    if is_dir {
        let today = Utc::now().format("%Y-%m-%d");
        configured.join(format!("{today}-jdbg.log"))
    } else {
        configured.to_path_buf()
    }
}

fn console_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
    }
}

fn file_layer(format: LogFormat, filter: EnvFilter, path: &Path) -> Result<(BoxedLayer, WorkerGuard), LoggingError>
{
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&directory)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InitializationFailed(format!("{} has no file name", path.display())))?;

    // The date is already part of generated names, so never roll.
    let appender = tracing_appender::rolling::never(&directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = match format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(false) // No ANSI in files
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    };
    Ok((layer, guard))
}

fn init_logging_internal(format: LogFormat, explicit_level: Option<Level>) -> Result<LoggingGuard, LoggingError>
{
    let log_file = env::var_os(LOG_FILE_ENV)
        .filter(|value| !value.is_empty())
        .map(|value| resolve_log_path(Path::new(&value)));

    let mut layers = vec![console_layer(format, build_filter(explicit_level)?)];
    let mut file_guard = None;
    if let Some(path) = &log_file {
        let (layer, guard) = file_layer(format, build_filter(explicit_level)?, path)?;
        layers.push(layer);
        file_guard = Some(guard);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;

    Ok(LoggingGuard {
        _file: file_guard,
        log_file,
    })
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level or filter directive
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
