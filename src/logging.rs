use std::{path::PathBuf, str::FromStr};

use tracing::Level;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    fmt::time::ChronoUtc, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::config::{ConfigError, ConfigResult};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level for the decoder targets (default: WARN)
    pub level: Level,
    /// Whether to use json format for logs (default: false)
    pub json_format: bool,
    /// Directory for log files. If None, logs only go to stderr
    pub log_dir: Option<PathBuf>,
    /// Whether to colorize stderr logs (default: true)
    pub colorize: bool,
    /// Log file name prefix used when log_dir is set (default: "thinking-decoder")
    pub log_file_name: String,
    /// Targets the level applies to (default: "thinking_decoder")
    pub log_targets: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            json_format: false,
            log_dir: None,
            colorize: true,
            log_file_name: "thinking-decoder".to_string(),
            log_targets: vec!["thinking_decoder".to_string(), "thinking_decode".to_string()],
        }
    }
}

impl LoggingConfig {
    /// Filter directives, e.g. `thinking_decoder=debug,thinking_decode=debug`
    pub fn filter_directives(&self) -> String {
        let level = self.level.as_str().to_ascii_lowercase();
        self.log_targets
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Parse a log level name such as `info` or `DEBUG`.
pub fn parse_level(value: &str) -> ConfigResult<Level> {
    Level::from_str(value).map_err(|_| ConfigError::InvalidValue {
        field: "log_level".to_string(),
        value: value.to_string(),
        reason: "Expected one of trace, debug, info, warn, error".to_string(),
    })
}

/// Guard that keeps the file appender worker thread alive
///
/// Keep it in scope for the duration of the program so buffered log lines
/// are flushed to the file.
#[allow(dead_code)]
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Console output
/// goes to stderr so stdout stays free for decoded output. Calling this
/// twice is harmless, the second subscriber is ignored.
pub fn init_logging(config: LoggingConfig) -> LogGuard {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directives()));

    let mut layers = Vec::new();

    // Standard timestamp format: YYYY-MM-DD HH:MM:SS
    let time_format = "%Y-%m-%d %H:%M:%S".to_string();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.colorize)
        .with_target(true)
        .with_timer(ChronoUtc::new(time_format.clone()));

    let stderr_layer = if config.json_format {
        stderr_layer.json().flatten_event(true).boxed()
    } else {
        stderr_layer.boxed()
    };
    layers.push(stderr_layer);

    let mut file_guard = None;

    if let Some(log_dir) = &config.log_dir {
        match std::fs::create_dir_all(log_dir) {
            Ok(()) => {
                let file_appender =
                    RollingFileAppender::new(Rotation::DAILY, log_dir, &config.log_file_name);
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                file_guard = Some(guard);

                let file_layer = tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::new(time_format))
                    .with_writer(non_blocking);

                let file_layer = if config.json_format {
                    file_layer.json().flatten_event(true).boxed()
                } else {
                    file_layer.boxed()
                };
                layers.push(file_layer);
            }
            Err(e) => {
                eprintln!(
                    "Failed to create log directory {}: {}",
                    log_dir.display(),
                    e
                );
            }
        }
    }

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init();

    LogGuard {
        _file_guard: file_guard,
    }
}
