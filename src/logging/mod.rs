//! Logging infrastructure
//!
//! Design: `tracing` events everywhere, subscriber installed at most once.
//! The add-on lives inside a host process that may already own the global
//! subscriber, so installation never panics; it just leaves the existing one
//! in place.

use once_cell::sync::OnceCell;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{LogFormat, LoggingConfig};

const LOG_FILE_PREFIX: &str = "pvr.python.log";

/// Keeps the file writer alive for the add-on lifetime
static LOGGER: OnceCell<Option<WorkerGuard>> = OnceCell::new();

pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    let level = parse_level(&config.level);
    let base = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pvr_python={}", level.as_str().to_lowercase())));

    match &config.filter {
        Some(directives) => directives
            .split(',')
            .filter(|d| !d.trim().is_empty())
            .fold(base, |filter, directive| match directive.trim().parse() {
                Ok(d) => filter.add_directive(d),
                Err(_) => filter,
            }),
        None => base,
    }
}

/// Install the subscriber; later calls are no-ops
///
/// `user_path` receives a daily-rotated `pvr.python.log` when file output is
/// enabled. A user path that cannot hold the log leaves console output only.
pub fn init(config: &LoggingConfig, user_path: Option<&Path>) {
    LOGGER.get_or_init(|| install(config, user_path));
}

fn file_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir)
}

fn install(config: &LoggingConfig, user_path: Option<&Path>) -> Option<WorkerGuard> {
    let filter = build_filter(config);

    let console = match config.format {
        LogFormat::Pretty => fmt::layer().with_writer(std::io::stderr).pretty().boxed(),
        LogFormat::Compact => fmt::layer().with_writer(std::io::stderr).compact().boxed(),
        LogFormat::Json => fmt::layer().with_writer(std::io::stderr).json().boxed(),
    };

    let mut unusable = None;
    let (file, guard) = match user_path.filter(|_| config.file).map(|dir| (dir, file_appender(dir))) {
        Some((_, Ok(appender))) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).boxed();
            (Some(layer), Some(guard))
        }
        Some((dir, Err(err))) => {
            unusable = Some((dir, err));
            (None, None)
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(level = %config.level, "logging initialised");
    }
    if let Some((dir, err)) = unusable {
        tracing::warn!(dir = %dir.display(), "file logging disabled: {}", err);
    }
    guard
}
