//! Tracing setup.
//!
//! Log lines go to daily-rolling files under the XDG state directory
//! (`~/.local/state/kidshelf/`), never to the terminal. The interactive
//! commands own stdout.

use crate::config::{Config, LoggingConfig};
use crate::error::Error;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the background log writer alive. Dropping it flushes pending writes,
/// so `main` holds it for the whole run.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

fn file_appender(dir: &Path, max_files: usize) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("kidshelf")
        .filename_suffix("log")
        .max_log_files(max_files)
        .build(dir)
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the configured level. Files older than
/// `max_files` rotations are pruned by the appender.
pub fn init(config: &LoggingConfig) -> crate::error::Result<LoggingGuard> {
    let log_dir = Config::state_dir();
    std::fs::create_dir_all(&log_dir)?;

    let appender = file_appender(&log_dir, config.max_files)
        .map_err(|e| Error::Config(format!("log appender in {}: {}", log_dir.display(), e)))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry().with(filter).with(file_layer).init();

    tracing::info!(
        log_dir = %log_dir.display(),
        level = %config.level,
        "logging ready"
    );

    Ok(LoggingGuard { _guard: guard })
}
