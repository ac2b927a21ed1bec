//! Tracing subscriber setup
//!
//! Library code only emits `tracing` events. Applications and tests that
//! want to see them call [`init_logging`] once at startup.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;
use crate::error::{LabelsError, Result};

/// Install a console subscriber, plus a daily-rolling file layer when
/// `settings.log_dir` is set.
///
/// `RUST_LOG` takes precedence over `settings.filter`. The returned guard
/// flushes the file writer on drop and must be kept alive.
pub fn init_logging(settings: &LoggingSettings) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .map_err(|e| LabelsError::Config(format!("Invalid log filter: {}", e)))?;

    let (file_layer, guard) = match &settings.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                LabelsError::Config(format!("Failed to create log directory: {}", e))
            })?;
            let appender = tracing_appender::rolling::daily(dir, &settings.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| LabelsError::Config(format!("Failed to install subscriber: {}", e)))?;

    tracing::debug!("Logging initialized");
    Ok(guard)
}
