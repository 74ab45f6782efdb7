use std::path::Path;

use color_eyre::eyre::{eyre, Result, WrapErr};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "saas_notes=info";

/// Sends `tracing` output to `log_file`. Keep the guard alive until exit so
/// buffered lines get flushed.
pub fn init(log_file: &Path) -> Result<WorkerGuard> {
    let directory = log_file
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .ok_or_else(|| eyre!("Log file path has no file name: {}", log_file.display()))?;
    std::fs::create_dir_all(directory)
        .wrap_err_with(|| format!("Failed to create log directory {}", directory.display()))?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init()
        .wrap_err("Failed to install tracing subscriber")?;

    Ok(guard)
}
