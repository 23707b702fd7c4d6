//! Tracing setup.
//!
//! The terminal belongs to the TUI, so events go to a file or nowhere.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::{prelude::*, registry};

/// Install the global subscriber writing to `log_file`.
///
/// Returns `None` without installing anything when no file is given. The
/// returned guard flushes pending events when dropped; keep it alive for the
/// lifetime of the program.
pub fn init(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let Some(log_file) = log_file else {
        return Ok(None);
    };

    let file_name = log_file
        .file_name()
        .with_context(|| format!("log file {} has no file name", log_file.display()))?;
    let directory = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let (writer, guard) = tracing_appender::non_blocking(rolling::never(directory, file_name));

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    registry()
        .with(
            layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_filter(env_filter),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(Some(guard))
}
