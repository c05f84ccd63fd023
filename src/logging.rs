//! Tracing setup.
//!
//! stdout carries the protocol, so logs go to stderr and, when the log
//! directory is writable, to a daily rolling file as well.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{warn, Level};
use tracing_appender::non_blocking::NonBlocking;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::{MakeWriterExt, OptionalWriter};
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "coinglass-mcp.log";

/// Open the daily rolling log file under `dir`, creating the directory.
pub fn open_log_file(dir: impl AsRef<Path>) -> Result<NonBlocking> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir)
        .with_context(|| format!("Failed to open log file in {}", dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // Leak the guard to keep it alive for the program duration
    Box::leak(Box::new(guard));

    Ok(writer)
}

/// Initialize logging to stderr and, best effort, a rolling file in `dir`.
pub fn init_logging(dir: impl AsRef<Path>) -> Result<()> {
    let file = open_log_file(dir);
    let file_writer = file.as_ref().ok().cloned();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("coinglass_mcp=debug".parse()?)
                .add_directive(Level::INFO.into()),
        )
        .with_writer(std::io::stderr.and(move || OptionalWriter::from(file_writer.clone())))
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .init();

    if let Err(e) = file {
        warn!("File logging disabled: {:#}", e);
    }
    Ok(())
}
