//! Structured logging setup
//!
//! Terminal layer plus an optional daily-rolling file appender with a
//! non-blocking writer; the returned guard must stay alive for the process
//! lifetime so buffered log lines are flushed on exit.

use std::path::Path;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::harvester::config::AppConfig;

/// Error types for logging setup
#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging error: {0}")]
    Logging(String),
}

/// Result type for logging operations
pub type LoggerResult<T> = Result<T, LoggerError>;

/// Initialize the global subscriber from the app config.
pub fn init(config: &AppConfig) -> LoggerResult<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.log_level))
        .map_err(|e| LoggerError::Logging(e.to_string()))?;

    let terminal_layer = fmt::layer().with_target(false);

    if config.logging.log_to_file {
        let log_dir = Path::new(&config.paths.log_directory);
        std::fs::create_dir_all(log_dir)?;

        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, log_dir, "bing_harvester.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(terminal_layer)
            .with(file_layer)
            .try_init()
            .map_err(|e| LoggerError::Logging(e.to_string()))?;
        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(terminal_layer)
            .try_init()
            .map_err(|e| LoggerError::Logging(e.to_string()))?;
        Ok(None)
    }
}
