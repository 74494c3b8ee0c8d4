//! # Structured Logging
//!
//! Console plus file output through `tracing`. The console layer uses ANSI
//! colors only when stdout is a terminal; the file layer writes JSON lines
//! to a daily rolling file under `logging.directory`, keeping at most
//! `logging.max_files` files.
//!
//! `RUST_LOG` takes precedence over the configured `logging.level`.

use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::error::{ExportError, ExportResult};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();
/// Keeps the non-blocking file writer flushing until process exit
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber; later calls are no-ops
pub fn init_logging(config: &LoggingConfig) -> ExportResult<()> {
    if LOGGER_INITIALIZED.get().is_some() {
        return Ok(());
    }

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_ansi(std::io::stdout().is_terminal())
        .with_filter(build_filter(&config.level));

    let file_layer = if config.file_enabled {
        let appender = build_file_appender(config)?;
        let (file_writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);

        Some(
            fmt::layer()
                .with_writer(file_writer)
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(build_filter(&config.level)),
        )
    } else {
        None
    };

    let subscriber = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer);

    // Another subscriber (a test harness, an embedding application) wins
    if subscriber.try_init().is_err() {
        tracing::debug!(
            "Global tracing subscriber already initialized - continuing with existing subscriber"
        );
    }
    let _ = LOGGER_INITIALIZED.set(());

    tracing::info!(
        pid = std::process::id(),
        level = %config.level,
        file_enabled = config.file_enabled,
        log_dir = %config.directory.display(),
        "🔧 Logging initialized"
    );
    Ok(())
}

/// Daily rolling appender that deletes files beyond `max_files` on rotation
fn build_file_appender(config: &LoggingConfig) -> ExportResult<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&config.file_prefix)
        .max_log_files(config.max_files)
        .build(&config.directory)
        .map_err(|e| {
            ExportError::Logging(format!(
                "cannot open log file in {}: {e}",
                config.directory.display()
            ))
        })
}

fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let config = LoggingConfig {
            level: "debug".to_string(),
            file_enabled: true,
            directory: temp.path().join("log"),
            file_prefix: "test.log".to_string(),
            max_files: 2,
        };

        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }

    fn file_config(directory: std::path::PathBuf) -> LoggingConfig {
        LoggingConfig {
            directory,
            file_prefix: "zabbix_export.log".to_string(),
            max_files: 4,
            ..LoggingConfig::default()
        }
    }

    #[test]
    fn test_file_appender_opens_prefixed_file() {
        let temp = TempDir::new().unwrap();
        let directory = temp.path().join("log");

        let _appender = build_file_appender(&file_config(directory.clone())).unwrap();

        let names: Vec<String> = std::fs::read_dir(&directory)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("zabbix_export.log"));
    }

    #[test]
    fn test_file_appender_error_maps_to_logging_error() {
        let temp = TempDir::new().unwrap();
        let occupied = temp.path().join("log");
        std::fs::write(&occupied, "not a directory").unwrap();

        let result = build_file_appender(&file_config(occupied));
        assert!(matches!(result, Err(ExportError::Logging(_))));
    }
}
