//! Logging setup for the racerd bridge.
//!
//! Provides file-based tracing output with retention cleanup. Logs are
//! stored in ~/.racerd-bridge/logs/ by default; hosts that already run
//! their own subscriber simply skip calling [`init`].

use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::UserOptions;

/// Default log retention in hours.
pub const DEFAULT_LOG_RETENTION_HOURS: u32 = 24;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Log retention period in hours.
    pub retention_hours: u32,

    /// When true, old log files are kept instead of cleaned up.
    pub keep_logfiles: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            retention_hours: DEFAULT_LOG_RETENTION_HOURS,
            keep_logfiles: false,
        }
    }
}

impl LogConfig {
    /// Builds a logging configuration from the host's user options.
    ///
    /// The `keep_logfiles` option gates retention cleanup; level and
    /// retention keep their defaults.
    #[must_use]
    pub fn from_options(options: &UserOptions) -> Self {
        Self {
            keep_logfiles: options.keep_logfiles,
            ..Self::default()
        }
    }
}

/// Returns the log directory path (~/.racerd-bridge/logs/).
#[must_use]
pub fn log_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".racerd-bridge")
        .join("logs")
}

/// Returns the current log file path.
#[must_use]
pub fn current_log_path() -> PathBuf {
    let now = chrono::Local::now();
    let filename = format!("racerd_bridge_{}.log", now.format("%Y-%m-%d_%H-%M-%S"));
    log_directory().join(filename)
}

/// Runs the startup retention cleanup unless `keep_logfiles` is set.
fn startup_cleanup(config: &LogConfig, log_dir: &std::path::Path) -> io::Result<u32> {
    if config.keep_logfiles {
        return Ok(0);
    }
    cleanup_logs_in(log_dir, config.retention_hours)
}

/// Cleans up log files older than the specified retention period.
///
/// # Errors
/// Returns error if directory cannot be read.
pub fn cleanup_old_logs(retention_hours: u32) -> io::Result<u32> {
    cleanup_logs_in(&log_directory(), retention_hours)
}

fn cleanup_logs_in(log_dir: &std::path::Path, retention_hours: u32) -> io::Result<u32> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let retention_duration = Duration::from_secs(u64::from(retention_hours) * 3600);
    let now = SystemTime::now();
    let mut deleted_count = 0;

    for entry in fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();

        // Only process .log files
        if path.extension().and_then(|e| e.to_str()) != Some("log") {
            continue;
        }

        if let Ok(metadata) = entry.metadata() {
            if let Ok(modified) = metadata.modified() {
                if let Ok(age) = now.duration_since(modified) {
                    if age > retention_duration && fs::remove_file(&path).is_ok() {
                        deleted_count += 1;
                    }
                }
            }
        }
    }

    Ok(deleted_count)
}

/// Initializes the logging system.
///
/// Sets up file-based logging with the specified configuration and,
/// unless `keep_logfiles` is set, cleans up old log files first.
///
/// # Errors
/// Returns error if logging cannot be initialized.
pub fn init(config: &LogConfig) -> io::Result<()> {
    if config.level == "off" {
        return Ok(());
    }

    let log_dir = log_directory();
    fs::create_dir_all(&log_dir)?;

    let deleted = startup_cleanup(config, &log_dir)?;

    let log_path = current_log_path();
    let log_file = File::create(&log_path)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = fmt::layer()
        .with_writer(log_file.with_max_level(tracing::Level::TRACE))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    tracing::info!("racerd bridge logging initialized");
    tracing::info!("Log file: {}", log_path.display());
    tracing::info!("Log level: {}", config.level);
    if deleted > 0 {
        tracing::info!("Cleaned up {} old log file(s)", deleted);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.retention_hours, DEFAULT_LOG_RETENTION_HOURS);
        assert!(!config.keep_logfiles);
    }

    #[test]
    fn test_current_log_path_is_under_log_directory() {
        let path = current_log_path();
        assert!(path.starts_with(log_directory()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("log"));
    }

    #[test]
    fn test_cleanup_missing_directory_is_noop() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("no-such-dir");
        assert_eq!(cleanup_logs_in(&missing, 1).expect("cleanup"), 0);
    }

    #[test]
    fn test_from_options_maps_keep_logfiles() {
        let kept = LogConfig::from_options(&UserOptions {
            keep_logfiles: true,
            ..UserOptions::default()
        });
        assert!(kept.keep_logfiles);
        assert_eq!(kept.level, DEFAULT_LOG_LEVEL);
        assert_eq!(kept.retention_hours, DEFAULT_LOG_RETENTION_HOURS);

        let cleaned = LogConfig::from_options(&UserOptions::default());
        assert!(!cleaned.keep_logfiles);
    }

    #[test]
    fn test_keep_logfiles_skips_startup_cleanup() {
        let dir = tempfile::tempdir().expect("temp dir");
        let old_log = dir.path().join("old.log");
        fs::write(&old_log, "old").expect("write");
        std::thread::sleep(Duration::from_millis(20));

        let config = LogConfig {
            retention_hours: 0,
            keep_logfiles: true,
            ..LogConfig::default()
        };
        assert_eq!(startup_cleanup(&config, dir.path()).expect("cleanup"), 0);
        assert!(old_log.exists());

        let config = LogConfig {
            retention_hours: 0,
            ..LogConfig::default()
        };
        assert_eq!(startup_cleanup(&config, dir.path()).expect("cleanup"), 1);
        assert!(!old_log.exists());
    }

    #[test]
    fn test_cleanup_removes_only_expired_log_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let old_log = dir.path().join("old.log");
        let other = dir.path().join("notes.txt");
        fs::write(&old_log, "old").expect("write");
        fs::write(&other, "keep").expect("write");

        // Retention of zero hours expires everything written before now.
        std::thread::sleep(Duration::from_millis(20));
        let deleted = cleanup_logs_in(dir.path(), 0).expect("cleanup");

        assert_eq!(deleted, 1);
        assert!(!old_log.exists());
        assert!(other.exists());
    }
}
