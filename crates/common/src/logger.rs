use crate::error::LongsumError;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "longsum.log";

/// Initialize logging
///
/// Events always go to stderr so stdout carries only command output. When
/// `log_dir` is given they are also appended to `longsum.log` in it, without
/// ANSI colors. `RUST_LOG` takes precedence over `log_level`.
pub fn setup_logging(log_dir: Option<&Path>, log_level: &str) -> Result<(), LongsumError> {
    let log_file = log_dir.map(open_log_file).transpose()?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_filter(build_filter(log_level));

    let file_layer = log_file.as_ref().map(|(_, file)| {
        fmt::layer()
            .with_writer(Arc::clone(file))
            .with_ansi(false)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_filter(build_filter(log_level))
    });

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LongsumError::config(format!("Failed to initialize logging: {}", e)))?;

    match &log_file {
        Some((path, _)) => tracing::info!("Logging initialized: level={}, log_file={}", log_level, path.display()),
        None => tracing::debug!("Logging initialized: level={}", log_level),
    }

    Ok(())
}

/// Create `log_dir` if needed and open the log file in append mode
fn open_log_file(log_dir: &Path) -> Result<(PathBuf, Arc<File>), LongsumError> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        LongsumError::config(format!("Failed to create log directory {}: {}", log_dir.display(), e))
    })?;

    let path = log_dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| LongsumError::config(format!("Failed to open log file {}: {}", path.display(), e)))?;

    Ok((path, Arc::new(file)))
}

fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(parse_log_level(log_level).as_str().to_lowercase()))
}

/// Parse a level name, falling back to INFO
pub fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to INFO", level);
            Level::INFO
        }
    }
}
