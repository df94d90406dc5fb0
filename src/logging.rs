//! Diagnostic logging set-up.
//!
//! This is separate from the interaction transcript: it carries `tracing`
//! events about loading and generation, never prompt/response records.

use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise `debug` when verbose, else `quiet_level`.
fn env_filter(verbose: bool, quiet_level: &str) -> EnvFilter {
    let default_level = if verbose { "debug" } else { quiet_level };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

#[cfg(feature = "debug-log")]
mod inner {
    use super::*;
    use std::fs;
    use tracing_appender::non_blocking::WorkerGuard;
    use tracing_subscriber::{fmt, prelude::*};

    static LOG_PATH: std::sync::OnceLock<PathBuf> = std::sync::OnceLock::new();

    /// Writes JSON events to `locallm-debug.log`; the guard flushes on drop.
    pub fn init(verbose: bool) -> Option<(PathBuf, WorkerGuard)> {
        let log_path = PathBuf::from("locallm-debug.log");

        let file = match fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Failed to open log file: {e}");
                return None;
            }
        };

        let (non_blocking, guard) = tracing_appender::non_blocking(file);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter(verbose, "info"))
            .with(
                fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            );

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            eprintln!("Failed to set tracing subscriber");
            return None;
        }

        LOG_PATH.set(log_path.clone()).ok();

        tracing::info!(verbose, path = %log_path.display(), "Debug logging initialized");

        Some((log_path, guard))
    }

    pub fn log_file_path() -> Option<&'static PathBuf> {
        LOG_PATH.get()
    }
}

#[cfg(not(feature = "debug-log"))]
mod inner {
    use super::*;
    use tracing_subscriber::{fmt, prelude::*};

    /// Installs a compact stderr subscriber.
    pub fn init(verbose: bool) -> Option<(PathBuf, ())> {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter(verbose, "warn"))
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            );

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            eprintln!("Failed to set tracing subscriber");
        }

        None
    }

    #[inline(always)]
    pub fn log_file_path() -> Option<&'static PathBuf> {
        None
    }
}

pub use inner::*;
