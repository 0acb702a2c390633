//! Tracing subscriber setup.
//!
//! Console output always goes to stderr so stdout stays clean for `--json`
//! and converted data. A log file, when configured, gets a second plain-text
//! layer written through a non-blocking appender.

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level used with `--quiet` when `RUST_LOG` is not set.
const QUIET_LEVEL: &str = "error";

/// Build the filter: `RUST_LOG` wins, then the configured level.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file layer on drop and must be held until
/// the process exits. Returns an error message if the log file's directory
/// cannot be created.
pub fn init(
    level: &str,
    quiet: bool,
    log_file: Option<&Path>,
) -> Result<Option<WorkerGuard>, String> {
    let level = if quiet { QUIET_LEVEL } else { level };
    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            let file_name = path
                .file_name()
                .ok_or_else(|| format!("log file path has no file name: {}", path.display()))?;
            fs::create_dir_all(dir)
                .map_err(|e| format!("cannot create log directory {}: {}", dir.display(), e))?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // Ignored if a subscriber is already installed.
    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(console_layer)
        .with(file_layer)
        .try_init();

    Ok(guard)
}
