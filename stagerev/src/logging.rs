//! Opt-in file logging.
//!
//! The TUI owns the terminal, so log lines go to `<temp_dir>/stagerev.log`
//! instead of stderr. Nothing is installed unless `STAGEREV_LOG` is set, e.g.
//! `STAGEREV_LOG=stagerev=debug,stagerev_core=debug`.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the `EnvFilter` directives.
pub const LOG_ENV: &str = "STAGEREV_LOG";

pub fn log_path() -> PathBuf {
    std::env::temp_dir().join("stagerev.log")
}

/// Installs the global subscriber when `STAGEREV_LOG` is set.
///
/// Returns the log file path when logging is active.
///
/// # Errors
///
/// Fails on invalid filter directives or an unopenable log file.
pub fn init() -> anyhow::Result<Option<PathBuf>> {
    let Ok(directives) = std::env::var(LOG_ENV) else {
        return Ok(None);
    };
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid {LOG_ENV} value '{directives}'"))?;

    let path = log_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(Some(path))
}
