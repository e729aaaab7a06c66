use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Log file written next to the host executable
pub const LOG_FILE: &str = "halofix.log";

/// Environment variable overriding the log filter
pub const LOG_ENV: &str = "HALOFIX_LOG";

const DEFAULT_FILTER: &str = "halofix=info,halofix_dll=info";

pub fn open_log(dir: &Path) -> Result<File> {
    let path = dir.join(LOG_FILE);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

pub fn build_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(dir: &Path) -> Result<()> {
    let file = open_log(dir)?;

    // The host may already have a subscriber installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter())
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_log_creates_file() {
        let dir = tempdir().unwrap();

        open_log(dir.path()).unwrap();

        assert!(dir.path().join(LOG_FILE).exists());
    }

    #[test]
    fn test_open_log_in_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = open_log(&missing).unwrap_err();

        assert!(err.to_string().contains(LOG_FILE));
    }
}
