//! Work done once when the library is loaded into the game.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use halofix::{CONFIG_FILE, PatchConfig, PatchReport, ProcessMemory, SettingsStore};
use tracing::{error, info, warn};

/// Directory of the host executable, falling back to the working directory
pub fn host_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Config from `dir`, or the defaults if it cannot be read
pub fn load_config(dir: &Path) -> PatchConfig {
    let path = dir.join(CONFIG_FILE);
    match PatchConfig::load(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load {}: {}, using defaults", path.display(), e);
            PatchConfig::default()
        }
    }
}

pub fn run<M, S>(memory: M, settings: &S, config: &PatchConfig) -> Result<PatchReport>
where
    M: ProcessMemory,
    S: SettingsStore + ?Sized,
{
    halofix::apply_patch(memory, settings, config).context("Mouse patch not applied")
}

/// Never fails: errors are logged and the host keeps running.
pub fn on_attach<M, S>(memory: M, settings: &S, config: &PatchConfig) -> bool
where
    M: ProcessMemory,
    S: SettingsStore + ?Sized,
{
    info!("halofix {} attached", env!("CARGO_PKG_VERSION"));
    match run(memory, settings, config) {
        Ok(report) => {
            info!(
                "Sensitivity set to {}/{} ({} region(s) neutralized)",
                report.sens_x,
                report.sens_y,
                report.neutralized.len()
            );
            true
        }
        Err(e) => {
            error!("{:#}", e);
            false
        }
    }
}
