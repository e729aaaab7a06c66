//! # halofix
//!
//! In-process mouse fix for Halo PC.
//!
//! This crate provides:
//! - Sensitivity override: user values from the registry are written into
//!   the game's sensitivity fields
//! - Acceleration removal: the acceleration routine is blanked with NOPs
//!   under a scoped page-protection change
//! - Offset tables keyed by the image's link timestamp, with optional
//!   verification of the code being replaced
//!
//! All memory access goes through [`ProcessMemory`]; on Windows
//! [`CurrentProcess`] implements it for the process the library is loaded
//! into.

pub mod config;
pub mod error;
pub mod memory;
pub mod offset;
pub mod patch;
pub mod settings;
pub mod target;

use tracing::info;

pub use config::{AccelerationPolicy, CONFIG_FILE, PatchConfig};
pub use error::{Error, Result};
#[cfg(target_os = "windows")]
pub use memory::CurrentProcess;
pub use memory::{ProcessMemory, Protection, ProtectionGuard};
pub use offset::{CodeRegion, OffsetRegistry, OffsetTable, load_offsets, save_offsets};
pub use patch::{PatchReport, Patcher, set_protection_and_fill};
#[cfg(target_os = "windows")]
pub use settings::RegistrySettings;
pub use settings::{InMemorySettings, MouseSettings, SettingName, SettingsStore, parse_sensitivity};
pub use target::{PatchTarget, ResolvedRegion};

/// Run the whole patch once: locate the target, read settings, write.
pub fn apply_patch<M, S>(memory: M, settings: &S, config: &PatchConfig) -> Result<PatchReport>
where
    M: ProcessMemory,
    S: SettingsStore + ?Sized,
{
    let registry = config.offsets()?;
    let target = PatchTarget::locate(&memory, &registry, config.verify_code)?;
    info!(
        "Using offset table '{}' at base {:#x}",
        target.version, target.base
    );

    let mouse = MouseSettings::load(settings);

    Patcher::new(memory)
        .with_acceleration_policy(config.acceleration)
        .apply_patch(&target, &mouse)
}
