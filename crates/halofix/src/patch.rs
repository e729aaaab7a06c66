//! Sensitivity override and acceleration neutralization.

use tracing::{debug, info};

use crate::config::AccelerationPolicy;
use crate::error::Result;
use crate::memory::{ProcessMemory, Protection, ProtectionGuard, layout};
use crate::settings::MouseSettings;
use crate::target::PatchTarget;

/// Make `[address, address + len)` writable and fill it with NOPs. The
/// instruction cache is flushed for the range before the previous protection
/// is put back.
///
/// Nothing is written if the protection change fails. Protection is restored
/// on every path once it has been changed.
pub fn set_protection_and_fill<M: ProcessMemory + ?Sized>(
    memory: &M,
    address: u64,
    len: usize,
) -> Result<()> {
    let guard = ProtectionGuard::acquire(memory, address, len, Protection::EXECUTE_READWRITE)?;
    memory.fill(address, len, layout::NOP)?;
    memory.flush_code(address, len)?;
    guard.restore()
}

/// What a patch run changed
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatchReport {
    pub base: u64,
    pub version: String,
    pub sens_x: f32,
    pub sens_y: f32,
    pub neutralized: Vec<String>,
    pub skipped: Vec<String>,
}

pub struct Patcher<M: ProcessMemory> {
    memory: M,
    acceleration: AccelerationPolicy,
}

impl<M: ProcessMemory> Patcher<M> {
    pub fn new(memory: M) -> Self {
        Self {
            memory,
            acceleration: AccelerationPolicy::default(),
        }
    }

    pub fn with_acceleration_policy(mut self, policy: AccelerationPolicy) -> Self {
        self.acceleration = policy;
        self
    }

    /// Write both sensitivity fields, then blank the acceleration regions.
    ///
    /// Running it again with the same settings leaves memory unchanged.
    pub fn apply_patch(&self, target: &PatchTarget, settings: &MouseSettings) -> Result<PatchReport> {
        self.memory.write_f32(target.sensitivity_x, settings.sens_x)?;
        self.memory.write_f32(target.sensitivity_y, settings.sens_y)?;
        debug!(
            "Wrote sensitivity {} at {:#x}, {} at {:#x}",
            settings.sens_x, target.sensitivity_x, settings.sens_y, target.sensitivity_y
        );

        let mut report = PatchReport {
            base: target.base,
            version: target.version.clone(),
            sens_x: settings.sens_x,
            sens_y: settings.sens_y,
            ..Default::default()
        };

        let neutralize = self.acceleration.should_neutralize(&settings.acceleration);
        for region in &target.regions {
            if !neutralize {
                report.skipped.push(region.name.clone());
                continue;
            }
            set_protection_and_fill(&self.memory, region.address, region.len)?;
            debug!("Neutralized {} at {:#x}", region.name, region.address);
            report.neutralized.push(region.name.clone());
        }

        info!(
            "Patched {} (base {:#x}): sensitivity {}/{}, neutralized [{}], skipped [{}]",
            report.version,
            report.base,
            report.sens_x,
            report.sens_y,
            report.neutralized.join(", "),
            report.skipped.join(", ")
        );
        Ok(report)
    }
}
