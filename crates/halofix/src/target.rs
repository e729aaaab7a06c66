//! Resolved patch target: the module base plus absolute addresses of one
//! offset table.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::memory::{ProcessMemory, layout};
use crate::offset::{
    OffsetRegistry, OffsetTable, format_bytes, image_timestamp, pattern_matches,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRegion {
    pub name: String,
    pub address: u64,
    pub len: usize,
}

/// Everything the patcher is allowed to touch, in absolute addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTarget {
    pub version: String,
    pub base: u64,
    pub sensitivity_x: u64,
    pub sensitivity_y: u64,
    pub regions: Vec<ResolvedRegion>,
}

fn absolute(base: u64, offset: u64) -> Result<u64> {
    base.checked_add(offset)
        .ok_or(Error::AddressOverflow { base, offset })
}

impl PatchTarget {
    /// Compute absolute addresses for `table` relative to `base`.
    ///
    /// With `verify`, every region that declares expected bytes must either
    /// match them or already consist of NOPs.
    pub fn resolve<M: ProcessMemory + ?Sized>(
        memory: &M,
        base: u64,
        table: &OffsetTable,
        verify: bool,
    ) -> Result<Self> {
        let mut regions = Vec::with_capacity(table.regions.len());
        for region in &table.regions {
            let address = absolute(base, region.offset)?;

            if verify {
                if let Some(expected) = region.expected_bytes()? {
                    let actual = memory.read_bytes(address, region.len)?;
                    let patched = actual.iter().all(|&b| b == layout::NOP);
                    if !patched && !pattern_matches(&expected, &actual) {
                        return Err(Error::SignatureMismatch {
                            region: region.name.clone(),
                            address,
                            expected: region.expected.clone().unwrap_or_default(),
                            actual: format_bytes(&actual),
                        });
                    }
                }
            }

            regions.push(ResolvedRegion {
                name: region.name.clone(),
                address,
                len: region.len,
            });
        }

        let target = Self {
            version: table.version.clone(),
            base,
            sensitivity_x: absolute(base, table.sensitivity_x)?,
            sensitivity_y: absolute(base, table.sensitivity_y)?,
            regions,
        };
        debug!("Resolved patch target: {:?}", target);
        Ok(target)
    }

    /// Resolve the base address, identify the image and pick a table from
    /// `registry`.
    pub fn locate<M: ProcessMemory + ?Sized>(
        memory: &M,
        registry: &OffsetRegistry,
        verify: bool,
    ) -> Result<Self> {
        let base = memory.base_address()?;

        let timestamp = match image_timestamp(memory, base) {
            Ok(ts) => Some(ts),
            Err(e) => {
                warn!("Could not identify image at {:#x}: {}", base, e);
                None
            }
        };

        let table = registry.select(timestamp)?;
        Self::resolve(memory, base, table, verify)
    }
}
