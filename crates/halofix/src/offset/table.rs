use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::pattern::parse_pattern;
use crate::error::{Error, Result};
use crate::memory::layout;

/// A run of code to be blanked with NOPs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeRegion {
    pub name: String,
    /// Offset from the module base
    pub offset: u64,
    pub len: usize,
    /// Bytes expected at the region before patching (`??` wildcards)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

impl CodeRegion {
    pub fn expected_bytes(&self) -> Result<Option<Vec<Option<u8>>>> {
        let Some(expected) = &self.expected else {
            return Ok(None);
        };

        let pattern = parse_pattern(expected)?;
        if pattern.len() != self.len {
            return Err(Error::InvalidPattern(format!(
                "region '{}' is {} bytes but its pattern has {}",
                self.name,
                self.len,
                pattern.len()
            )));
        }
        Ok(Some(pattern))
    }
}

/// Field and code offsets for one build of the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetTable {
    pub version: String,
    /// PE link timestamp of the build; `None` matches any image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u32>,
    pub sensitivity_x: u64,
    pub sensitivity_y: u64,
    pub regions: Vec<CodeRegion>,
}

impl OffsetTable {
    pub fn is_wildcard(&self) -> bool {
        self.timestamp.is_none()
    }

    pub fn is_valid(&self) -> bool {
        !self.version.is_empty()
            && self.sensitivity_x != 0
            && self.sensitivity_y != 0
            && self.regions.iter().all(|r| r.offset != 0 && r.len != 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetRegistry {
    pub tables: Vec<OffsetTable>,
}

impl OffsetRegistry {
    /// Offsets of the retail build, applied without a version check
    pub fn builtin() -> Self {
        Self {
            tables: vec![OffsetTable {
                version: "builtin".to_string(),
                timestamp: None,
                sensitivity_x: layout::sensitivity::X,
                sensitivity_y: layout::sensitivity::Y,
                regions: vec![
                    CodeRegion {
                        name: "accel_entry".to_string(),
                        offset: layout::acceleration::ENTRY,
                        len: layout::acceleration::PATCH_LEN,
                        expected: None,
                    },
                    CodeRegion {
                        name: "accel_entry_2".to_string(),
                        offset: layout::acceleration::ENTRY_2,
                        len: layout::acceleration::PATCH_LEN,
                        expected: None,
                    },
                ],
            }],
        }
    }

    /// Pick the table for an image. An exact timestamp match wins over a
    /// wildcard table; an unknown timestamp only matches wildcards.
    pub fn select(&self, timestamp: Option<u32>) -> Result<&OffsetTable> {
        let exact = timestamp.and_then(|ts| self.tables.iter().find(|t| t.timestamp == Some(ts)));
        let table = exact
            .or_else(|| self.tables.iter().find(|t| t.is_wildcard()))
            .ok_or_else(|| {
                Error::UnknownBinary(
                    timestamp
                        .map(|ts| format!("{:#010x}", ts))
                        .unwrap_or_else(|| "(unknown)".to_string()),
                )
            })?;

        debug!(
            "Selected offset table '{}' for image timestamp {:?}",
            table.version, timestamp
        );
        Ok(table)
    }
}

pub fn load_offsets<P: AsRef<Path>>(path: P) -> Result<OffsetRegistry> {
    let content = fs::read_to_string(&path)?;
    let registry: OffsetRegistry = serde_json::from_str(&content)?;

    if let Some(bad) = registry.tables.iter().find(|t| !t.is_valid()) {
        return Err(Error::InvalidOffset(format!(
            "offset table '{}' has zero offsets or lengths",
            bad.version
        )));
    }
    for region in registry.tables.iter().flat_map(|t| &t.regions) {
        region.expected_bytes()?;
    }

    info!(
        "Loaded {} offset table(s) from {}",
        registry.tables.len(),
        path.as_ref().display()
    );
    Ok(registry)
}

pub fn save_offsets<P: AsRef<Path>>(path: P, registry: &OffsetRegistry) -> Result<()> {
    let content = serde_json::to_string_pretty(registry)?;
    fs::write(path, content)?;
    Ok(())
}
