//! Patch configuration
//!
//! Loaded from an optional JSON file. Every field has a default, so an empty
//! object (or no file at all) reproduces the stock behavior.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::offset::{OffsetRegistry, load_offsets};
use crate::settings::{AccelerationSetting, SETTINGS_KEY};

/// Default config file name, looked up next to the host executable
pub const CONFIG_FILE: &str = "halofix.json";

/// When to blank the acceleration routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccelerationPolicy {
    /// Always neutralize, whatever `MouseAcceleration` says
    #[default]
    Always,
    /// Leave the routine alone when `MouseAcceleration` is 1
    RespectSetting,
}

impl AccelerationPolicy {
    pub fn should_neutralize(&self, setting: &AccelerationSetting) -> bool {
        match self {
            Self::Always => true,
            Self::RespectSetting => !setting.keeps_acceleration(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    /// Registry key under HKEY_CURRENT_USER
    pub settings_key: String,
    /// External offset registry; the built-in table is used when unset
    pub offsets_path: Option<PathBuf>,
    pub acceleration: AccelerationPolicy,
    /// Check code regions against their expected bytes before writing
    pub verify_code: bool,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            settings_key: SETTINGS_KEY.to_string(),
            offsets_path: None,
            acceleration: AccelerationPolicy::default(),
            verify_code: true,
        }
    }
}

impl PatchConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Self = serde_json::from_str(&content)?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Offset registry named by `offsets_path`, or the built-in one
    pub fn offsets(&self) -> Result<OffsetRegistry> {
        match &self.offsets_path {
            Some(path) => load_offsets(path),
            None => Ok(OffsetRegistry::builtin()),
        }
    }
}
