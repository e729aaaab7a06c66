//! User-configured mouse settings.
//!
//! Values live in a per-user key-value store (the registry on Windows) as
//! strings. Reading is best effort: a value that cannot be read is treated as
//! empty, which parses to `0.0`.

mod parse;
#[cfg(target_os = "windows")]
mod registry;

use std::collections::HashMap;

use strum::{Display, EnumIter, IntoStaticStr};
use tracing::{debug, warn};

use crate::error::Result;

pub use parse::parse_sensitivity;
#[cfg(target_os = "windows")]
pub use registry::RegistrySettings;

/// Registry key under HKEY_CURRENT_USER holding the settings
pub const SETTINGS_KEY: &str = r"SOFTWARE\HaloFixDLL";

/// Buffer size in bytes for a single value read
pub const MAX_VALUE_BYTES: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, EnumIter)]
pub enum SettingName {
    SensX,
    SensY,
    MouseAcceleration,
}

impl SettingName {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// A source of string settings.
pub trait SettingsStore {
    /// Returns `Ok(None)` when the value does not exist.
    fn read_string(&self, name: SettingName) -> Result<Option<String>>;
}

impl<T: SettingsStore + ?Sized> SettingsStore for &T {
    fn read_string(&self, name: SettingName) -> Result<Option<String>> {
        (**self).read_string(name)
    }
}

/// Map-backed settings, for hosts without a registry
#[derive(Debug, Clone, Default)]
pub struct InMemorySettings {
    values: HashMap<SettingName, String>,
}

impl InMemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: SettingName, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: SettingName, value: impl Into<String>) {
        self.values.insert(name, value.into());
    }
}

impl SettingsStore for InMemorySettings {
    fn read_string(&self, name: SettingName) -> Result<Option<String>> {
        Ok(self.values.get(&name).cloned())
    }
}

/// Raw `MouseAcceleration` setting.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccelerationSetting {
    pub raw: String,
}

impl AccelerationSetting {
    /// The user asked to keep the game's own acceleration ("1")
    pub fn keeps_acceleration(&self) -> bool {
        parse_sensitivity(&self.raw) == 1.0
    }
}

/// Settings resolved for one patch run
#[derive(Debug, Clone, PartialEq)]
pub struct MouseSettings {
    pub sens_x: f32,
    pub sens_y: f32,
    pub acceleration: AccelerationSetting,
}

impl MouseSettings {
    /// Read and parse all three values. Never fails: unreadable values
    /// degrade to the empty string.
    pub fn load<S: SettingsStore + ?Sized>(store: &S) -> Self {
        let sens_x = read_or_empty(store, SettingName::SensX);
        let sens_y = read_or_empty(store, SettingName::SensY);
        let acceleration = read_or_empty(store, SettingName::MouseAcceleration);

        let settings = Self {
            sens_x: parse_sensitivity(&sens_x),
            sens_y: parse_sensitivity(&sens_y),
            acceleration: AccelerationSetting { raw: acceleration },
        };
        debug!("Loaded mouse settings: {:?}", settings);
        settings
    }
}

fn read_or_empty<S: SettingsStore + ?Sized>(store: &S, name: SettingName) -> String {
    match store.read_string(name) {
        Ok(Some(value)) => value,
        Ok(None) => {
            warn!("Setting {} is not set, treating as empty", name);
            String::new()
        }
        Err(e) => {
            warn!("{}, treating as empty", e);
            String::new()
        }
    }
}
