use std::ffi::c_void;

use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_SUCCESS};
use windows::Win32::System::Registry::{HKEY_CURRENT_USER, RRF_RT_REG_SZ, RegGetValueW};
use windows::core::PCWSTR;

use super::{MAX_VALUE_BYTES, SETTINGS_KEY, SettingName, SettingsStore};
use crate::error::{Error, Result};

/// String values under a key of HKEY_CURRENT_USER
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    key: String,
}

impl RegistrySettings {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self::new(SETTINGS_KEY)
    }
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

impl SettingsStore for RegistrySettings {
    fn read_string(&self, name: SettingName) -> Result<Option<String>> {
        let key = to_wide(&self.key);
        let value = to_wide(name.as_str());
        let mut buffer = [0u16; MAX_VALUE_BYTES.div_ceil(2)];
        let mut size = MAX_VALUE_BYTES as u32;

        // SAFETY: both names are NUL-terminated and outlive the call; `size`
        // never exceeds the byte length of `buffer`.
        let status = unsafe {
            RegGetValueW(
                HKEY_CURRENT_USER,
                PCWSTR(key.as_ptr()),
                PCWSTR(value.as_ptr()),
                RRF_RT_REG_SZ,
                None,
                Some(buffer.as_mut_ptr() as *mut c_void),
                Some(&mut size as *mut u32),
            )
        };

        if status == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        if status != ERROR_SUCCESS {
            return Err(Error::SettingsRead {
                name: name.to_string(),
                message: format!(r"HKCU\{}: {}", self.key, windows::core::Error::from(status.to_hresult())),
            });
        }

        // `size` includes the terminating NUL
        let chars = (size as usize / 2).min(buffer.len());
        let text = &buffer[..chars];
        let text = text.split(|&c| c == 0).next().unwrap_or_default();
        Ok(Some(String::from_utf16_lossy(text)))
    }
}
