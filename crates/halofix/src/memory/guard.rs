use tracing::{trace, warn};

use super::{ProcessMemory, Protection};
use crate::error::{Error, Result};

/// Temporarily changed page protection for one region.
///
/// The protection captured on acquisition is put back when the guard is
/// dropped or when [`ProtectionGuard::restore`] is called. `restore` reports
/// failure; `Drop` can only log it.
pub struct ProtectionGuard<'a, M: ProcessMemory + ?Sized> {
    memory: &'a M,
    address: u64,
    len: usize,
    original: Protection,
    restored: bool,
}

impl<'a, M: ProcessMemory + ?Sized> ProtectionGuard<'a, M> {
    pub fn acquire(memory: &'a M, address: u64, len: usize, protection: Protection) -> Result<Self> {
        let original = memory.protect(address, len, protection)?;
        trace!(
            "Protection at {:#x} ({} bytes): {} -> {}",
            address, len, original, protection
        );

        Ok(Self {
            memory,
            address,
            len,
            original,
            restored: false,
        })
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    /// Protection in effect before the guard was acquired
    pub fn original(&self) -> Protection {
        self.original
    }

    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        self.put_back()
    }

    fn put_back(&self) -> Result<()> {
        self.memory
            .protect(self.address, self.len, self.original)
            .map(|_| ())
            .map_err(|e| Error::ProtectionRestoreFailed {
                address: self.address,
                len: self.len,
                message: e.to_string(),
            })
    }
}

impl<M: ProcessMemory + ?Sized> Drop for ProtectionGuard<'_, M> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = self.put_back() {
            warn!("{}", e);
        }
    }
}
