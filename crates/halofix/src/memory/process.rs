//! Access to the memory of the process this library is loaded into.

use std::ffi::c_void;
use std::mem::{size_of, zeroed};
use std::ptr;

use tracing::debug;
use windows::Win32::System::Diagnostics::Debug::FlushInstructionCache;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Memory::{
    MEM_COMMIT, MEMORY_BASIC_INFORMATION, PAGE_PROTECTION_FLAGS, VirtualProtect, VirtualQuery,
};
use windows::Win32::System::Threading::GetCurrentProcess;
use windows::core::PCWSTR;

use super::{ProcessMemory, Protection};
use crate::error::{Error, Result};

/// The calling process, addressed directly through raw pointers.
///
/// Every access is preceded by a `VirtualQuery` check so that unmapped or
/// inaccessible memory yields an error instead of an access violation.
pub struct CurrentProcess {
    _private: (),
}

impl CurrentProcess {
    /// # Safety
    ///
    /// Writes through this handle alter live memory of the calling process,
    /// including code that other threads may be executing. The caller must
    /// ensure the targeted bytes belong to the module layout it expects.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }

    fn query(address: u64) -> Option<MEMORY_BASIC_INFORMATION> {
        // SAFETY: VirtualQuery only inspects the address space and fills `info`.
        unsafe {
            let mut info: MEMORY_BASIC_INFORMATION = zeroed();
            let written = VirtualQuery(
                Some(address as usize as *const c_void),
                &mut info,
                size_of::<MEMORY_BASIC_INFORMATION>(),
            );
            (written != 0).then_some(info)
        }
    }

    /// Check that every page of `[address, address + len)` is committed and
    /// passes `accessible`.
    fn check_range(
        address: u64,
        len: usize,
        accessible: impl Fn(Protection) -> bool,
    ) -> std::result::Result<(), String> {
        if address < 0x10000 {
            return Err("address below the lowest mappable page".to_string());
        }
        let end = address
            .checked_add(len as u64)
            .ok_or_else(|| "range overflows the address space".to_string())?;

        let mut cursor = address;
        while cursor < end {
            let info = Self::query(cursor).ok_or_else(|| "VirtualQuery failed".to_string())?;
            let protection = Protection(info.Protect.0);

            if info.State != MEM_COMMIT {
                return Err(format!("memory at {:#x} is not committed", cursor));
            }
            if protection.is_guard() || !accessible(protection) {
                return Err(format!("page at {:#x} is {}", cursor, protection));
            }

            let region_end = info.BaseAddress as usize as u64 + info.RegionSize as u64;
            if region_end <= cursor {
                return Err(format!("empty region at {:#x}", cursor));
            }
            cursor = region_end;
        }

        Ok(())
    }
}

impl ProcessMemory for CurrentProcess {
    fn base_address(&self) -> Result<u64> {
        // SAFETY: a null module name returns the handle of the executable,
        // which stays loaded for the lifetime of the process.
        let module = unsafe { GetModuleHandleW(PCWSTR::null()) }
            .map_err(|e| Error::ModuleBaseUnavailable(e.to_string()))?;

        let base = module.0 as usize as u64;
        debug!("Primary module base: {:#x}", base);
        Ok(base)
    }

    fn read_bytes(&self, address: u64, len: usize) -> Result<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }

        Self::check_range(address, len, Protection::is_readable).map_err(|message| {
            Error::MemoryAccess {
                address,
                len,
                message,
            }
        })?;

        let mut buffer = vec![0u8; len];
        // SAFETY: the whole range was just verified committed and readable.
        unsafe {
            ptr::copy_nonoverlapping(address as usize as *const u8, buffer.as_mut_ptr(), len);
        }
        Ok(buffer)
    }

    fn write_bytes(&self, address: u64, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        Self::check_range(address, data.len(), Protection::is_writable).map_err(|message| {
            Error::MemoryAccess {
                address,
                len: data.len(),
                message,
            }
        })?;

        // SAFETY: the whole range was just verified committed and writable.
        unsafe {
            ptr::copy_nonoverlapping(data.as_ptr(), address as usize as *mut u8, data.len());
        }
        Ok(())
    }

    fn protect(&self, address: u64, len: usize, protection: Protection) -> Result<Protection> {
        let mut old = PAGE_PROTECTION_FLAGS(0);

        // SAFETY: VirtualProtect validates the range itself and fails on
        // unmapped memory; no memory is dereferenced here.
        unsafe {
            VirtualProtect(
                address as usize as *const c_void,
                len,
                PAGE_PROTECTION_FLAGS(protection.0),
                &mut old,
            )
        }
        .map_err(|e| Error::ProtectionChangeFailed {
            address,
            len,
            message: e.to_string(),
        })?;

        Ok(Protection(old.0))
    }
    fn flush_code(&self, address: u64, len: usize) -> Result<()> {
        // SAFETY: the pseudo handle of the current process needs no closing;
        // the call only invalidates cache lines.
        unsafe {
            FlushInstructionCache(
                GetCurrentProcess(),
                Some(address as usize as *const c_void),
                len,
            )
        }
        .map_err(|e| Error::MemoryAccess {
            address,
            len,
            message: format!("instruction cache flush failed: {}", e),
        })
    }
}
