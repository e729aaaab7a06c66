pub mod layout;
mod guard;
#[cfg(target_os = "windows")]
mod process;
mod protection;

#[cfg(test)]
pub mod mock;

pub use guard::ProtectionGuard;
#[cfg(target_os = "windows")]
pub use process::CurrentProcess;
pub use protection::Protection;

#[cfg(test)]
pub use mock::{MockProcess, MockProcessBuilder};

use crate::error::{Error, Result};

/// Read/write access to the address space of the patched process.
///
/// Addresses are absolute. Implementations must refuse access to memory that
/// is not mapped instead of faulting.
pub trait ProcessMemory {
    /// Load address of the primary executable module
    fn base_address(&self) -> Result<u64>;

    fn read_bytes(&self, address: u64, len: usize) -> Result<Vec<u8>>;

    fn write_bytes(&self, address: u64, data: &[u8]) -> Result<()>;

    /// Change the protection of `[address, address + len)` and return the
    /// protection that was in effect before the call.
    fn protect(&self, address: u64, len: usize, protection: Protection) -> Result<Protection>;

    fn read_u32(&self, address: u64) -> Result<u32> {
        let bytes = self.read_bytes(address, 4)?;
        let word: [u8; 4] = bytes.as_slice().try_into().map_err(|_| Error::MemoryAccess {
            address,
            len: 4,
            message: format!("short read of {} bytes", bytes.len()),
        })?;
        Ok(u32::from_le_bytes(word))
    }

    fn read_f32(&self, address: u64) -> Result<f32> {
        self.read_u32(address).map(f32::from_bits)
    }

    fn write_f32(&self, address: u64, value: f32) -> Result<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }

    fn fill(&self, address: u64, len: usize, byte: u8) -> Result<()> {
        self.write_bytes(address, &vec![byte; len])
    }

    /// Make rewritten code in `[address, address + len)` visible to the
    /// instruction fetcher. Targets without a separate code cache need not
    /// override it.
    fn flush_code(&self, _address: u64, _len: usize) -> Result<()> {
        Ok(())
    }
}

impl<T: ProcessMemory + ?Sized> ProcessMemory for &T {
    fn base_address(&self) -> Result<u64> {
        (**self).base_address()
    }

    fn read_bytes(&self, address: u64, len: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, len)
    }

    fn write_bytes(&self, address: u64, data: &[u8]) -> Result<()> {
        (**self).write_bytes(address, data)
    }

    fn protect(&self, address: u64, len: usize, protection: Protection) -> Result<Protection> {
        (**self).protect(address, len, protection)
    }

    fn flush_code(&self, address: u64, len: usize) -> Result<()> {
        (**self).flush_code(address, len)
    }
}
