//! In-memory stand-in for a loaded executable image.

use std::cell::RefCell;

use super::{ProcessMemory, Protection, layout};
use crate::error::{Error, Result};

const PAGE_SIZE: u64 = 0x1000;

pub const DEFAULT_BASE: u64 = 0x0040_0000;
/// Large enough to hold the sensitivity fields
pub const DEFAULT_IMAGE_LEN: usize = 0x2B_0000;
/// End of the simulated .text section
pub const DEFAULT_CODE_END: u64 = 0x20_0000;

pub struct MockProcess {
    base: u64,
    bytes: RefCell<Vec<u8>>,
    pages: RefCell<Vec<Protection>>,
    protect_log: RefCell<Vec<(u64, usize, Protection)>>,
    flush_log: RefCell<Vec<(u64, usize)>>,
    base_available: bool,
}

impl MockProcess {
    pub fn builder() -> MockProcessBuilder {
        MockProcessBuilder::default()
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn image_len(&self) -> usize {
        self.bytes.borrow().len()
    }

    pub fn protection_at(&self, address: u64) -> Protection {
        let page = ((address - self.base) / PAGE_SIZE) as usize;
        self.pages.borrow()[page]
    }

    /// Successful protect calls as (address, len, requested protection)
    pub fn protect_log(&self) -> Vec<(u64, usize, Protection)> {
        self.protect_log.borrow().clone()
    }

    /// Instruction cache flushes as (address, len)
    pub fn flush_log(&self) -> Vec<(u64, usize)> {
        self.flush_log.borrow().clone()
    }

    pub fn snapshot(&self) -> Vec<u8> {
        self.bytes.borrow().clone()
    }

    fn offset_of(&self, address: u64, len: usize) -> Option<(usize, usize)> {
        let start = address.checked_sub(self.base)? as usize;
        let end = start.checked_add(len)?;
        (end <= self.image_len()).then_some((start, end))
    }

    fn page_range(start: usize, end: usize) -> std::ops::Range<usize> {
        let first = start / PAGE_SIZE as usize;
        let last = (end.max(start + 1) - 1) / PAGE_SIZE as usize;
        first..last + 1
    }
}

impl ProcessMemory for MockProcess {
    fn base_address(&self) -> Result<u64> {
        if self.base_available {
            Ok(self.base)
        } else {
            Err(Error::ModuleBaseUnavailable("mock module not loaded".to_string()))
        }
    }

    fn read_bytes(&self, address: u64, len: usize) -> Result<Vec<u8>> {
        let (start, end) = self.offset_of(address, len).ok_or(Error::InvalidAddress(address))?;
        let pages = self.pages.borrow();
        if Self::page_range(start, end).any(|p| !pages[p].is_readable()) {
            return Err(Error::MemoryAccess {
                address,
                len,
                message: "page not readable".to_string(),
            });
        }
        Ok(self.bytes.borrow()[start..end].to_vec())
    }

    fn write_bytes(&self, address: u64, data: &[u8]) -> Result<()> {
        let (start, end) = self
            .offset_of(address, data.len())
            .ok_or(Error::InvalidAddress(address))?;
        let pages = self.pages.borrow();
        if Self::page_range(start, end).any(|p| !pages[p].is_writable()) {
            return Err(Error::MemoryAccess {
                address,
                len: data.len(),
                message: "page not writable".to_string(),
            });
        }
        self.bytes.borrow_mut()[start..end].copy_from_slice(data);
        Ok(())
    }

    fn protect(&self, address: u64, len: usize, protection: Protection) -> Result<Protection> {
        let (start, end) = self
            .offset_of(address, len)
            .ok_or_else(|| Error::ProtectionChangeFailed {
                address,
                len,
                message: "address is not mapped".to_string(),
            })?;

        let mut pages = self.pages.borrow_mut();
        let range = Self::page_range(start, end);
        let old = pages[range.start];
        for page in range {
            pages[page] = protection;
        }
        self.protect_log.borrow_mut().push((address, len, protection));
        Ok(old)
    }

    fn flush_code(&self, address: u64, len: usize) -> Result<()> {
        self.offset_of(address, len).ok_or(Error::InvalidAddress(address))?;
        self.flush_log.borrow_mut().push((address, len));
        Ok(())
    }
}

pub struct MockProcessBuilder {
    base: u64,
    image_len: usize,
    regions: Vec<(u64, usize, Protection)>,
    patches: Vec<(u64, Vec<u8>)>,
    timestamp: Option<u32>,
    base_available: bool,
}

impl Default for MockProcessBuilder {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE,
            image_len: DEFAULT_IMAGE_LEN,
            regions: vec![
                (0, PAGE_SIZE as usize, Protection::READONLY),
                (
                    PAGE_SIZE,
                    (DEFAULT_CODE_END - PAGE_SIZE) as usize,
                    Protection::EXECUTE_READ,
                ),
            ],
            patches: Vec::new(),
            timestamp: None,
            base_available: true,
        }
    }
}

impl MockProcessBuilder {
    pub fn base(mut self, base: u64) -> Self {
        self.base = base;
        self
    }

    pub fn image_len(mut self, len: usize) -> Self {
        self.image_len = len;
        self
    }

    /// Override protection for `len` bytes at image offset `offset`
    pub fn protection(mut self, offset: u64, len: usize, protection: Protection) -> Self {
        self.regions.push((offset, len, protection));
        self
    }

    /// Seed bytes at image offset `offset`
    pub fn bytes(mut self, offset: u64, data: &[u8]) -> Self {
        self.patches.push((offset, data.to_vec()));
        self
    }

    /// Emit a minimal PE header carrying `timestamp`
    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn without_module(mut self) -> Self {
        self.base_available = false;
        self
    }

    pub fn build(self) -> MockProcess {
        let mut bytes = vec![0u8; self.image_len];
        let page_count = self.image_len.div_ceil(PAGE_SIZE as usize);
        let mut pages = vec![Protection::READWRITE; page_count];

        for (offset, len, protection) in &self.regions {
            let start = (*offset / PAGE_SIZE) as usize;
            let end = ((*offset as usize + len).div_ceil(PAGE_SIZE as usize)).min(page_count);
            for page in pages.iter_mut().take(end).skip(start) {
                *page = *protection;
            }
        }

        if let Some(timestamp) = self.timestamp {
            let nt = 0x80usize;
            bytes[..2].copy_from_slice(&layout::pe::DOS_MAGIC);
            bytes[layout::pe::E_LFANEW as usize..][..4].copy_from_slice(&(nt as u32).to_le_bytes());
            bytes[nt..nt + 4].copy_from_slice(&layout::pe::NT_SIGNATURE);
            let stamp = nt + layout::pe::TIME_DATE_STAMP as usize;
            bytes[stamp..stamp + 4].copy_from_slice(&timestamp.to_le_bytes());
        }

        for (offset, data) in &self.patches {
            let start = *offset as usize;
            bytes[start..start + data.len()].copy_from_slice(data);
        }

        MockProcess {
            base: self.base,
            bytes: RefCell::new(bytes),
            pages: RefCell::new(pages),
            protect_log: RefCell::new(Vec::new()),
            flush_log: RefCell::new(Vec::new()),
            base_available: self.base_available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let memory = MockProcess::builder().build();
        let base = memory.base();

        assert_eq!(memory.protection_at(base), Protection::READONLY);
        assert_eq!(
            memory.protection_at(base + layout::acceleration::ENTRY),
            Protection::EXECUTE_READ
        );
        assert_eq!(
            memory.protection_at(base + layout::sensitivity::X),
            Protection::READWRITE
        );
    }

    #[test]
    fn test_write_to_code_page_is_rejected() {
        let memory = MockProcess::builder().build();
        let address = memory.base() + layout::acceleration::ENTRY;

        let result = memory.write_bytes(address, &[layout::NOP]);

        assert!(matches!(result, Err(Error::MemoryAccess { .. })));
    }

    #[test]
    fn test_builder_base_and_protection_override() {
        let memory = MockProcess::builder()
            .base(0x1000_0000)
            .protection(layout::sensitivity::X, 8, Protection::READONLY)
            .build();

        assert_eq!(memory.base_address().unwrap(), 0x1000_0000);
        assert_eq!(
            memory.protection_at(0x1000_0000 + layout::sensitivity::Y),
            Protection::READONLY
        );
        assert!(matches!(
            memory.write_f32(0x1000_0000 + layout::sensitivity::X, 1.0),
            Err(Error::MemoryAccess { .. })
        ));
    }

    #[test]
    fn test_access_outside_image_is_invalid() {
        let memory = MockProcess::builder().image_len(0x2000).build();

        assert!(matches!(
            memory.read_bytes(memory.base() + 0x1FFE, 4),
            Err(Error::InvalidAddress(_))
        ));
        assert!(matches!(
            memory.read_bytes(memory.base() - 1, 1),
            Err(Error::InvalidAddress(_))
        ));
    }
}
