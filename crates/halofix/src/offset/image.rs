use crate::error::{Error, Result};
use crate::memory::{ProcessMemory, layout::pe};

/// Read IMAGE_FILE_HEADER.TimeDateStamp of the module loaded at `base`.
///
/// The link timestamp identifies a build well enough to key offset tables.
pub fn image_timestamp<M: ProcessMemory + ?Sized>(memory: &M, base: u64) -> Result<u32> {
    let magic = memory.read_bytes(base, pe::DOS_MAGIC.len())?;
    if magic != pe::DOS_MAGIC {
        return Err(Error::InvalidImage(format!("no DOS header at {:#x}", base)));
    }

    let e_lfanew = memory.read_u32(base + pe::E_LFANEW)? as u64;
    let nt = base
        .checked_add(e_lfanew)
        .ok_or(Error::InvalidAddress(base))?;

    let signature = memory.read_bytes(nt, pe::NT_SIGNATURE.len())?;
    if signature != pe::NT_SIGNATURE {
        return Err(Error::InvalidImage(format!("no PE signature at {:#x}", nt)));
    }

    memory.read_u32(nt + pe::TIME_DATE_STAMP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockProcess;

    #[test]
    fn test_reads_timestamp_from_header() {
        let memory = MockProcess::builder().timestamp(0x3B5B_6E2A).build();

        let timestamp = image_timestamp(&memory, memory.base()).unwrap();

        assert_eq!(timestamp, 0x3B5B_6E2A);
    }

    #[test]
    fn test_missing_header_is_error() {
        let memory = MockProcess::builder().build();

        assert!(matches!(
            image_timestamp(&memory, memory.base()),
            Err(Error::InvalidImage(_))
        ));
    }

    #[test]
    fn test_e_lfanew_outside_image_is_error() {
        let memory = MockProcess::builder()
            .bytes(0, b"MZ")
            .bytes(pe::E_LFANEW, &0x7FFF_FFF0u32.to_le_bytes())
            .build();

        assert!(image_timestamp(&memory, memory.base()).is_err());
    }
}
