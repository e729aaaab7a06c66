//! Memory layout constants for the Halo executable image
//!
//! Offsets are relative to the base address of the primary module. They only
//! hold for the binary build the built-in offset table was taken from.

/// Mouse sensitivity fields (4-byte IEEE-754 floats)
pub mod sensitivity {
    /// Size of one sensitivity field
    pub const FIELD_SIZE: usize = 4;

    /// Horizontal sensitivity. 0.25 corresponds to in-game sensitivity 1.
    pub const X: u64 = 0x2ABB50;
    pub const Y: u64 = X + FIELD_SIZE as u64;
}

/// Mouse acceleration routine
pub mod acceleration {
    /// Bytes blanked per region
    pub const PATCH_LEN: usize = 6;

    pub const ENTRY: u64 = 0x8F830;
    pub const ENTRY_2: u64 = ENTRY + PATCH_LEN as u64;
}

/// x86 single-byte no-op
pub const NOP: u8 = 0x90;

/// PE header locations used to identify the loaded binary
pub mod pe {
    /// "MZ"
    pub const DOS_MAGIC: [u8; 2] = *b"MZ";
    /// `e_lfanew` field of IMAGE_DOS_HEADER
    pub const E_LFANEW: u64 = 0x3C;
    /// "PE\0\0"
    pub const NT_SIGNATURE: [u8; 4] = *b"PE\0\0";
    /// IMAGE_FILE_HEADER.TimeDateStamp relative to the NT signature
    pub const TIME_DATE_STAMP: u64 = 8;
}
