use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to resolve module base address: {0}")]
    ModuleBaseUnavailable(String),

    #[error("Invalid address: {0:#x}")]
    InvalidAddress(u64),

    #[error("Offset {offset:#x} from base {base:#x} overflows the address space")]
    AddressOverflow { base: u64, offset: u64 },

    #[error("Failed to access memory at address {address:#x} ({len} bytes): {message}")]
    MemoryAccess {
        address: u64,
        len: usize,
        message: String,
    },

    #[error("Failed to change protection at address {address:#x} ({len} bytes): {message}")]
    ProtectionChangeFailed {
        address: u64,
        len: usize,
        message: String,
    },

    #[error("Failed to restore protection at address {address:#x} ({len} bytes): {message}")]
    ProtectionRestoreFailed {
        address: u64,
        len: usize,
        message: String,
    },

    #[error("Failed to read setting '{name}': {message}")]
    SettingsRead { name: String, message: String },

    #[error("Code at {address:#x} ({region}) does not match: expected {expected}, found {actual}")]
    SignatureMismatch {
        region: String,
        address: u64,
        expected: String,
        actual: String,
    },

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),

    #[error("Not a PE image: {0}")]
    InvalidImage(String),

    #[error("No offset table for image timestamp {0}")]
    UnknownBinary(String),

    #[error("Invalid byte pattern: {0}")]
    InvalidPattern(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Errors raised while touching process memory, as opposed to setup errors
    pub fn is_memory_fault(&self) -> bool {
        matches!(
            self,
            Error::InvalidAddress(_)
                | Error::AddressOverflow { .. }
                | Error::MemoryAccess { .. }
                | Error::ProtectionChangeFailed { .. }
                | Error::ProtectionRestoreFailed { .. }
        )
    }
}
