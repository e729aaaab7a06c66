use std::fmt;

/// Page protection flags, numerically identical to the Win32 `PAGE_*` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Protection(pub u32);

impl Protection {
    pub const NOACCESS: Self = Self(0x01);
    pub const READONLY: Self = Self(0x02);
    pub const READWRITE: Self = Self(0x04);
    pub const WRITECOPY: Self = Self(0x08);
    pub const EXECUTE: Self = Self(0x10);
    pub const EXECUTE_READ: Self = Self(0x20);
    pub const EXECUTE_READWRITE: Self = Self(0x40);
    pub const EXECUTE_WRITECOPY: Self = Self(0x80);

    /// Modifier bits (PAGE_GUARD, PAGE_NOCACHE, PAGE_WRITECOMBINE)
    const MODIFIERS: u32 = 0x100 | 0x200 | 0x400;

    fn base(self) -> u32 {
        self.0 & !Self::MODIFIERS
    }

    pub fn is_readable(self) -> bool {
        matches!(
            Self(self.base()),
            Self::READONLY
                | Self::READWRITE
                | Self::WRITECOPY
                | Self::EXECUTE_READ
                | Self::EXECUTE_READWRITE
                | Self::EXECUTE_WRITECOPY
        )
    }

    pub fn is_writable(self) -> bool {
        matches!(
            Self(self.base()),
            Self::READWRITE | Self::WRITECOPY | Self::EXECUTE_READWRITE | Self::EXECUTE_WRITECOPY
        )
    }

    pub fn is_executable(self) -> bool {
        matches!(
            Self(self.base()),
            Self::EXECUTE | Self::EXECUTE_READ | Self::EXECUTE_READWRITE | Self::EXECUTE_WRITECOPY
        )
    }

    /// Guard pages fault on first touch even when otherwise accessible
    pub fn is_guard(self) -> bool {
        self.0 & 0x100 != 0
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match Self(self.base()) {
            Self::NOACCESS => "NOACCESS",
            Self::READONLY => "READONLY",
            Self::READWRITE => "READWRITE",
            Self::WRITECOPY => "WRITECOPY",
            Self::EXECUTE => "EXECUTE",
            Self::EXECUTE_READ => "EXECUTE_READ",
            Self::EXECUTE_READWRITE => "EXECUTE_READWRITE",
            Self::EXECUTE_WRITECOPY => "EXECUTE_WRITECOPY",
            _ => return write!(f, "{:#x}", self.0),
        };
        if self.is_guard() {
            write!(f, "{}+GUARD", name)
        } else {
            f.write_str(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_page_flags() {
        assert!(Protection::EXECUTE_READ.is_executable());
        assert!(Protection::EXECUTE_READ.is_readable());
        assert!(!Protection::EXECUTE_READ.is_writable());
        assert!(Protection::EXECUTE_READWRITE.is_writable());
    }

    #[test]
    fn test_guard_modifier_is_ignored_for_access() {
        let guarded = Protection(Protection::READWRITE.0 | 0x100);
        assert!(guarded.is_guard());
        assert!(guarded.is_writable());
        assert_eq!(guarded.to_string(), "READWRITE+GUARD");
    }

    #[test]
    fn test_noaccess_allows_nothing() {
        let p = Protection::NOACCESS;
        assert!(!p.is_readable());
        assert!(!p.is_writable());
        assert!(!p.is_executable());
    }
}
