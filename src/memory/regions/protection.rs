//! Page protection flags

use std::fmt;

/// Page protection flags as reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProtectionFlags {
    value: u32,
}

impl ProtectionFlags {
    pub const PAGE_NOACCESS: u32 = 0x01;
    pub const PAGE_READONLY: u32 = 0x02;
    pub const PAGE_READWRITE: u32 = 0x04;
    pub const PAGE_WRITECOPY: u32 = 0x08;
    pub const PAGE_EXECUTE: u32 = 0x10;
    pub const PAGE_EXECUTE_READ: u32 = 0x20;
    pub const PAGE_EXECUTE_READWRITE: u32 = 0x40;
    pub const PAGE_EXECUTE_WRITECOPY: u32 = 0x80;
    pub const PAGE_GUARD: u32 = 0x100;
    pub const PAGE_NOCACHE: u32 = 0x200;

    /// Create from a raw protection value
    pub const fn new(value: u32) -> Self {
        ProtectionFlags { value }
    }

    pub const fn no_access() -> Self {
        Self::new(Self::PAGE_NOACCESS)
    }

    pub const fn read_only() -> Self {
        Self::new(Self::PAGE_READONLY)
    }

    pub const fn read_write() -> Self {
        Self::new(Self::PAGE_READWRITE)
    }

    pub const fn execute_read() -> Self {
        Self::new(Self::PAGE_EXECUTE_READ)
    }

    /// Check if the no-access bit is set
    pub fn is_no_access(&self) -> bool {
        (self.value & Self::PAGE_NOACCESS) != 0
    }

    /// Check if guard page flag is set
    pub fn is_guard(&self) -> bool {
        (self.value & Self::PAGE_GUARD) != 0
    }

    /// Check if protection allows reading
    pub fn is_readable(&self) -> bool {
        !self.is_no_access() && !self.is_guard() && self.value != Self::PAGE_EXECUTE
    }

    /// Check if protection allows writing
    pub fn is_writable(&self) -> bool {
        !self.is_guard()
            && (self.value
                & (Self::PAGE_READWRITE
                    | Self::PAGE_WRITECOPY
                    | Self::PAGE_EXECUTE_READWRITE
                    | Self::PAGE_EXECUTE_WRITECOPY))
                != 0
    }

    /// Add guard page flag
    pub fn with_guard(mut self) -> Self {
        self.value |= Self::PAGE_GUARD;
        self
    }

    /// Get the raw protection value
    pub fn raw(&self) -> u32 {
        self.value
    }
}

impl fmt::Display for ProtectionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.value & 0xFF {
            Self::PAGE_NOACCESS => "NOACCESS",
            Self::PAGE_READONLY => "R",
            Self::PAGE_READWRITE => "RW",
            Self::PAGE_WRITECOPY => "WC",
            Self::PAGE_EXECUTE => "X",
            Self::PAGE_EXECUTE_READ => "RX",
            Self::PAGE_EXECUTE_READWRITE => "RWX",
            Self::PAGE_EXECUTE_WRITECOPY => "WCX",
            0 => "NONE",
            _ => "UNKNOWN",
        };

        write!(f, "{}", base)?;
        if self.is_guard() {
            write!(f, "+G")?;
        }
        if (self.value & Self::PAGE_NOCACHE) != 0 {
            write!(f, "+NC")?;
        }
        Ok(())
    }
}
