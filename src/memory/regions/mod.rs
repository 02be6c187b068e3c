//! Memory region metadata
//!
//! Regions are produced on demand by [`ProcessMemory::query_region`] while
//! scanning and are never cached.
//!
//! [`ProcessMemory::query_region`]: crate::memory::ProcessMemory::query_region

pub mod protection;

pub use protection::ProtectionFlags;

use crate::core::types::Address;

/// State of a memory region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    /// Memory is committed and backed by storage
    Committed,
    /// Memory is reserved but not committed
    Reserved,
    /// Memory is free/unallocated
    Free,
}

impl RegionState {
    pub const MEM_COMMIT: u32 = 0x1000;
    pub const MEM_RESERVE: u32 = 0x2000;
    pub const MEM_FREE: u32 = 0x10000;

    /// Map a raw OS state value
    pub fn from_raw(state: u32) -> Self {
        match state {
            Self::MEM_COMMIT => RegionState::Committed,
            Self::MEM_RESERVE => RegionState::Reserved,
            _ => RegionState::Free,
        }
    }
}

/// A contiguous range of the target address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    pub base_address: Address,
    pub size: usize,
    pub state: RegionState,
    pub protection: ProtectionFlags,
}

impl MemoryRegion {
    pub fn new(
        base_address: Address,
        size: usize,
        state: RegionState,
        protection: ProtectionFlags,
    ) -> Self {
        MemoryRegion {
            base_address,
            size,
            state,
            protection,
        }
    }

    /// One past the last byte of the region, clamped to the address space
    pub fn end_address(&self) -> Address {
        self.base_address.saturating_add(self.size)
    }

    /// Check if an address is within this region
    pub fn contains(&self, address: Address) -> bool {
        address >= self.base_address && address < self.end_address()
    }

    pub fn is_committed(&self) -> bool {
        self.state == RegionState::Committed
    }

    /// Committed, not a guard page and not marked no-access
    pub fn is_scannable(&self) -> bool {
        self.is_committed() && !self.protection.is_guard() && !self.protection.is_no_access()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(state: RegionState, protection: ProtectionFlags) -> MemoryRegion {
        MemoryRegion::new(Address::new(0x10000), 0x1000, state, protection)
    }

    #[test]
    fn test_region_state_from_raw() {
        assert_eq!(RegionState::from_raw(0x1000), RegionState::Committed);
        assert_eq!(RegionState::from_raw(0x2000), RegionState::Reserved);
        assert_eq!(RegionState::from_raw(0x10000), RegionState::Free);
        assert_eq!(RegionState::from_raw(0xDEAD), RegionState::Free);
    }

    #[test]
    fn test_bounds() {
        let r = region(RegionState::Committed, ProtectionFlags::read_write());
        assert_eq!(r.end_address(), Address::new(0x11000));
        assert!(r.contains(Address::new(0x10000)));
        assert!(r.contains(Address::new(0x10FFF)));
        assert!(!r.contains(Address::new(0x11000)));

        let top = MemoryRegion::new(
            Address::new(usize::MAX - 0x10),
            0x100,
            RegionState::Free,
            ProtectionFlags::no_access(),
        );
        assert_eq!(top.end_address(), Address::new(usize::MAX));
    }

    #[test]
    fn test_scannable() {
        assert!(region(RegionState::Committed, ProtectionFlags::read_write()).is_scannable());
        assert!(region(RegionState::Committed, ProtectionFlags::execute_read()).is_scannable());
        assert!(!region(RegionState::Reserved, ProtectionFlags::read_write()).is_scannable());
        assert!(!region(RegionState::Free, ProtectionFlags::read_write()).is_scannable());
        assert!(!region(RegionState::Committed, ProtectionFlags::no_access()).is_scannable());
        assert!(!region(
            RegionState::Committed,
            ProtectionFlags::read_write().with_guard()
        )
        .is_scannable());
    }
}
