//! Conversion of MEMORY_BASIC_INFORMATION into region metadata

use crate::core::types::Address;
use crate::memory::{MemoryRegion, ProtectionFlags, RegionState};
use winapi::um::winnt::MEMORY_BASIC_INFORMATION;

impl From<MEMORY_BASIC_INFORMATION> for MemoryRegion {
    fn from(mbi: MEMORY_BASIC_INFORMATION) -> Self {
        MemoryRegion::new(
            Address::new(mbi.BaseAddress as usize),
            mbi.RegionSize,
            RegionState::from_raw(mbi.State),
            ProtectionFlags::new(mbi.Protect),
        )
    }
}
