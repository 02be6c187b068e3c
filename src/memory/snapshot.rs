//! In-memory process backend
//!
//! [`SnapshotMemory`] models a fixed memory snapshot: a set of regions with
//! state and protection, a pid, a module base and a liveness flag. It obeys
//! the same transfer rules as the OS backend (reads and writes stop at the
//! end of a region, inaccessible regions fail) and is used to exercise the
//! scanner, resolver and command server without a live target.

use crate::core::types::{Address, BridgeError, BridgeResult, ProcessId};
use crate::memory::{AttachedProcess, MemoryRegion, ProcessMemory, ProtectionFlags, RegionState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

#[derive(Debug, Clone)]
struct SnapshotRegion {
    base: usize,
    data: Vec<u8>,
    state: RegionState,
    protection: ProtectionFlags,
}

impl SnapshotRegion {
    fn end(&self) -> usize {
        self.base.saturating_add(self.data.len())
    }

    fn contains(&self, address: usize) -> bool {
        address >= self.base && address < self.end()
    }

    fn describe(&self) -> MemoryRegion {
        MemoryRegion::new(
            Address::new(self.base),
            self.data.len(),
            self.state,
            self.protection,
        )
    }
}

/// Builder for [`SnapshotMemory`]
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    regions: Vec<SnapshotRegion>,
    pid: ProcessId,
    module_base: Option<usize>,
}

impl SnapshotBuilder {
    /// Add a committed region
    pub fn region(self, base: usize, data: Vec<u8>, protection: ProtectionFlags) -> Self {
        self.region_with_state(base, data, RegionState::Committed, protection)
    }

    /// Add a region with an explicit state
    pub fn region_with_state(
        mut self,
        base: usize,
        data: Vec<u8>,
        state: RegionState,
        protection: ProtectionFlags,
    ) -> Self {
        self.regions.push(SnapshotRegion {
            base,
            data,
            state,
            protection,
        });
        self
    }

    /// Add a zero-filled read/write region
    pub fn zeroed(self, base: usize, size: usize) -> Self {
        self.region(base, vec![0; size], ProtectionFlags::read_write())
    }

    pub fn pid(mut self, pid: ProcessId) -> Self {
        self.pid = pid;
        self
    }

    pub fn module_base(mut self, base: usize) -> Self {
        self.module_base = Some(base);
        self
    }

    pub fn build(mut self) -> SnapshotMemory {
        self.regions.sort_by_key(|r| r.base);
        // The lowest region stands in for the main module unless told otherwise
        let module_base = self
            .module_base
            .or_else(|| self.regions.first().map(|r| r.base))
            .unwrap_or(0);

        SnapshotMemory {
            regions: RwLock::new(self.regions),
            pid: self.pid,
            module_base: Address::new(module_base),
            alive: AtomicBool::new(true),
        }
    }
}

/// Process memory backed by an in-memory snapshot
#[derive(Debug)]
pub struct SnapshotMemory {
    regions: RwLock<Vec<SnapshotRegion>>,
    pid: ProcessId,
    module_base: Address,
    alive: AtomicBool,
}

impl SnapshotMemory {
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    /// Mark the simulated process as exited (or running again)
    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::SeqCst);
    }
}

impl ProcessMemory for SnapshotMemory {
    fn read_raw(&self, address: Address, buffer: &mut [u8]) -> BridgeResult<usize> {
        let regions = self.regions.read().unwrap_or_else(|e| e.into_inner());
        let addr = address.as_usize();

        let region = regions
            .iter()
            .find(|r| r.contains(addr))
            .ok_or_else(|| BridgeError::read_failed(address, "Address is not mapped"))?;

        if region.state != RegionState::Committed || !region.protection.is_readable() {
            return Err(BridgeError::read_failed(
                address,
                format!("Region is not readable ({})", region.protection),
            ));
        }

        let offset = addr - region.base;
        let count = buffer.len().min(region.data.len() - offset);
        buffer[..count].copy_from_slice(&region.data[offset..offset + count]);
        Ok(count)
    }

    fn write_raw(&self, address: Address, data: &[u8]) -> BridgeResult<usize> {
        let mut regions = self.regions.write().unwrap_or_else(|e| e.into_inner());
        let addr = address.as_usize();

        let region = regions
            .iter_mut()
            .find(|r| r.contains(addr))
            .ok_or_else(|| BridgeError::write_failed(address, "Address is not mapped"))?;

        if region.state != RegionState::Committed || !region.protection.is_writable() {
            return Err(BridgeError::write_failed(
                address,
                format!("Region is not writable ({})", region.protection),
            ));
        }

        let offset = addr - region.base;
        let count = data.len().min(region.data.len() - offset);
        region.data[offset..offset + count].copy_from_slice(&data[..count]);
        Ok(count)
    }

    fn query_region(&self, address: Address) -> BridgeResult<MemoryRegion> {
        let regions = self.regions.read().unwrap_or_else(|e| e.into_inner());
        let addr = address.as_usize();

        if let Some(region) = regions.iter().find(|r| r.contains(addr)) {
            return Ok(region.describe());
        }

        // Gaps are reported as free regions running up to the next mapping
        let gap_end = regions
            .iter()
            .map(|r| r.base)
            .find(|&base| base > addr)
            .unwrap_or(usize::MAX);

        Ok(MemoryRegion::new(
            address,
            gap_end - addr,
            RegionState::Free,
            ProtectionFlags::no_access(),
        ))
    }
}

impl AttachedProcess for SnapshotMemory {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    fn module_base(&self) -> Address {
        self.module_base
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}
