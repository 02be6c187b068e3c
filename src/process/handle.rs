//! Opened process handle used for all target I/O

use crate::core::types::{Address, BridgeError, BridgeResult, ProcessId};
use crate::memory::MemoryRegion;
use crate::windows::bindings::kernel32;
use crate::windows::types::OwnedHandle;
use std::fmt;
use winapi::um::winnt::PROCESS_ALL_ACCESS;

/// A process opened with full access
///
/// The handle is closed exactly once, when the wrapper is dropped.
pub struct ProcessHandle {
    handle: OwnedHandle,
    pid: ProcessId,
}

impl ProcessHandle {
    /// Open `pid` with `PROCESS_ALL_ACCESS`
    pub fn open_all_access(pid: ProcessId) -> BridgeResult<Self> {
        let raw = kernel32::open_process(pid, PROCESS_ALL_ACCESS)?;
        let handle = OwnedHandle::from_raw(raw)
            .ok_or_else(|| BridgeError::ProcessNotFound(format!("PID {}", pid)))?;
        Ok(ProcessHandle { handle, pid })
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Read memory from the process, returning the bytes transferred
    pub fn read_memory(&self, address: Address, buffer: &mut [u8]) -> BridgeResult<usize> {
        unsafe { kernel32::read_process_memory(self.handle.raw(), address, buffer) }
    }

    /// Write memory to the process, returning the bytes transferred
    pub fn write_memory(&self, address: Address, data: &[u8]) -> BridgeResult<usize> {
        unsafe { kernel32::write_process_memory(self.handle.raw(), address, data) }
    }

    /// Describe the region containing `address`
    pub fn query_region(&self, address: Address) -> BridgeResult<MemoryRegion> {
        let mbi = unsafe { kernel32::virtual_query_ex(self.handle.raw(), address)? };
        Ok(MemoryRegion::from(mbi))
    }

    /// True while the process has not exited
    pub fn is_alive(&self) -> bool {
        unsafe { kernel32::is_process_active(self.handle.raw()) }
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("alive", &self.is_alive())
            .finish()
    }
}
