//! The live game process as a [`ProcessMemory`] backend

use crate::core::types::{Address, BridgeResult, ProcessId, ProcessInfo};
use crate::memory::{AttachedProcess, MemoryRegion, ProcessMemory};
use crate::process::enumerator::enumerate_processes;
use crate::process::handle::ProcessHandle;
use crate::process::locator::{ProcessSource, TARGET_MODULE_NAME};
use crate::process::modules::find_module;
use tracing::debug;

/// An opened target process with its main module base resolved
#[derive(Debug)]
pub struct TargetProcess {
    handle: ProcessHandle,
    module_base: Address,
}

impl TargetProcess {
    /// Open `pid` with full access and locate `module_name`
    pub fn open(pid: ProcessId, module_name: &str) -> BridgeResult<Self> {
        let handle = ProcessHandle::open_all_access(pid)?;
        let module = find_module(pid, module_name)?;
        debug!(
            "Module {} at {} ({} bytes)",
            module.name, module.base_address, module.size
        );

        Ok(TargetProcess {
            handle,
            module_base: module.base_address,
        })
    }
}

impl ProcessMemory for TargetProcess {
    fn read_raw(&self, address: Address, buffer: &mut [u8]) -> BridgeResult<usize> {
        self.handle.read_memory(address, buffer)
    }

    fn write_raw(&self, address: Address, data: &[u8]) -> BridgeResult<usize> {
        self.handle.write_memory(address, data)
    }

    fn query_region(&self, address: Address) -> BridgeResult<MemoryRegion> {
        self.handle.query_region(address)
    }
}

impl AttachedProcess for TargetProcess {
    fn pid(&self) -> ProcessId {
        self.handle.pid()
    }

    fn module_base(&self) -> Address {
        self.module_base
    }

    fn is_alive(&self) -> bool {
        self.handle.is_alive()
    }
}

/// The running system as a process source
#[derive(Debug, Clone)]
pub struct SystemProcesses {
    module_name: String,
}

impl SystemProcesses {
    pub fn new(module_name: impl Into<String>) -> Self {
        SystemProcesses {
            module_name: module_name.into(),
        }
    }
}

impl Default for SystemProcesses {
    fn default() -> Self {
        Self::new(TARGET_MODULE_NAME)
    }
}

impl ProcessSource for SystemProcesses {
    type Target = TargetProcess;

    fn processes(&self) -> BridgeResult<Vec<ProcessInfo>> {
        enumerate_processes()
    }

    fn open(&self, process: &ProcessInfo) -> BridgeResult<TargetProcess> {
        TargetProcess::open(process.pid, &self.module_name)
    }
}
