//! Module lookup using the ToolHelp32 API

use crate::core::types::{Address, BridgeError, BridgeResult, ModuleInfo, ProcessId};
use crate::windows::types::OwnedHandle;
use crate::windows::utils::wide_to_string;
use std::mem;
use winapi::shared::minwindef::FALSE;
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, Module32FirstW, Module32NextW, MODULEENTRY32W, TH32CS_SNAPMODULE,
    TH32CS_SNAPMODULE32,
};

/// Enumerate the modules loaded in a process
pub fn enumerate_modules(pid: ProcessId) -> BridgeResult<Vec<ModuleInfo>> {
    let raw = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid) };
    let snapshot = OwnedHandle::from_raw(raw).ok_or_else(BridgeError::last_os_error)?;

    let mut modules = Vec::new();
    unsafe {
        let mut entry: MODULEENTRY32W = mem::zeroed();
        entry.dwSize = mem::size_of::<MODULEENTRY32W>() as u32;

        let mut success = Module32FirstW(snapshot.raw(), &mut entry);
        while success != FALSE {
            modules.push(ModuleInfo::new(
                wide_to_string(&entry.szModule),
                Address::new(entry.modBaseAddr as usize),
                entry.modBaseSize as usize,
            ));
            success = Module32NextW(snapshot.raw(), &mut entry);
        }
    }

    Ok(modules)
}

/// Find a module by name (ASCII case-insensitive)
pub fn find_module(pid: ProcessId, name: &str) -> BridgeResult<ModuleInfo> {
    enumerate_modules(pid)?
        .into_iter()
        .find(|m| m.name_matches(name))
        .ok_or_else(|| BridgeError::ModuleNotFound(name.to_string()))
}
