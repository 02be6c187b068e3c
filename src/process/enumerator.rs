//! Process enumeration using the ToolHelp32 API

use crate::core::types::{BridgeResult, ProcessInfo};
use crate::windows::types::OwnedHandle;
use crate::windows::utils::{last_error_as_bridge_error, wide_to_string};
use std::mem;
use winapi::shared::minwindef::FALSE;
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
    TH32CS_SNAPPROCESS,
};

/// Iterator over a point-in-time process snapshot
pub struct ProcessEnumerator {
    snapshot: OwnedHandle,
    first_called: bool,
}

impl ProcessEnumerator {
    pub fn new() -> BridgeResult<Self> {
        let raw = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) };
        let snapshot = OwnedHandle::from_raw(raw)
            .ok_or_else(|| last_error_as_bridge_error("CreateToolhelp32Snapshot"))?;

        Ok(ProcessEnumerator {
            snapshot,
            first_called: false,
        })
    }
}

impl Iterator for ProcessEnumerator {
    type Item = ProcessInfo;

    fn next(&mut self) -> Option<Self::Item> {
        unsafe {
            let mut entry: PROCESSENTRY32W = mem::zeroed();
            entry.dwSize = mem::size_of::<PROCESSENTRY32W>() as u32;

            let success = if !self.first_called {
                self.first_called = true;
                Process32FirstW(self.snapshot.raw(), &mut entry)
            } else {
                Process32NextW(self.snapshot.raw(), &mut entry)
            };

            if success == FALSE {
                return None;
            }

            let mut info = ProcessInfo::new(entry.th32ProcessID, wide_to_string(&entry.szExeFile));
            info.parent_pid = Some(entry.th32ParentProcessID);
            Some(info)
        }
    }
}

/// Enumerate all running processes
pub fn enumerate_processes() -> BridgeResult<Vec<ProcessInfo>> {
    Ok(ProcessEnumerator::new()?.collect())
}
