//! Kernel32.dll bindings for process and memory operations

use crate::core::types::{Address, BridgeError, BridgeResult};
use crate::windows::utils::{last_error_as_bridge_error, ErrorCode};
use std::mem;
use winapi::shared::minwindef::{DWORD, FALSE, LPCVOID, LPVOID};
use winapi::um::handleapi::CloseHandle;
use winapi::um::memoryapi::{ReadProcessMemory, VirtualQueryEx, WriteProcessMemory};
use winapi::um::minwinbase::STILL_ACTIVE;
use winapi::um::processthreadsapi::{GetExitCodeProcess, OpenProcess};
use winapi::um::winnt::{HANDLE, MEMORY_BASIC_INFORMATION};

/// Safe wrapper for OpenProcess
///
/// Access denial is reported separately from a vanished process so the
/// caller can tell the operator to elevate.
pub fn open_process(pid: u32, desired_access: u32) -> BridgeResult<HANDLE> {
    unsafe {
        let handle = OpenProcess(desired_access, FALSE, pid);
        if !handle.is_null() {
            return Ok(handle);
        }

        match ErrorCode::last_error() {
            ErrorCode::AccessDenied => Err(BridgeError::access_denied(
                pid,
                "OpenProcess refused the requested access",
            )),
            code => Err(BridgeError::ProcessNotFound(format!(
                "PID {}: {}",
                pid, code
            ))),
        }
    }
}

/// Safe wrapper for CloseHandle
///
/// # Safety
/// The handle must be a valid Windows handle that is not closed elsewhere
pub unsafe fn close_handle(handle: HANDLE) -> BridgeResult<()> {
    if handle.is_null() {
        return Ok(());
    }

    if CloseHandle(handle) == FALSE {
        Err(last_error_as_bridge_error("CloseHandle"))
    } else {
        Ok(())
    }
}

/// Safe wrapper for ReadProcessMemory
///
/// # Safety
/// The handle must be a valid process handle with PROCESS_VM_READ access
pub unsafe fn read_process_memory(
    handle: HANDLE,
    address: Address,
    buffer: &mut [u8],
) -> BridgeResult<usize> {
    let mut bytes_read = 0;

    let result = ReadProcessMemory(
        handle,
        address.as_usize() as LPCVOID,
        buffer.as_mut_ptr() as LPVOID,
        buffer.len(),
        &mut bytes_read,
    );

    if result == FALSE {
        Err(BridgeError::read_failed(
            address,
            format!("ReadProcessMemory failed: {}", ErrorCode::last_error()),
        ))
    } else {
        Ok(bytes_read)
    }
}

/// Safe wrapper for WriteProcessMemory
///
/// # Safety
/// The handle must be a valid process handle with PROCESS_VM_WRITE access
pub unsafe fn write_process_memory(
    handle: HANDLE,
    address: Address,
    data: &[u8],
) -> BridgeResult<usize> {
    let mut bytes_written = 0;

    let result = WriteProcessMemory(
        handle,
        address.as_usize() as LPVOID,
        data.as_ptr() as LPCVOID,
        data.len(),
        &mut bytes_written,
    );

    if result == FALSE {
        Err(BridgeError::write_failed(
            address,
            format!("WriteProcessMemory failed: {}", ErrorCode::last_error()),
        ))
    } else {
        Ok(bytes_written)
    }
}

/// Safe wrapper for VirtualQueryEx
///
/// # Safety
/// The handle must be a valid process handle with PROCESS_QUERY_INFORMATION access
pub unsafe fn virtual_query_ex(
    handle: HANDLE,
    address: Address,
) -> BridgeResult<MEMORY_BASIC_INFORMATION> {
    let mut mbi: MEMORY_BASIC_INFORMATION = mem::zeroed();

    let result = VirtualQueryEx(
        handle,
        address.as_usize() as LPCVOID,
        &mut mbi,
        mem::size_of::<MEMORY_BASIC_INFORMATION>(),
    );

    if result == 0 {
        Err(BridgeError::RegionQueryFailed(address.to_string()))
    } else {
        Ok(mbi)
    }
}

/// Non-blocking liveness check via GetExitCodeProcess
///
/// # Safety
/// The handle must be a valid process handle with query access
pub unsafe fn is_process_active(handle: HANDLE) -> bool {
    let mut exit_code: DWORD = 0;
    GetExitCodeProcess(handle, &mut exit_code) != FALSE && exit_code == STILL_ACTIVE
}
