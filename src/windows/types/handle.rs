//! Owned kernel handles

use crate::windows::bindings::kernel32;
use winapi::um::handleapi::INVALID_HANDLE_VALUE;
use winapi::um::winnt::HANDLE;

/// A kernel object handle owned by the bridge, closed when dropped
pub struct OwnedHandle(HANDLE);

impl OwnedHandle {
    /// Take ownership of a handle returned by a successful open call
    ///
    /// Returns `None` for the two failure sentinels Windows uses
    /// (null and `INVALID_HANDLE_VALUE`).
    pub fn from_raw(raw: HANDLE) -> Option<Self> {
        if raw.is_null() || raw == INVALID_HANDLE_VALUE {
            None
        } else {
            Some(OwnedHandle(raw))
        }
    }

    /// Borrow the raw value for an FFI call
    pub fn raw(&self) -> HANDLE {
        self.0
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        // Nothing sensible to do if close fails during drop
        let _ = unsafe { kernel32::close_handle(self.0) };
    }
}

// Process and snapshot handles may be used from any thread of the owning process
unsafe impl Send for OwnedHandle {}
unsafe impl Sync for OwnedHandle {}
