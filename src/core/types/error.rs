//! Error types for the memory bridge

use std::fmt;
use thiserror::Error;

/// Main error type for process, memory and pointer operations
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid memory address: {0}")]
    InvalidAddress(String),

    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Access denied to process {pid}: {reason}")]
    AccessDenied { pid: u32, reason: String },

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Failed to read memory at {address}: {reason}")]
    ReadFailed { address: String, reason: String },

    #[error("Failed to write memory at {address}: {reason}")]
    WriteFailed { address: String, reason: String },

    #[error("Failed to query memory region at {0}")]
    RegionQueryFailed(String),

    #[error("Pattern not found in memory")]
    PatternNotFound,

    #[error("Invalid pattern format: {0}")]
    InvalidPattern(String),

    #[error("Inventory pointer not found: {0}")]
    PointerNotFound(String),

    #[error("Inventory pointer rejected: {0}")]
    InvalidPointer(String),

    #[error("Field address {address} is below field offset 0x{offset:X}")]
    PointerUnderflow { address: String, offset: usize },

    #[error("Inventory pointer not initialized")]
    PointerNotSet,

    #[error("Not attached to target process")]
    NotAttached,

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsApiError(#[from] windows::core::Error),

    #[error("Windows API: {0}")]
    WindowsApi(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    /// Creates a new Windows API error from the last error code
    #[cfg(windows)]
    pub fn last_os_error() -> Self {
        BridgeError::WindowsApiError(windows::core::Error::from_win32())
    }

    /// Creates an access denied error for a process
    pub fn access_denied(pid: u32, reason: impl Into<String>) -> Self {
        BridgeError::AccessDenied {
            pid,
            reason: reason.into(),
        }
    }

    /// Creates a read failed error
    pub fn read_failed(address: impl fmt::Display, reason: impl Into<String>) -> Self {
        BridgeError::ReadFailed {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a write failed error
    pub fn write_failed(address: impl fmt::Display, reason: impl Into<String>) -> Self {
        BridgeError::WriteFailed {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Attachment failures are retried by the caller on an interval
    pub fn is_attachment_error(&self) -> bool {
        matches!(
            self,
            BridgeError::ProcessNotFound(_)
                | BridgeError::AccessDenied { .. }
                | BridgeError::ModuleNotFound(_)
        )
    }

    /// Memory I/O failures, including partial transfers
    pub fn is_memory_error(&self) -> bool {
        matches!(
            self,
            BridgeError::ReadFailed { .. }
                | BridgeError::WriteFailed { .. }
                | BridgeError::RegionQueryFailed(_)
        )
    }
}
