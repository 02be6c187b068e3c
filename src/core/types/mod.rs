//! Core type definitions for the memory bridge
//!
//! Address wrappers, process information and the error type shared by
//! every layer.

mod address;
mod error;
mod process_info;

pub use address::Address;
pub use error::{BridgeError, BridgeResult};
pub use process_info::{ModuleInfo, ProcessInfo};

// Common type aliases
pub type ProcessId = u32;
pub type Offset = usize;
