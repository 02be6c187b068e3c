//! Core module containing fundamental types for the memory bridge
//!
//! This module provides the foundational building blocks used throughout
//! the bridge: address handling, process information and error types.

pub mod types;

pub use types::{Address, BridgeError, BridgeResult, ModuleInfo, ProcessId, ProcessInfo};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

#[cfg(not(target_pointer_width = "64"))]
compile_error!("memory-bridge requires a 64-bit target");
