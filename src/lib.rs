//! memory-bridge: grants inventory items in a running game process
//!
//! The bridge attaches to the target, establishes a validated inventory
//! pointer and serves grant commands over a loopback HTTP socket and a
//! polled command file.

pub mod bootstrap;
pub mod config;
pub mod context;
pub mod core;
pub mod inventory;
pub mod memory;
pub mod process;
pub mod server;

#[cfg(windows)]
pub mod windows;

// Re-export main types from core module
pub use crate::core::types::{
    Address, BridgeError, BridgeResult, ModuleInfo, ProcessId, ProcessInfo,
};

pub use context::{BridgeContext, BridgeStatus, Session};
pub use inventory::{GrantOutcome, GrantRequest, InventoryLayout, InventoryPointer};
pub use memory::{AttachedProcess, ProcessMemory, SnapshotMemory};
pub use server::CommandServer;

// Re-export core directly for full access
pub use crate::core::*;
