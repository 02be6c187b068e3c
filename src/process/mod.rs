//! Target process discovery and attachment
//!
//! The attach policy in [`locator`] is platform independent. The Windows
//! backend enumerates processes and modules with ToolHelp32 and wraps the
//! opened handle as a [`ProcessMemory`](crate::memory::ProcessMemory).

pub mod locator;

#[cfg(windows)]
pub mod enumerator;
#[cfg(windows)]
pub mod handle;
#[cfg(windows)]
pub mod modules;
#[cfg(windows)]
pub mod target;

pub use locator::{attach, ProcessSource, TARGET_MODULE_NAME, TARGET_PROCESS_PATTERN};

#[cfg(windows)]
pub use handle::ProcessHandle;
#[cfg(windows)]
pub use target::{SystemProcesses, TargetProcess};
