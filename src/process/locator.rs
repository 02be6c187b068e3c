//! Target discovery and attachment policy

use crate::core::types::{BridgeError, BridgeResult, ProcessInfo};
use crate::memory::AttachedProcess;
use tracing::{debug, info};

/// Executable name fragment identifying the monitored game
pub const TARGET_PROCESS_PATTERN: &str = "ff7rebirth_";

/// Main executable module of the monitored game
pub const TARGET_MODULE_NAME: &str = "ff7rebirth_.exe";

/// Source of process entries and attachments
///
/// The OS implementation enumerates with ToolHelp32 and opens with full
/// access; tests substitute their own.
pub trait ProcessSource {
    type Target: AttachedProcess;

    /// Snapshot of the currently running processes
    fn processes(&self) -> BridgeResult<Vec<ProcessInfo>>;

    /// Open the process and resolve its main module base
    fn open(&self, process: &ProcessInfo) -> BridgeResult<Self::Target>;
}

/// Attach to the first process whose executable name contains `pattern`
///
/// Only the first match is tried. Failures are returned as values and the
/// caller decides when to retry.
pub fn attach<S: ProcessSource>(source: &S, pattern: &str) -> BridgeResult<S::Target> {
    let process = source
        .processes()?
        .into_iter()
        .find(|p| p.name_contains(pattern))
        .ok_or_else(|| BridgeError::ProcessNotFound(pattern.to_string()))?;

    debug!("Found {} (PID: {})", process.name, process.pid);
    let target = source.open(&process)?;

    info!(
        "Attached to {} (PID: {}, base: {})",
        process.name,
        target.pid(),
        target.module_base()
    );
    Ok(target)
}
