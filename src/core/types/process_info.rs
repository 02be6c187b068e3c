//! Process and module information types

use super::{Address, ProcessId};
use serde::{Deserialize, Serialize};

/// A process entry as seen by enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: ProcessId,
    pub name: String,
    pub parent_pid: Option<ProcessId>,
}

impl ProcessInfo {
    /// Creates a new ProcessInfo with minimal information
    pub fn new(pid: ProcessId, name: impl Into<String>) -> Self {
        ProcessInfo {
            pid,
            name: name.into(),
            parent_pid: None,
        }
    }

    /// Checks whether the executable name contains `pattern` (ASCII case-insensitive)
    pub fn name_contains(&self, pattern: &str) -> bool {
        if pattern.is_empty() {
            return false;
        }
        self.name
            .to_ascii_lowercase()
            .contains(&pattern.to_ascii_lowercase())
    }
}

/// A module loaded in a process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub name: String,
    pub base_address: Address,
    pub size: usize,
}

impl ModuleInfo {
    /// Creates a new ModuleInfo
    pub fn new(name: impl Into<String>, base_address: Address, size: usize) -> Self {
        ModuleInfo {
            name: name.into(),
            base_address,
            size,
        }
    }

    /// Case-insensitive module name comparison
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}
