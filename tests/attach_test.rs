//! Integration tests for target discovery and session lifecycle

use memory_bridge::core::types::{BridgeError, BridgeResult, ProcessInfo};
use memory_bridge::inventory::InventoryLayout;
use memory_bridge::process::{attach, ProcessSource, TARGET_PROCESS_PATTERN};
use memory_bridge::{AttachedProcess, BridgeContext, SnapshotMemory};
use std::sync::Mutex;

/// Process table that can change between polls
struct ChangingSource {
    processes: Mutex<Vec<ProcessInfo>>,
}

impl ChangingSource {
    fn launch(&self, pid: u32, name: &str) {
        self.processes.lock().unwrap().push(ProcessInfo::new(pid, name));
    }
}

impl ProcessSource for ChangingSource {
    type Target = SnapshotMemory;

    fn processes(&self) -> BridgeResult<Vec<ProcessInfo>> {
        Ok(self.processes.lock().unwrap().clone())
    }

    fn open(&self, process: &ProcessInfo) -> BridgeResult<SnapshotMemory> {
        Ok(SnapshotMemory::builder()
            .pid(process.pid)
            .zeroed(0x1_4000_0000, 0x1000)
            .build())
    }
}

#[test]
fn test_attach_after_target_appears() {
    let source = ChangingSource {
        processes: Mutex::new(vec![ProcessInfo::new(4, "System")]),
    };

    for _ in 0..3 {
        let err = attach(&source, TARGET_PROCESS_PATTERN).unwrap_err();
        assert!(matches!(err, BridgeError::ProcessNotFound(_)));
    }

    source.launch(5150, "FF7Rebirth_.exe");
    let target = attach(&source, TARGET_PROCESS_PATTERN).unwrap();
    assert_eq!(target.pid(), 5150);
    assert!(!target.module_base().is_null());
}

#[test]
fn test_session_lifecycle_follows_target() {
    let source = ChangingSource {
        processes: Mutex::new(vec![ProcessInfo::new(77, "ff7rebirth_.exe")]),
    };
    let ctx = BridgeContext::new(InventoryLayout::default());
    let status = ctx.status();
    assert!(!status.running);
    assert_eq!(status.inventory_ptr, None);

    let session = ctx.attach(attach(&source, TARGET_PROCESS_PATTERN).unwrap());
    assert!(ctx.status().running);
    assert_eq!(ctx.status().pid, 77);

    session.target().set_alive(false);
    assert!(!ctx.status().running);

    ctx.detach();
    assert_eq!(ctx.status().pid, 0);
}
