//! Attachment session and the shared bridge state
//!
//! A [`Session`] exists from attach to detach and owns everything that is
//! only meaningful while the target is open: the process, the committed
//! inventory pointer and the grant lock. [`BridgeContext`] is the handle the
//! command channels share; it may hold no session at all.

use crate::core::types::{Address, BridgeError, BridgeResult, ProcessId};
use crate::inventory::{
    grant_item, GrantOutcome, GrantRequest, InventoryLayout, InventoryPointer, PointerResolver,
    SignatureSearch,
};
use crate::memory::AttachedProcess;
use serde::{Serialize, Serializer};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{info, warn};

/// State tied to one attachment
#[derive(Debug)]
pub struct Session<P: AttachedProcess> {
    target: P,
    resolver: RwLock<PointerResolver>,
    grant_lock: Mutex<()>,
}

impl<P: AttachedProcess> Session<P> {
    pub fn new(target: P, layout: InventoryLayout) -> Self {
        Session {
            target,
            resolver: RwLock::new(PointerResolver::new(layout)),
            grant_lock: Mutex::new(()),
        }
    }

    pub fn target(&self) -> &P {
        &self.target
    }

    pub fn pid(&self) -> ProcessId {
        self.target.pid()
    }

    pub fn is_alive(&self) -> bool {
        self.target.is_alive()
    }

    /// The committed inventory pointer
    pub fn pointer(&self) -> Option<InventoryPointer> {
        self.resolver
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .current()
    }

    /// Validate and commit a base address
    pub fn set_pointer(&self, candidate: Address) -> BridgeResult<InventoryPointer> {
        self.resolver
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .set_direct(&self.target, candidate)
    }

    /// Validate and commit the base derived from an identifier field address
    pub fn set_pointer_from_field(&self, field_address: Address) -> BridgeResult<InventoryPointer> {
        self.resolver
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .set_from_field_address(&self.target, field_address)
    }

    pub fn resolve_by_signature(
        &self,
        search: Option<&SignatureSearch>,
    ) -> BridgeResult<InventoryPointer> {
        self.resolver
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .resolve_by_signature(&self.target, search)
    }

    /// Apply a grant; grants on one session never interleave
    pub fn grant(&self, request: GrantRequest) -> BridgeResult<GrantOutcome> {
        let _guard = self.grant_lock.lock().unwrap_or_else(|e| e.into_inner());
        let pointer = self.pointer().ok_or(BridgeError::PointerNotSet)?;
        grant_item(&self.target, &pointer, request)
    }
}

/// Snapshot reported by the status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BridgeStatus {
    pub running: bool,
    pub pid: ProcessId,
    #[serde(rename = "inventoryPtr", serialize_with = "serialize_pointer")]
    pub inventory_ptr: Option<Address>,
}

fn serialize_pointer<S: Serializer>(
    ptr: &Option<Address>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ptr {
        Some(address) => serializer.serialize_str(&format!("{:#x}", address)),
        None => serializer.serialize_none(),
    }
}

/// Shared bridge state: at most one live session
#[derive(Debug)]
pub struct BridgeContext<P: AttachedProcess> {
    session: RwLock<Option<Arc<Session<P>>>>,
    layout: InventoryLayout,
}

impl<P: AttachedProcess> BridgeContext<P> {
    pub fn new(layout: InventoryLayout) -> Self {
        BridgeContext {
            session: RwLock::new(None),
            layout,
        }
    }

    /// Start a session for a freshly attached target, replacing any old one
    pub fn attach(&self, target: P) -> Arc<Session<P>> {
        let session = Arc::new(Session::new(target, self.layout));
        let previous = self
            .session
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .replace(Arc::clone(&session));
        if let Some(old) = previous {
            warn!("Replacing session for PID {}", old.pid());
        }
        info!("Session started for PID {}", session.pid());
        session
    }

    /// End the current session
    ///
    /// The process handle closes when the last in-flight request holding
    /// the session finishes.
    pub fn detach(&self) -> Option<Arc<Session<P>>> {
        let session = self
            .session
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(session) = &session {
            info!("Session ended for PID {}", session.pid());
        }
        session
    }

    pub fn session(&self) -> Option<Arc<Session<P>>> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Current status; never touches target memory
    pub fn status(&self) -> BridgeStatus {
        match self.session() {
            Some(session) => BridgeStatus {
                running: session.is_alive(),
                pid: session.pid(),
                inventory_ptr: session.pointer().map(|p| p.base()),
            },
            None => BridgeStatus {
                running: false,
                pid: 0,
                inventory_ptr: None,
            },
        }
    }

    /// Grant through the current session
    pub fn grant_item(&self, request: GrantRequest) -> BridgeResult<GrantOutcome> {
        let session = self.session().ok_or(BridgeError::NotAttached)?;
        let result = session.grant(request);
        match &result {
            Ok(outcome) => info!(
                "Granted item {} x{} (quantity now {})",
                request.id, request.qty, outcome.new_quantity
            ),
            Err(e) => warn!("Grant of item {} x{} failed: {}", request.id, request.qty, e),
        }
        result
    }
}
