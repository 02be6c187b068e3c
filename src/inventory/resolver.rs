//! Inventory pointer resolution and validation

use crate::config::ScannerConfig;
use crate::core::types::{Address, BridgeError, BridgeResult, Offset};
use crate::inventory::{InventoryLayout, InventoryPointer};
use crate::memory::{AttachedProcess, ByteSignature, PatternScanner, ProcessMemory};
use tracing::{debug, info, warn};

/// Signature scan parameters for locating the inventory at runtime
#[derive(Debug, Clone)]
pub struct SignatureSearch {
    pub signature: ByteSignature,
    /// Bytes scanned from the main module base
    pub window: usize,
    pub chunk_size: usize,
}

impl SignatureSearch {
    /// Build from the scanner section; `None` when no signature is configured
    pub fn from_config(config: &ScannerConfig) -> BridgeResult<Option<Self>> {
        config
            .signature
            .as_deref()
            .map(|pattern| {
                Ok(SignatureSearch {
                    signature: ByteSignature::from_pattern(pattern)?,
                    window: config.search_window,
                    chunk_size: config.chunk_size,
                })
            })
            .transpose()
    }
}

/// Holds the current pointer and commits only validated candidates
///
/// A failed candidate never replaces a previously committed pointer.
#[derive(Debug, Clone)]
pub struct PointerResolver {
    layout: InventoryLayout,
    current: Option<InventoryPointer>,
}

impl PointerResolver {
    pub fn new(layout: InventoryLayout) -> Self {
        PointerResolver {
            layout,
            current: None,
        }
    }

    pub fn layout(&self) -> InventoryLayout {
        self.layout
    }

    /// The committed pointer, if any
    pub fn current(&self) -> Option<InventoryPointer> {
        self.current
    }

    /// Check a candidate base by reading its identifier field
    ///
    /// Zero is rejected without touching memory. Any successful read passes;
    /// the value itself is not interpreted.
    pub fn validate<M: ProcessMemory + ?Sized>(
        &self,
        memory: &M,
        candidate: Address,
    ) -> BridgeResult<InventoryPointer> {
        if candidate.is_null() {
            return Err(BridgeError::InvalidPointer(
                "Null inventory pointer".to_string(),
            ));
        }

        let pointer = InventoryPointer::new(candidate, self.layout);
        let id_field = pointer.id_field()?;
        match memory.read_i32(id_field) {
            Ok(id) => {
                debug!("Pointer {} validated (id field = {})", candidate, id);
                Ok(pointer)
            }
            Err(e) => Err(BridgeError::InvalidPointer(format!(
                "Cannot read identifier at {}: {}",
                id_field, e
            ))),
        }
    }

    /// Validate and commit a base address
    pub fn set_direct<M: ProcessMemory + ?Sized>(
        &mut self,
        memory: &M,
        candidate: Address,
    ) -> BridgeResult<InventoryPointer> {
        let pointer = self.validate(memory, candidate)?;
        self.current = Some(pointer);
        info!("Inventory pointer set to {}", pointer);
        Ok(pointer)
    }

    /// Derive the base from the address of the identifier field, then commit
    pub fn set_from_field_address<M: ProcessMemory + ?Sized>(
        &mut self,
        memory: &M,
        field_address: Address,
    ) -> BridgeResult<InventoryPointer> {
        let base = base_from_field(field_address, self.layout.id_offset)?;
        self.set_direct(memory, base)
    }

    /// Look for the inventory by signature
    ///
    /// The match is a code reference whose dereference rules are not known,
    /// so its location is only logged and the result is always
    /// `PointerNotFound`. Nothing is committed.
    pub fn resolve_by_signature<P: AttachedProcess + ?Sized>(
        &self,
        target: &P,
        search: Option<&SignatureSearch>,
    ) -> BridgeResult<InventoryPointer> {
        let search = match search {
            Some(search) => search,
            None => {
                return Err(BridgeError::PointerNotFound(
                    "No signature configured".to_string(),
                ))
            }
        };

        let start = target.module_base();
        let found = PatternScanner::new(target)
            .with_chunk_size(search.chunk_size)
            .find_pattern(&search.signature, start, search.window);

        match found {
            Ok(location) => {
                info!(
                    "Signature {} matched at {} (module base + 0x{:X})",
                    search.signature,
                    location,
                    location.as_usize().wrapping_sub(start.as_usize())
                );
                Err(BridgeError::PointerNotFound(format!(
                    "Signature reference at {} cannot be dereferenced",
                    location
                )))
            }
            Err(e) => {
                warn!("Signature scan failed: {}", e);
                Err(BridgeError::PointerNotFound(e.to_string()))
            }
        }
    }
}

/// Base address for an identifier field address
pub fn base_from_field(field_address: Address, id_offset: Offset) -> BridgeResult<Address> {
    field_address
        .checked_sub(id_offset)
        .ok_or_else(|| BridgeError::PointerUnderflow {
            address: field_address.to_string(),
            offset: id_offset,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryRegion, ProtectionFlags, SnapshotMemory};
    use std::cell::Cell;

    const BASE: usize = 0x7FF6_0000_0000;

    fn memory() -> SnapshotMemory {
        SnapshotMemory::builder().pid(1).zeroed(BASE, 0x100).build()
    }

    /// Backend that records whether anything touched memory
    struct Untouchable {
        touched: Cell<bool>,
    }

    impl ProcessMemory for Untouchable {
        fn read_raw(&self, address: Address, _buffer: &mut [u8]) -> BridgeResult<usize> {
            self.touched.set(true);
            Err(BridgeError::read_failed(address, "unexpected"))
        }

        fn write_raw(&self, address: Address, _data: &[u8]) -> BridgeResult<usize> {
            self.touched.set(true);
            Err(BridgeError::write_failed(address, "unexpected"))
        }

        fn query_region(&self, address: Address) -> BridgeResult<MemoryRegion> {
            self.touched.set(true);
            Err(BridgeError::RegionQueryFailed(address.to_string()))
        }
    }

    #[test]
    fn test_validate_null_without_access() {
        let memory = Untouchable {
            touched: Cell::new(false),
        };
        let resolver = PointerResolver::new(InventoryLayout::default());
        assert!(resolver.validate(&memory, Address::null()).is_err());
        assert!(!memory.touched.get());
    }

    #[test]
    fn test_validate_readable() {
        let resolver = PointerResolver::new(InventoryLayout::default());
        let ptr = resolver.validate(&memory(), Address::new(BASE + 0x10)).unwrap();
        assert_eq!(ptr.base(), Address::new(BASE + 0x10));
    }

    #[test]
    fn test_validate_unreadable() {
        let resolver = PointerResolver::new(InventoryLayout::default());
        let err = resolver.validate(&memory(), Address::new(0x1000)).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidPointer(_)));
    }

    #[test]
    fn test_failure_keeps_previous_pointer() {
        let memory = memory();
        let mut resolver = PointerResolver::new(InventoryLayout::default());
        resolver.set_direct(&memory, Address::new(BASE)).unwrap();

        assert!(resolver.set_direct(&memory, Address::null()).is_err());
        assert!(resolver.set_direct(&memory, Address::new(0x42)).is_err());
        assert_eq!(resolver.current().unwrap().base(), Address::new(BASE));
    }

    #[test]
    fn test_set_from_field_address() {
        let memory = memory();
        let mut resolver = PointerResolver::new(InventoryLayout::default());
        let ptr = resolver
            .set_from_field_address(&memory, Address::new(BASE + 0x48))
            .unwrap();
        assert_eq!(ptr.base(), Address::new(BASE + 0x40));
        assert_eq!(resolver.current(), Some(ptr));
    }

    #[test]
    fn test_set_from_field_address_underflow() {
        let memory = memory();
        let mut resolver = PointerResolver::new(InventoryLayout::default());
        let err = resolver
            .set_from_field_address(&memory, Address::new(0x4))
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::PointerUnderflow { offset: 0x8, .. }
        ));
        assert!(resolver.current().is_none());
    }

    #[test]
    fn test_resolve_by_signature_never_commits() {
        let mut data = vec![0u8; 0x200];
        data[0x80..0x84].copy_from_slice(&[0x48, 0x8B, 0x05, 0x11]);
        let memory = SnapshotMemory::builder()
            .region(BASE, data, ProtectionFlags::execute_read())
            .build();
        let resolver = PointerResolver::new(InventoryLayout::default());

        let search = SignatureSearch {
            signature: ByteSignature::from_pattern("48 8B 05 ??").unwrap(),
            window: 0x1000,
            chunk_size: 0x40,
        };
        let err = resolver
            .resolve_by_signature(&memory, Some(&search))
            .unwrap_err();
        assert!(matches!(err, BridgeError::PointerNotFound(_)));
        assert!(err.to_string().contains("0x7FF600000080"));

        let err = resolver.resolve_by_signature(&memory, None).unwrap_err();
        assert!(matches!(err, BridgeError::PointerNotFound(_)));
        assert!(resolver.current().is_none());
    }

    #[test]
    fn test_signature_search_from_config() {
        let mut config = crate::config::Config::default().scanner;
        assert!(SignatureSearch::from_config(&config).unwrap().is_none());

        config.signature = Some("48 8B ?? ??".to_string());
        let search = SignatureSearch::from_config(&config).unwrap().unwrap();
        assert_eq!(search.signature.len(), 4);
        assert_eq!(search.window, 0x1000_0000);

        config.signature = Some("4G".to_string());
        assert!(SignatureSearch::from_config(&config).is_err());
    }
}
