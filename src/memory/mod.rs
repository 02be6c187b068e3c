//! Memory access layer for the attached target process
//!
//! Everything that touches target memory goes through [`ProcessMemory`]:
//! - raw read/write transfers implemented per backend
//! - exact-transfer policy (a short transfer is a total failure)
//! - typed helpers for the 4-byte inventory fields
//! - region metadata queries used by the scanner

pub mod regions;
pub mod scanner;
pub mod snapshot;

pub use regions::{MemoryRegion, ProtectionFlags, RegionState};
pub use scanner::{ByteSignature, PatternScanner, DEFAULT_CHUNK_SIZE};
pub use snapshot::SnapshotMemory;

use crate::core::types::{Address, BridgeError, BridgeResult, ProcessId};

/// Read/write access to a process address space
///
/// Backends implement the raw transfer primitives and report how many bytes
/// the OS actually moved. The provided methods turn any short transfer into
/// a failure and never retry.
pub trait ProcessMemory {
    /// Read up to `buffer.len()` bytes, returning the number transferred
    fn read_raw(&self, address: Address, buffer: &mut [u8]) -> BridgeResult<usize>;

    /// Write up to `data.len()` bytes, returning the number transferred
    fn write_raw(&self, address: Address, data: &[u8]) -> BridgeResult<usize>;

    /// Describe the region containing `address`
    fn query_region(&self, address: Address) -> BridgeResult<MemoryRegion>;

    /// Read exactly `len` bytes
    fn read_bytes(&self, address: Address, len: usize) -> BridgeResult<Vec<u8>> {
        let mut buffer = vec![0u8; len];
        if len == 0 {
            return Ok(buffer);
        }

        let bytes_read = self.read_raw(address, &mut buffer)?;
        if bytes_read != len {
            return Err(BridgeError::read_failed(
                address,
                format!(
                    "Partial read: expected {} bytes, read {} bytes",
                    len, bytes_read
                ),
            ));
        }

        Ok(buffer)
    }

    /// Write all of `data`
    fn write_bytes(&self, address: Address, data: &[u8]) -> BridgeResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        let bytes_written = self.write_raw(address, data)?;
        if bytes_written != data.len() {
            return Err(BridgeError::write_failed(
                address,
                format!(
                    "Partial write: expected {} bytes, wrote {} bytes",
                    data.len(),
                    bytes_written
                ),
            ));
        }

        Ok(())
    }

    /// Read a little-endian `i32`
    fn read_i32(&self, address: Address) -> BridgeResult<i32> {
        let bytes = self.read_bytes(address, 4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&bytes);
        Ok(i32::from_le_bytes(raw))
    }

    /// Write a little-endian `i32`
    fn write_i32(&self, address: Address, value: i32) -> BridgeResult<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }
}

/// An attached target: memory access plus process identity and liveness
pub trait AttachedProcess: ProcessMemory + Send + Sync + 'static {
    /// OS process id
    fn pid(&self) -> ProcessId;

    /// Base address of the main executable module
    fn module_base(&self) -> Address;

    /// Non-blocking exit check; false once the process has terminated
    fn is_alive(&self) -> bool;
}
