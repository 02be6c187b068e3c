//! Masked byte-signature scanning over committed regions

use crate::core::types::{Address, BridgeError, BridgeResult};
use crate::memory::ProcessMemory;
use std::fmt;
use tracing::{debug, trace};

/// Default working buffer for region reads (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 0x10000;

/// A byte pattern with a per-byte wildcard mask
///
/// `mask[i] == true` means byte `i` must equal `bytes[i]`; `false` is a
/// wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteSignature {
    bytes: Vec<u8>,
    mask: Vec<bool>,
}

impl ByteSignature {
    /// Create from explicit bytes and mask
    pub fn new(bytes: Vec<u8>, mask: Vec<bool>) -> BridgeResult<Self> {
        if bytes.is_empty() {
            return Err(BridgeError::InvalidPattern("Empty pattern".to_string()));
        }
        if bytes.len() != mask.len() {
            return Err(BridgeError::InvalidPattern(format!(
                "Pattern has {} bytes but mask has {} entries",
                bytes.len(),
                mask.len()
            )));
        }
        Ok(ByteSignature { bytes, mask })
    }

    /// Create a signature where every byte must match
    pub fn exact(bytes: &[u8]) -> BridgeResult<Self> {
        Self::new(bytes.to_vec(), vec![true; bytes.len()])
    }

    /// Create from bytes and a mask string (`x` = must match, `?` = any)
    pub fn from_mask_str(bytes: &[u8], mask: &str) -> BridgeResult<Self> {
        let mask = mask
            .chars()
            .map(|c| match c {
                'x' | 'X' => Ok(true),
                '?' => Ok(false),
                other => Err(BridgeError::InvalidPattern(format!(
                    "Invalid mask character '{}'",
                    other
                ))),
            })
            .collect::<BridgeResult<Vec<bool>>>()?;
        Self::new(bytes.to_vec(), mask)
    }

    /// Parse a text pattern such as `"48 8B 05 ?? ?? ?? ??"`
    pub fn from_pattern(pattern: &str) -> BridgeResult<Self> {
        let parts: Vec<&str> = pattern.split_whitespace().collect();
        if parts.is_empty() {
            return Err(BridgeError::InvalidPattern("Empty pattern".to_string()));
        }

        let mut bytes = Vec::with_capacity(parts.len());
        let mut mask = Vec::with_capacity(parts.len());

        for part in parts {
            if part == "??" || part == "?" {
                bytes.push(0);
                mask.push(false);
                continue;
            }

            if part.len() != 2 {
                return Err(BridgeError::InvalidPattern(format!(
                    "Invalid hex byte '{}': must be 2 digits",
                    part
                )));
            }
            let decoded = hex::decode(part)
                .map_err(|_| BridgeError::InvalidPattern(format!("Invalid hex: {}", part)))?;
            bytes.push(decoded[0]);
            mask.push(true);
        }

        Self::new(bytes, mask)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Check whether `window` starts with this signature
    pub fn matches_at(&self, window: &[u8]) -> bool {
        window.len() >= self.bytes.len()
            && self
                .bytes
                .iter()
                .zip(&self.mask)
                .zip(window)
                .all(|((expected, must_match), actual)| !must_match || expected == actual)
    }

    /// Offset of the first match in `haystack`
    pub fn find_in(&self, haystack: &[u8]) -> Option<usize> {
        if haystack.len() < self.bytes.len() {
            return None;
        }
        (0..=haystack.len() - self.bytes.len()).find(|&i| self.matches_at(&haystack[i..]))
    }
}

impl fmt::Display for ByteSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (byte, must_match)) in self.bytes.iter().zip(&self.mask).enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            if *must_match {
                write!(f, "{:02X}", byte)?;
            } else {
                write!(f, "??")?;
            }
        }
        Ok(())
    }
}

/// Walks target regions looking for a [`ByteSignature`]
///
/// Consecutive chunks of a region overlap by `signature.len() - 1` bytes so a
/// match is never lost at a chunk boundary. A match that straddles two
/// distinct regions is not detected. A failed chunk read skips the rest of
/// that region.
pub struct PatternScanner<'a, M: ProcessMemory + ?Sized> {
    memory: &'a M,
    chunk_size: usize,
}

impl<'a, M: ProcessMemory + ?Sized> PatternScanner<'a, M> {
    /// Create a scanner with the default 64 KiB working buffer
    pub fn new(memory: &'a M) -> Self {
        PatternScanner {
            memory,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the working buffer size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Find the lowest address in `[start, start + window)` where `signature` matches
    pub fn find_pattern(
        &self,
        signature: &ByteSignature,
        start: Address,
        window: usize,
    ) -> BridgeResult<Address> {
        let end = start.saturating_add(window);
        let mut address = start;

        while address < end {
            let region = match self.memory.query_region(address) {
                Ok(region) => region,
                Err(err) => {
                    debug!("Region query stopped at {}: {}", address, err);
                    break;
                }
            };

            let region_end = region.end_address();
            if region_end <= address {
                // No forward progress possible
                break;
            }

            if region.is_scannable() {
                if let Some(found) = self.scan_range(signature, address, region_end, end) {
                    return Ok(found);
                }
            } else {
                trace!(
                    "Skipping region {} (+0x{:X}, {:?}, {})",
                    region.base_address,
                    region.size,
                    region.state,
                    region.protection
                );
            }

            address = region_end;
        }

        Err(BridgeError::PatternNotFound)
    }

    /// Scan `[from, region_end)`, accepting matches that start before `limit`
    fn scan_range(
        &self,
        signature: &ByteSignature,
        from: Address,
        region_end: Address,
        limit: Address,
    ) -> Option<Address> {
        let overlap = signature.len() - 1;
        let chunk_size = self.chunk_size.max(signature.len() * 2);
        let match_limit = region_end.min(limit).as_usize();
        let read_limit = region_end
            .min(limit.saturating_add(overlap))
            .as_usize();

        let mut chunk_start = from.as_usize();
        while chunk_start < match_limit {
            let read_end = chunk_start.saturating_add(chunk_size).min(read_limit);
            let len = read_end - chunk_start;
            if len < signature.len() {
                break;
            }

            let bytes = match self.memory.read_bytes(Address::new(chunk_start), len) {
                Ok(bytes) => bytes,
                Err(err) => {
                    trace!("Skipping rest of region at 0x{:X}: {}", chunk_start, err);
                    return None;
                }
            };

            if let Some(offset) = signature.find_in(&bytes) {
                let found = chunk_start + offset;
                return (found < match_limit).then_some(Address::new(found));
            }

            if read_end >= read_limit {
                break;
            }
            chunk_start = read_end - overlap;
        }

        None
    }
}
