//! The inventory structure inside the target
//!
//! An [`InventoryPointer`] is the validated base of a small record whose
//! identifier and quantity fields are 4-byte integers at fixed offsets.
//! Pointers only come out of [`PointerResolver`], which never commits an
//! address that failed a read of the identifier field.

pub mod grant;
pub mod resolver;

pub use grant::{grant_item, GrantOutcome, GrantRequest};
pub use resolver::{PointerResolver, SignatureSearch};

use crate::config::InventoryConfig;
use crate::core::types::{Address, BridgeError, BridgeResult, Offset};
use std::fmt;

/// Default offset of the identifier field
pub const DEFAULT_ID_OFFSET: Offset = 0x8;

/// Default offset of the quantity field
pub const DEFAULT_QUANTITY_OFFSET: Offset = 0xC;

/// Field offsets relative to the inventory base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryLayout {
    pub id_offset: Offset,
    pub quantity_offset: Offset,
}

impl InventoryLayout {
    pub fn new(id_offset: Offset, quantity_offset: Offset) -> Self {
        InventoryLayout {
            id_offset,
            quantity_offset,
        }
    }
}

impl Default for InventoryLayout {
    fn default() -> Self {
        Self::new(DEFAULT_ID_OFFSET, DEFAULT_QUANTITY_OFFSET)
    }
}

impl From<&InventoryConfig> for InventoryLayout {
    fn from(config: &InventoryConfig) -> Self {
        Self::new(config.id_offset, config.quantity_offset)
    }
}

/// A validated inventory base address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryPointer {
    base: Address,
    layout: InventoryLayout,
}

impl InventoryPointer {
    /// Only the resolver creates pointers, after validation
    pub(crate) fn new(base: Address, layout: InventoryLayout) -> Self {
        InventoryPointer { base, layout }
    }

    pub fn base(&self) -> Address {
        self.base
    }

    pub fn layout(&self) -> InventoryLayout {
        self.layout
    }

    /// Address of the identifier field
    pub fn id_field(&self) -> BridgeResult<Address> {
        field(self.base, self.layout.id_offset)
    }

    /// Address of the quantity field
    pub fn quantity_field(&self) -> BridgeResult<Address> {
        field(self.base, self.layout.quantity_offset)
    }
}

impl fmt::Display for InventoryPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)
    }
}

fn field(base: Address, offset: Offset) -> BridgeResult<Address> {
    base.checked_add(offset).ok_or_else(|| {
        BridgeError::InvalidPointer(format!("{} + 0x{:X} overflows", base, offset))
    })
}
