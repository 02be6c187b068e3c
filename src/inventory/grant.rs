//! Item grants through a validated inventory pointer

use crate::core::types::BridgeResult;
use crate::inventory::InventoryPointer;
use crate::memory::ProcessMemory;
use serde::Serialize;
use tracing::{debug, warn};

/// A request to add `qty` of item `id`
///
/// Requests coming off the wire are checked by the command parser:
/// `id > 0` and `qty != 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantRequest {
    pub id: i32,
    pub qty: i32,
}

impl GrantRequest {
    pub fn new(id: i32, qty: i32) -> Self {
        GrantRequest { id, qty }
    }
}

/// What a grant changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GrantOutcome {
    pub id: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
}

/// Write the identifier, then add to the quantity field
///
/// An unreadable quantity counts as zero. The sum wraps on overflow. The
/// grant fails if either write fails. Callers serialize grants; this
/// function does no locking of its own.
pub fn grant_item<M: ProcessMemory + ?Sized>(
    memory: &M,
    pointer: &InventoryPointer,
    request: GrantRequest,
) -> BridgeResult<GrantOutcome> {
    let id_field = pointer.id_field()?;
    let quantity_field = pointer.quantity_field()?;

    memory.write_i32(id_field, request.id)?;

    let previous_quantity = match memory.read_i32(quantity_field) {
        Ok(value) => value,
        Err(e) => {
            warn!("Quantity read at {} failed, assuming 0: {}", quantity_field, e);
            0
        }
    };

    let new_quantity = previous_quantity.wrapping_add(request.qty);
    memory.write_i32(quantity_field, new_quantity)?;

    debug!(
        "Item {}: quantity {} -> {}",
        request.id, previous_quantity, new_quantity
    );
    Ok(GrantOutcome {
        id: request.id,
        previous_quantity,
        new_quantity,
    })
}
