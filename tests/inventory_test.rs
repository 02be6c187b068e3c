//! Integration tests for pointer resolution and item grants

use memory_bridge::core::types::{Address, BridgeError};
use memory_bridge::inventory::{InventoryLayout, PointerResolver};
use memory_bridge::memory::ProcessMemory;
use memory_bridge::{BridgeContext, GrantRequest, SnapshotMemory};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const BASE: usize = 0x7FF6_1000_0000;
const SIZE: usize = 0x1000;

fn memory() -> SnapshotMemory {
    SnapshotMemory::builder().pid(31337).zeroed(BASE, SIZE).build()
}

#[test]
fn test_socket_style_grant_scenario() {
    let ctx = BridgeContext::new(InventoryLayout::default());
    let session = ctx.attach(memory());
    session.set_pointer(Address::new(BASE)).unwrap();
    session
        .target()
        .write_i32(Address::new(BASE + 0xC), 10)
        .unwrap();

    let outcome = ctx.grant_item(GrantRequest::new(100, 5)).unwrap();
    assert_eq!(outcome.previous_quantity, 10);
    assert_eq!(outcome.new_quantity, 15);
    assert_eq!(
        session.target().read_i32(Address::new(BASE + 0x8)).unwrap(),
        100
    );
    assert_eq!(
        session.target().read_i32(Address::new(BASE + 0xC)).unwrap(),
        15
    );
}

#[test]
fn test_custom_layout() {
    let ctx = BridgeContext::new(InventoryLayout::new(0x20, 0x24));
    let session = ctx.attach(memory());
    session.set_pointer_from_field(Address::new(BASE + 0x120)).unwrap();

    ctx.grant_item(GrantRequest::new(3, 9)).unwrap();
    assert_eq!(
        session.target().read_i32(Address::new(BASE + 0x124)).unwrap(),
        9
    );
    assert_eq!(ctx.status().inventory_ptr, Some(Address::new(BASE + 0x100)));
}

#[test]
fn test_validate_zero_always_fails() {
    let resolver = PointerResolver::new(InventoryLayout::default());
    assert!(matches!(
        resolver.validate(&memory(), Address::null()),
        Err(BridgeError::InvalidPointer(_))
    ));
}

proptest! {
    #[test]
    fn prop_field_address_matches_direct(
        field in prop_oneof![0usize..0x40, (BASE - 0x10)..(BASE + SIZE + 0x10)],
    ) {
        let memory = memory();
        let layout = InventoryLayout::default();
        let mut by_field = PointerResolver::new(layout);
        let mut direct = PointerResolver::new(layout);

        let from_field = by_field.set_from_field_address(&memory, Address::new(field));
        if field < layout.id_offset {
            let is_underflow = matches!(from_field, Err(BridgeError::PointerUnderflow { .. }));
            prop_assert!(is_underflow);
        } else {
            let from_direct = direct.set_direct(&memory, Address::new(field - layout.id_offset));
            prop_assert_eq!(from_field.ok(), from_direct.ok());
            prop_assert_eq!(by_field.current(), direct.current());
        }
    }

    #[test]
    fn prop_grant_then_inverse_restores(
        initial in any::<i32>(),
        id in 1i32..=i32::MAX,
        qty in any::<i32>().prop_filter("non-zero", |q| *q != 0 && *q != i32::MIN),
    ) {
        let ctx = BridgeContext::new(InventoryLayout::default());
        let session = ctx.attach(memory());
        session.set_pointer(Address::new(BASE)).unwrap();
        let quantity = Address::new(BASE + 0xC);
        session.target().write_i32(quantity, initial).unwrap();

        ctx.grant_item(GrantRequest::new(id, qty)).unwrap();
        ctx.grant_item(GrantRequest::new(id, -qty)).unwrap();

        prop_assert_eq!(session.target().read_i32(quantity).unwrap(), initial);
        prop_assert_eq!(session.target().read_i32(Address::new(BASE + 0x8)).unwrap(), id);
    }

    #[test]
    fn prop_read_write_idempotent(
        offset in 0usize..(SIZE - 16),
        data in proptest::collection::vec(any::<u8>(), 1..16),
    ) {
        let memory = memory();
        let address = Address::new(BASE + offset);
        memory.write_bytes(address, &data).unwrap();

        let read = memory.read_bytes(address, data.len()).unwrap();
        memory.write_bytes(address, &read).unwrap();
        prop_assert_eq!(memory.read_bytes(address, data.len()).unwrap(), data);
    }
}
