//! Property tests for identities and slot table invariants.

use std::collections::HashSet;

use proptest::prelude::*;
use teslasuit_api::DeviceHandle;
use teslasuit_device::{DeviceId, SLOT_COUNT, SlotIndex, SlotTable};

#[derive(Debug, Clone)]
enum Op {
    Connect(u8),
    Disconnect(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    // Twelve identities against eight slots exercises the full-table path.
    prop_oneof![
        (0_u8..12).prop_map(Op::Connect),
        (0_u8..12).prop_map(Op::Disconnect),
    ]
}

fn id(n: u8) -> DeviceId {
    DeviceId::from_bytes([n; 16])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_identity_equality_matches_bytes(a in any::<[u8; 16]>(), b in any::<[u8; 16]>()) {
        prop_assert_eq!(DeviceId::from_bytes(a) == DeviceId::from_bytes(b), a == b);
        prop_assert_eq!(DeviceId::from_bytes(a).cmp(&DeviceId::from_bytes(b)), a.cmp(&b));
    }

    #[test]
    fn prop_short_slices_always_fail(bytes in proptest::collection::vec(any::<u8>(), 0..16)) {
        prop_assert!(DeviceId::from_slice(&bytes).is_err());
    }

    #[test]
    fn prop_display_parses_back(bytes in any::<[u8; 16]>()) {
        let id = DeviceId::from_bytes(bytes);
        let parsed: DeviceId = id.to_string().parse().map_err(|e| TestCaseError::fail(format!("{e}")))?;
        prop_assert_eq!(parsed, id);
    }

    #[test]
    fn prop_slot_table_invariants(ops in proptest::collection::vec(op_strategy(), 1..64)) {
        let mut table = SlotTable::new();
        let mut next_handle = 0x1000_usize;

        for op in ops {
            match op {
                Op::Connect(n) => {
                    let already = table.slot_of(id(n));
                    let full = table.connected_slots().len() == SLOT_COUNT;
                    next_handle += 0x10;
                    let handle = DeviceHandle::from_raw(next_handle)
                        .ok_or_else(|| TestCaseError::fail("zero handle"))?;
                    let before = table.connected_slots();
                    let result = table.connect(id(n), handle);

                    if already.is_some() || full {
                        prop_assert!(result.is_err());
                        prop_assert_eq!(table.connected_slots(), before);
                    } else {
                        let slot = result.map_err(|e| TestCaseError::fail(format!("{e}")))?;
                        prop_assert_eq!(table.slot_of(id(n)), Some(slot));
                        prop_assert_eq!(table.record(slot).handle(), Some(handle));
                    }
                }
                Op::Disconnect(n) => {
                    let held = table.slot_of(id(n));
                    prop_assert_eq!(table.disconnect(id(n)), held);
                    prop_assert_eq!(table.slot_of(id(n)), None);
                }
            }

            // At most one connected slot per identity.
            let mut ids = HashSet::new();
            for slot in table.connected_slots() {
                prop_assert!(ids.insert(table.record(slot).id()));
            }
            // No two identities remember the same slot.
            let mut remembered = HashSet::new();
            for n in 0..12 {
                if let Some(slot) = table.remembered_slot(id(n)) {
                    prop_assert!(remembered.insert(slot));
                }
            }
        }
    }

    #[test]
    fn prop_slot_index_bounds(raw in any::<u8>()) {
        prop_assert_eq!(SlotIndex::new(raw).is_ok(), usize::from(raw) < SLOT_COUNT);
    }
}
