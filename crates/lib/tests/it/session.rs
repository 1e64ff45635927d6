//! Session integration tests
//!
//! Tests the collaborators a session shares between its collections:
//! identity allocation across replicas, the recycle bin lifecycle and
//! custom member factories.

use std::collections::HashSet;
use std::sync::Arc;

use syncstruct::reference::ReferenceController;
use syncstruct::trash::TrashBin;
use syncstruct::{
    ElementStruct, InboundContext, RefId, Session, SessionClock, SessionConfig, StructConfig,
    TypeTag, Value,
};

use crate::helpers::*;

#[test]
fn test_replicas_allocate_disjoint_identities() {
    let mut first = ElementStruct::new(session_for(1));
    let mut second = ElementStruct::new(session_for(2));
    for _ in 0..8 {
        first.add(TypeTag::Int32).unwrap();
        second.add(TypeTag::Int32).unwrap();
    }

    let ids: HashSet<RefId> = first.ids().chain(second.ids()).collect();
    assert_eq!(ids.len(), 16);
    assert!(first.ids().all(|id| id.replica() == 1));
    assert!(second.ids().all(|id| id.replica() == 2));
}

#[test]
fn test_collections_share_session_identities() {
    let session = session();
    let mut a = ElementStruct::new(session.clone());
    let mut b = ElementStruct::new(session.clone());
    let first = a.add(TypeTag::Bool).unwrap().id();
    let second = b.add(TypeTag::Bool).unwrap().id();
    assert_ne!(first, second);

    let mut local = ElementStruct::with_config(
        session,
        StructConfig {
            local: true,
            ..StructConfig::default()
        },
    );
    let third = local.add(TypeTag::Bool).unwrap().id();
    assert!(third.is_local());
    assert!(!first.is_local() && !second.is_local());
}

#[test]
fn test_replayed_identities_are_not_reissued() {
    // The reader shares the writer's replica number, as after a reconnect
    let mut writer = ElementStruct::new(session_for(4));
    writer.add(TypeTag::Int32).unwrap();
    writer.add(TypeTag::Int32).unwrap();

    let mut reader = ElementStruct::new(session_for(4));
    replay(&mut reader, &flush(&mut writer)).unwrap();
    let fresh = reader.add(TypeTag::Int32).unwrap().id();
    assert!(!ids_of(&writer).contains(&fresh));
}

#[test]
fn test_custom_allocator() {
    let session = Session::builder()
        .replica(5)
        .allocator(Arc::new(ReferenceController::new(5)))
        .build()
        .unwrap();
    let mut collection = ElementStruct::new(session);
    assert_eq!(
        collection.add(TypeTag::Bool).unwrap().id(),
        RefId::network(5, 1)
    );
}

#[test]
fn test_config_rejects_out_of_range_replica() {
    let err = Session::new(SessionConfig::for_replica(0x8000)).unwrap_err();
    assert!(err.is_config_error());
    assert_eq!(err.module(), "session");
}

#[test]
fn test_purged_elements_cannot_be_resurrected() {
    let clock = Arc::new(SessionClock::new(0));
    let bin = Arc::new(TrashBin::new());
    let session = Session::builder()
        .clock(clock.clone())
        .recycle_bin(bin.clone())
        .build()
        .unwrap();

    let mut collection = ElementStruct::new(session);
    collection.add(TypeTag::Int32).unwrap();
    set_value(&mut collection, 0, 5);
    collection.clear_dirty();
    let bytes = snapshot(&collection);

    clock.set(3);
    collection.remove_at(0).unwrap();
    assert_eq!(bin.trashed_at(RefId::new(1)), Some(3));

    clock.set(10);
    assert_eq!(bin.purge_before(4), 1);
    restore(&mut collection, &bytes, InboundContext::confirmed(3)).unwrap();
    assert_eq!(value_at(&collection, 0), Value::Int32(0));
}

#[test]
fn test_custom_factory_elements_replicate() {
    let mut writer = ElementStruct::new(gadget_session());
    writer.add(gadget_type()).unwrap();
    writer.add(TypeTag::Int32).unwrap();

    let mut reader = ElementStruct::new(gadget_session());
    replay(&mut reader, &flush(&mut writer)).unwrap();
    assert_eq!(types_of(&reader), types_of(&writer));
    assert_eq!(
        reader.get(0).unwrap().collect_child_ids(),
        writer.get(0).unwrap().collect_child_ids()
    );
    assert!(reader.get(0).unwrap().downcast_ref::<Gadget>().is_some());
}
