//! Layout-driven list tests

use syncstruct::{ElementList, ElementStruct, LayoutSource, TypeTag};

use crate::helpers::*;

/// Alternating Int32/String layout of a fixed length
struct Alternating(usize);

impl LayoutSource for Alternating {
    fn type_at(&self, index: usize) -> Option<TypeTag> {
        (index < self.0).then(|| {
            if index % 2 == 0 {
                TypeTag::Int32
            } else {
                TypeTag::String
            }
        })
    }
}

#[test]
fn test_add_element_follows_layout() {
    let mut list = ElementList::new(
        ElementStruct::new(session()),
        vec![TypeTag::Bool, TypeTag::Float32],
    );
    list.add_element().unwrap();
    list.add_element().unwrap();
    assert_eq!(types_of(&list), vec![TypeTag::Bool, TypeTag::Float32]);

    let err = list.add_element().unwrap_err();
    assert!(err.is_out_of_range());
    assert_eq!(list.len(), 2);
}

#[test]
fn test_expected_layout_from_type_at() {
    assert_eq!(
        Alternating(3).expected_layout(),
        vec![TypeTag::Int32, TypeTag::String, TypeTag::Int32]
    );
    assert!(Alternating(0).expected_layout().is_empty());
}

#[test]
fn test_sync_layout_reshapes() {
    let mut list = ElementList::new(ElementStruct::new(session()), Alternating(4));
    list.sync_layout().unwrap();
    assert_eq!(list.len(), 4);
    let kept = list.get(0).unwrap().id();

    list.set_source(Alternating(1));
    list.sync_layout().unwrap();
    assert_eq!(types_of(&list), vec![TypeTag::Int32]);
    assert_eq!(list.get(0).unwrap().id(), kept);
}

#[test]
fn test_sync_layout_replaces_mismatched_slots() {
    let mut collection = ElementStruct::new(session());
    collection.add(TypeTag::Int32).unwrap();
    collection.add(TypeTag::Bool).unwrap();
    collection.clear_dirty();
    let replaced = collection.get(1).unwrap().id();

    let mut list = ElementList::new(collection, Alternating(2));
    list.sync_layout().unwrap();
    assert_eq!(types_of(&list), vec![TypeTag::Int32, TypeTag::String]);
    assert!(!list.contains(replaced));
    assert!(list.needs_flush());

    let inner = list.into_inner();
    assert_eq!(inner.len(), 2);
}

#[test]
fn test_list_replicates_like_collection() {
    let mut list = ElementList::new(ElementStruct::new(session_for(1)), Alternating(3));
    list.sync_layout().unwrap();

    let mut reader = ElementStruct::new(session_for(2));
    replay(&mut reader, &flush(&mut list)).unwrap();
    assert_eq!(types_of(&reader), Alternating(3).expected_layout());
}
