//! Tree persistence tests

use serde_json::json;
use syncstruct::member::Reference;
use syncstruct::{ElementStruct, RefId, TypeTag, Value};

use super::helpers::*;
use crate::helpers::*;

#[test]
fn test_save_layout() {
    let mut collection = flushed_collection(&[TypeTag::Int32, TypeTag::String]);
    set_value(&mut collection, 0, 7);
    set_value(&mut collection, 1, "seven");

    let saved = collection.save().expect("Failed to save");
    let list = saved.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["Value"], json!(7));
    assert_eq!(list[1]["Value"], json!("seven"));
    assert!(list[0].get("Type").is_some());
}

#[test]
fn test_save_load_round_trip() {
    let mut source = ElementStruct::new(session());
    source.add(TypeTag::Bool).unwrap();
    source.add(TypeTag::Float64).unwrap();
    source.add(point_type()).unwrap();
    let holder = source.add(TypeTag::reference(TypeTag::Int32)).unwrap();
    holder
        .downcast_ref::<Reference>()
        .unwrap()
        .set_target(Some(RefId::new(99)));
    set_value(&mut source, 0, true);
    set_value(&mut source, 1, 2.5f64);
    let saved = source.save().unwrap();

    let mut loaded = ElementStruct::new(session_for(6));
    loaded.load(&saved).expect("Failed to load");

    assert_eq!(types_of(&loaded), types_of(&source));
    assert_eq!(value_at(&loaded, 0), Value::Bool(true));
    assert_eq!(value_at(&loaded, 1), Value::Float64(2.5));
    assert_eq!(loaded.save().unwrap(), saved);
    // Loading records history like any other local addition
    assert_eq!(loaded.pending_records().len(), 4);
}

#[test]
fn test_load_appends() {
    let source = flushed_collection(&[TypeTag::Int64]);
    let mut target = flushed_collection(&[TypeTag::Bool]);
    target.load(&source.save().unwrap()).unwrap();
    assert_eq!(types_of(&target), vec![TypeTag::Bool, TypeTag::Int64]);
}

#[test]
fn test_load_skips_malformed_entries() {
    let mut collection = ElementStruct::new(session());
    let node = json!([
        7,
        { "Value": 3 },
        { "Type": "Int32", "Value": 3 },
        { "Type": "String" },
    ]);
    collection.load(&node).unwrap();

    assert_eq!(types_of(&collection), vec![TypeTag::Int32, TypeTag::String]);
    assert_eq!(value_at(&collection, 0), Value::Int32(3));
    assert_eq!(value_at(&collection, 1), Value::String(String::new()));
}

#[test]
fn test_load_non_list_is_ignored() {
    let mut collection = flushed_collection(&[TypeTag::Bool]);
    collection.load(&json!({ "Type": "Int32" })).unwrap();
    assert_eq!(collection.len(), 1);
    assert!(!collection.needs_flush());
}

#[test]
fn test_load_rejects_unparseable_type() {
    let mut collection = ElementStruct::new(session());
    let err = collection
        .load(&json!([{ "Type": { "NoSuchKind": 1 } }]))
        .unwrap_err();
    assert!(err.is_serialization_error());
}

#[test]
fn test_load_rejects_mismatched_value() {
    let mut collection = ElementStruct::new(session());
    let err = collection
        .load(&json!([{ "Type": "Int32", "Value": "not a number" }]))
        .unwrap_err();
    assert!(err.is_type_error());
}
