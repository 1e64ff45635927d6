//! Delta batch tests
//!
//! Tests the incremental wire format end to end: what a writer emits for its
//! pending history and how a reader replays it, including rejected batches.

use std::sync::Arc;

use syncstruct::member::Field;
use syncstruct::structs::DeltaRecord;
use syncstruct::trash::TrashBin;
use syncstruct::{ByteWriter, ElementStruct, RefId, Session, StructConfig, TypeTag, Value};

use super::helpers::*;
use crate::helpers::*;

/// Frames `body` as a batch of `count` records with the given offset.
fn batch(count: u64, offset: u64, body: &[u8]) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.write_varint(count);
    writer.write_varint(offset);
    writer.write_bytes(body);
    writer.into_bytes()
}

#[test]
fn test_two_appends_wire_bytes() {
    let mut writer = ElementStruct::new(session());
    writer.add(TypeTag::Int32).unwrap();
    writer.add(TypeTag::String).unwrap();

    let bytes = flush(&mut writer);
    assert_eq!(bytes, vec![2, 1, 0x21, 2, 0, 0x21, 6, 1]);
    assert!(!writer.needs_flush());

    let mut reader = ElementStruct::new(session_for(5));
    replay(&mut reader, &bytes).expect("Failed to replay delta");
    assert_eq!(types_of(&reader), vec![TypeTag::Int32, TypeTag::String]);
    assert_eq!(ids_of(&reader), vec![RefId::new(1), RefId::new(2)]);
    assert!(!reader.needs_flush());
}

#[test]
fn test_flushed_history_encodes_empty_batch() {
    let mut writer = flushed_collection(&[TypeTag::Bool]);
    let bytes = flush(&mut writer);
    assert_eq!(bytes[0], 0);

    let mut reader = flushed_collection(&[TypeTag::Int64]);
    replay(&mut reader, &bytes).unwrap();
    assert_eq!(types_of(&reader), vec![TypeTag::Int64]);
}

#[test]
fn test_index_shift_replays_surviving_insert() {
    let mut writer = ElementStruct::new(session());
    writer.insert(0, TypeTag::Int32).unwrap();
    let b = writer.insert(0, TypeTag::String).unwrap().id();
    writer.remove_at(1).unwrap();

    let bytes = peek_delta(&writer);
    assert_eq!(bytes[0], 1, "only the surviving insert is sent");

    let mut reader = ElementStruct::new(session_for(3));
    replay(&mut reader, &bytes).unwrap();
    assert_eq!(types_of(&reader), vec![TypeTag::String]);
    assert_eq!(ids_of(&reader), vec![b]);
}

#[test]
fn test_interleaved_history_converges() {
    let (mut writer, mut reader) = replica_pair();
    for ty in [TypeTag::Bool, TypeTag::Int32, TypeTag::Int64] {
        writer.add(ty).unwrap();
    }
    sync_and_compare(&mut writer, &mut reader);

    writer.insert(1, TypeTag::String).unwrap();
    writer.remove_at(3).unwrap();
    writer.add(TypeTag::Float64).unwrap();
    writer.insert(0, TypeTag::Float32).unwrap();
    writer.remove_at(2).unwrap();
    sync_and_compare(&mut writer, &mut reader);
    assert_eq!(
        types_of(&reader),
        vec![
            TypeTag::Float32,
            TypeTag::Bool,
            TypeTag::Int32,
            TypeTag::Float64
        ]
    );
}

#[test]
fn test_clear_supersedes_on_reader() {
    let (mut writer, mut reader) = replica_pair();
    writer.add(TypeTag::Int32).unwrap();
    writer.add(TypeTag::Int32).unwrap();
    sync_and_compare(&mut writer, &mut reader);

    writer.add(TypeTag::String).unwrap();
    writer.clear();
    writer.add(TypeTag::Bool).unwrap();
    assert_eq!(writer.pending_records().len(), 2);
    assert_eq!(writer.pending_records()[0], DeltaRecord::Clear);

    sync_and_compare(&mut writer, &mut reader);
    assert_eq!(types_of(&reader), vec![TypeTag::Bool]);
}

#[test]
fn test_remote_remove_disposes_element() {
    let bin = Arc::new(TrashBin::new());
    let reader_session = Session::builder()
        .replica(2)
        .recycle_bin(bin.clone())
        .build()
        .unwrap();
    let mut writer = ElementStruct::new(session_for(1));
    let mut reader = ElementStruct::new(reader_session);

    writer.add(TypeTag::Int32).unwrap();
    writer.add(TypeTag::String).unwrap();
    sync_and_compare(&mut writer, &mut reader);
    let removed = reader.get(0).unwrap().id();

    writer.remove_at(0).unwrap();
    sync_and_compare(&mut writer, &mut reader);
    assert!(!reader.contains(removed));
    assert!(bin.is_empty(), "replayed removals are not recoverable");
}

#[test]
fn test_replayed_elements_carry_default_values() {
    let (mut writer, mut reader) = replica_pair();
    writer
        .add(TypeTag::String)
        .unwrap()
        .downcast_mut::<Field>()
        .unwrap()
        .set("local only")
        .unwrap();
    sync_and_compare(&mut writer, &mut reader);
    assert_eq!(value_at(&reader, 0), Value::String(String::new()));
}

#[test]
fn test_record_elements_replay_nested_identities() {
    let (mut writer, mut reader) = replica_pair();
    writer.add(TypeTag::Int32).unwrap();
    writer.add(point_type()).unwrap();
    sync_and_compare(&mut writer, &mut reader);

    assert_eq!(
        writer.get(1).unwrap().collect_child_ids(),
        reader.get(1).unwrap().collect_child_ids()
    );
}

#[test]
fn test_remote_remove_rejected_during_init() {
    let mut writer = flushed_collection(&[TypeTag::Int32]);
    writer.remove_at(0).unwrap();
    let bytes = flush(&mut writer);

    let mut reader = ElementStruct::initializing(session_for(4), StructConfig::default());
    reader.add(TypeTag::Int32).unwrap();
    let err = replay(&mut reader, &bytes).unwrap_err();
    assert!(err.is_invalid_phase());
    assert_eq!(reader.len(), 1);
}

#[test]
fn test_truncated_batch_leaves_reader_unchanged() {
    let mut reader = flushed_collection(&[TypeTag::Bool]);
    let before = ids_of(&reader);

    let err = replay(&mut reader, &[2, 1, 0x21, 2, 0]).unwrap_err();
    assert!(err.is_truncated());
    assert_eq!(ids_of(&reader), before);

    let err = replay(&mut reader, &batch(200, 1, &[0x21])).unwrap_err();
    assert!(err.is_truncated());
    assert_eq!(ids_of(&reader), before);
}

#[test]
fn test_unknown_tag_is_rejected() {
    let mut reader = flushed_collection(&[TypeTag::Bool]);
    let err = replay(&mut reader, &batch(1, u64::MAX, &[0x7f])).unwrap_err();
    assert!(err.is_unknown_tag());
    assert_eq!(reader.len(), 1);
}

#[test]
fn test_out_of_range_position_is_rejected() {
    let mut reader = flushed_collection(&[TypeTag::Bool]);
    let before = ids_of(&reader);

    let err = replay(&mut reader, &batch(1, u64::MAX, &[0x13, 5])).unwrap_err();
    assert!(err.is_decode_error());
    assert_eq!(ids_of(&reader), before);

    let err = replay(&mut reader, &batch(1, 10, &[0x32, 2, 0, 2])).unwrap_err();
    assert!(err.is_decode_error());
    assert_eq!(ids_of(&reader), before);
}

#[test]
fn test_invalid_later_record_rejects_whole_batch() {
    let recorder = Arc::new(Recorder::default());
    let mut reader = ElementStruct::new(session());
    reader.add_listener(recorder.clone());

    // A valid append followed by a removal past the end
    let err = replay(&mut reader, &batch(2, 1, &[0x21, 2, 0, 0x13, 3])).unwrap_err();
    assert!(err.is_decode_error());
    assert!(reader.is_empty());
    assert!(recorder.take().is_empty(), "no notification for a rejected batch");
}

#[test]
fn test_batch_reusing_live_identity_is_rejected() {
    let recorder = Arc::new(Recorder::default());
    let mut reader = flushed_collection(&[TypeTag::Int32]);
    reader.add_listener(recorder.clone());
    let live = reader.get(0).unwrap().id();
    let before = ids_of(&reader);

    let err = replay(&mut reader, &batch(1, live.raw(), &[0x21, 2, 0])).unwrap_err();
    assert!(err.is_duplicate_identity());
    assert_eq!(ids_of(&reader), before);
    assert!(recorder.take().is_empty());
}

#[test]
fn test_batch_repeating_identity_is_rejected() {
    let mut reader = ElementStruct::new(session());

    // Two appends of identity 7, then one of the same identity after a clear
    let err = replay(&mut reader, &batch(2, 7, &[0x21, 2, 0, 0x32, 6, 0, 0])).unwrap_err();
    assert!(err.is_duplicate_identity());
    assert!(reader.is_empty());

    replay(&mut reader, &batch(3, 7, &[0x21, 2, 0, 0x04, 0x21, 6, 0])).unwrap();
    assert_eq!(ids_of(&reader), vec![RefId::new(7)]);
    assert_eq!(types_of(&reader), vec![TypeTag::String]);
}

#[test]
fn test_identity_freed_by_remove_can_be_reused() {
    let mut reader = flushed_collection(&[TypeTag::Int32, TypeTag::Bool]);
    let freed = reader.get(0).unwrap().id();

    let bytes = batch(2, freed.raw(), &[0x13, 0, 0x32, 2, 0, 1]);
    replay(&mut reader, &bytes).unwrap();
    assert_eq!(types_of(&reader), vec![TypeTag::Bool, TypeTag::Int32]);
    assert_eq!(reader.get(1).unwrap().id(), freed);
}

#[test]
fn test_unknown_custom_type_is_rejected() {
    let mut writer = ElementStruct::new(gadget_session());
    writer.add(gadget_type()).unwrap();
    let bytes = flush(&mut writer);

    let mut reader = ElementStruct::new(session_for(2));
    let err = replay(&mut reader, &bytes).unwrap_err();
    assert!(err.is_missing_factory());
    assert!(reader.is_empty());
}
