//! Shared helpers for benchmark tests

use std::sync::Arc;

use syncstruct::types::FieldDecl;
use syncstruct::{ByteWriter, ElementStruct, Session, SessionConfig, TypeTag};

/// Creates a session for `replica` with default collaborators.
pub fn bench_session(replica: u16) -> Arc<Session> {
    Session::new(SessionConfig::for_replica(replica)).expect("Failed to create session")
}

/// Mixed element types cycled through by the fixtures
pub fn mixed_types() -> Vec<TypeTag> {
    vec![
        TypeTag::Int32,
        TypeTag::String,
        TypeTag::Float64,
        TypeTag::reference(TypeTag::Int32),
        TypeTag::record(
            "Point",
            vec![
                FieldDecl::new("x", TypeTag::Float32),
                FieldDecl::new("y", TypeTag::Float32),
            ],
        ),
    ]
}

/// Creates a collection with `count` unflushed elements of mixed types.
pub fn populated(replica: u16, count: usize) -> ElementStruct {
    let types = mixed_types();
    let mut collection = ElementStruct::new(bench_session(replica));
    for i in 0..count {
        collection
            .add(types[i % types.len()].clone())
            .expect("Failed to add element");
    }
    collection
}

/// Encodes the pending history of `collection` without confirming it.
pub fn delta_bytes(collection: &ElementStruct) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    collection.encode_delta(&mut writer);
    writer.into_bytes()
}

/// Encodes the full state of `collection`.
pub fn snapshot_bytes(collection: &ElementStruct) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    collection.encode_full(&mut writer);
    writer.into_bytes()
}
