//! Randomized replication tests
//!
//! Drives a writer through random edit histories and checks that readers
//! following its delta batches, or joining late from a snapshot, hold the
//! same element types and identities after every flush.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use syncstruct::{ElementStruct, InboundContext, TypeTag};

use super::helpers::*;
use crate::helpers::*;

const ROUNDS: usize = 40;

fn palette() -> Vec<TypeTag> {
    vec![
        TypeTag::Bool,
        TypeTag::Int32,
        TypeTag::Int64,
        TypeTag::Float64,
        TypeTag::String,
        TypeTag::reference(TypeTag::Int32),
        point_type(),
    ]
}

/// Applies one random edit to `collection`.
fn random_edit(rng: &mut StdRng, collection: &mut ElementStruct, palette: &[TypeTag]) {
    let len = collection.len();
    let ty = palette[rng.gen_range(0..palette.len())].clone();
    match rng.gen_range(0..100) {
        0..=29 => {
            collection.add(ty).unwrap();
        }
        30..=54 => {
            collection.insert(rng.gen_range(0..=len), ty).unwrap();
        }
        55..=84 if len > 0 => {
            collection.remove_at(rng.gen_range(0..len)).unwrap();
        }
        85..=96 if len > 1 => {
            let old = rng.gen_range(0..len);
            let new = rng.gen_range(0..len);
            collection.move_to_index(old, new).unwrap();
        }
        97..=99 => collection.clear(),
        _ => {
            collection.add(ty).unwrap();
        }
    }
}

#[test]
fn test_random_histories_converge() {
    let palette = palette();
    for seed in 0..16u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let (mut writer, mut reader) = replica_pair();

        for _ in 0..ROUNDS {
            for _ in 0..rng.gen_range(1..8) {
                random_edit(&mut rng, &mut writer, &palette);
            }
            sync_and_compare(&mut writer, &mut reader);
        }
    }
}

#[test]
fn test_late_joiner_follows_deltas() {
    let palette = palette();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let (mut writer, mut reader) = replica_pair();
    let mut late = ElementStruct::new(session_for(3));

    for round in 0..ROUNDS {
        for _ in 0..rng.gen_range(1..6) {
            random_edit(&mut rng, &mut writer, &palette);
        }
        let bytes = flush(&mut writer);
        replay(&mut reader, &bytes).unwrap();

        if round == ROUNDS / 2 {
            // Joins from a snapshot of the already flushed state
            restore(&mut late, &snapshot(&writer), InboundContext::default()).unwrap();
        } else if round > ROUNDS / 2 {
            replay(&mut late, &bytes).unwrap();
        }
        assert_converged(&writer, &reader);
        if round >= ROUNDS / 2 {
            assert_converged(&writer, &late);
        }
    }
}

#[test]
fn test_batches_only_carry_surviving_additions() {
    let palette = palette();
    let mut rng = StdRng::seed_from_u64(7);
    let mut writer = ElementStruct::new(session());

    for _ in 0..ROUNDS {
        random_edit(&mut rng, &mut writer, &palette);
    }
    // Every live Add/Insert in the history names an element still present
    for record in writer.pending_records() {
        if let Some(id) = record.addition_id() {
            assert!(writer.contains(id), "history keeps removed element {id}");
        }
    }
}
