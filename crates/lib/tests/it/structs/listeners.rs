//! Change notification tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use syncstruct::{ElementStruct, RefId, Result, StructListener, TypeTag};

use super::helpers::*;
use crate::helpers::*;

struct Failing;

impl StructListener for Failing {
    fn on_elements_added(&self, target: &ElementStruct, _start: usize, _count: usize) -> Result<()> {
        target.find(RefId::NULL).map(|_| ())
    }
}

struct Panicking;

impl StructListener for Panicking {
    fn on_elements_added(&self, _target: &ElementStruct, _start: usize, _count: usize) -> Result<()> {
        panic!("listener exploded");
    }

    fn on_elements_removed(
        &self,
        _target: &ElementStruct,
        _start: usize,
        _count: usize,
    ) -> Result<()> {
        panic!("listener exploded again");
    }
}

/// Counts additions and records the length the collection had at the time.
#[derive(Default)]
struct Observer {
    calls: AtomicUsize,
    seen_len: AtomicUsize,
}

impl StructListener for Observer {
    fn on_elements_added(&self, target: &ElementStruct, _start: usize, _count: usize) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_len.store(target.len(), Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_local_mutation_events() {
    let recorder = Arc::new(Recorder::default());
    let mut collection = ElementStruct::new(session());
    collection.add_listener(recorder.clone());

    collection.add(TypeTag::Int32).unwrap();
    collection.insert(0, TypeTag::Bool).unwrap();
    collection.remove_at(1).unwrap();
    collection.add(TypeTag::String).unwrap();
    collection.clear();

    assert_eq!(
        recorder.take(),
        vec![
            Event::Added(0, 1),
            Event::Added(0, 1),
            Event::Removing(1, 1, 2),
            Event::Removed(1, 1),
            Event::Added(1, 1),
            Event::Removing(0, 2, 2),
            Event::Removed(0, 2),
        ]
    );
}

#[test]
fn test_replayed_delta_notifies_per_record() {
    let (mut writer, mut reader) = replica_pair();
    let recorder = Arc::new(Recorder::default());
    reader.add_listener(recorder.clone());

    writer.add(TypeTag::Int32).unwrap();
    writer.add(TypeTag::Int32).unwrap();
    sync_and_compare(&mut writer, &mut reader);
    writer.remove_at(0).unwrap();
    sync_and_compare(&mut writer, &mut reader);

    assert_eq!(
        recorder.take(),
        vec![
            Event::Added(0, 1),
            Event::Added(1, 1),
            Event::Removing(0, 1, 2),
            Event::Removed(0, 1),
        ]
    );
}

#[test]
fn test_added_listener_sees_new_element() {
    let observer = Arc::new(Observer::default());
    let mut collection = flushed_collection(&[TypeTag::Bool]);
    collection.add_listener(observer.clone());

    collection.add(TypeTag::Int64).unwrap();
    assert_eq!(observer.seen_len.load(Ordering::SeqCst), 2);
}

#[test]
fn test_failing_listeners_are_isolated() {
    let before = Arc::new(Observer::default());
    let after = Arc::new(Observer::default());
    let mut collection = ElementStruct::new(session());
    collection.add_listener(before.clone());
    collection.add_listener(Arc::new(Failing));
    collection.add_listener(Arc::new(Panicking));
    collection.add_listener(after.clone());

    collection.add(TypeTag::Int32).unwrap();
    collection.add(TypeTag::Int32).unwrap();
    collection.remove_at(0).unwrap();

    assert_eq!(collection.len(), 1);
    assert_eq!(before.calls.load(Ordering::SeqCst), 2);
    assert_eq!(after.calls.load(Ordering::SeqCst), 2);
    assert!(collection.needs_flush());
}

#[test]
fn test_remove_listener() {
    let observer = Arc::new(Observer::default());
    let handle: Arc<dyn StructListener> = observer.clone();
    let mut collection = ElementStruct::new(session());
    collection.add_listener(handle.clone());

    collection.add(TypeTag::Int32).unwrap();
    assert!(collection.remove_listener(&handle));
    assert!(!collection.remove_listener(&handle));
    collection.add(TypeTag::Int32).unwrap();

    assert_eq!(observer.calls.load(Ordering::SeqCst), 1);
}
