//! The replicated heterogeneous ordered collection.
//!
//! An [`ElementStruct`] holds an ordered sequence of independently
//! synchronized members, each constructed for a runtime [`TypeTag`]. Local
//! mutations record [`DeltaRecord`]s in a pending buffer that a flush encodes
//! into a compact delta batch; a remote replica replays the batch with
//! recording disabled and converges on the same sequence of types and
//! identities.
//!
//! ## Encodings
//!
//! - **Delta batch** ([`ElementStruct::encode_delta`] / [`ElementStruct::decode_delta`]):
//!   the mutations since the last flush. A creation removed again before the
//!   flush costs nothing on the wire.
//! - **Full snapshot** ([`ElementStruct::encode_full`] / [`ElementStruct::decode_full`]):
//!   type table, per-element type indices and identities. Decoding
//!   resurrects soft-deleted elements from the recycle bin where the
//!   confirmation tick allows it.
//! - **Tree persistence** ([`ElementStruct::save`] / [`ElementStruct::load`]):
//!   a `[{ "Type": ..., "Value": ... }]` list for save files.
//!
//! ## Example
//!
//! ```
//! use syncstruct::{ByteReader, ByteWriter, ElementStruct, Session, SessionConfig, TypeTag};
//!
//! let mut local = ElementStruct::new(Session::new(SessionConfig::default()).unwrap());
//! local.add(TypeTag::Int32).unwrap();
//! local.add(TypeTag::String).unwrap();
//!
//! let mut writer = ByteWriter::new();
//! local.flush_delta(&mut writer);
//!
//! let mut remote = ElementStruct::new(Session::new(SessionConfig::for_replica(1)).unwrap());
//! remote.decode_delta(&mut ByteReader::new(writer.as_slice())).unwrap();
//! assert_eq!(remote.types().cloned().collect::<Vec<_>>(), vec![TypeTag::Int32, TypeTag::String]);
//! assert_eq!(remote.ids().collect::<Vec<_>>(), local.ids().collect::<Vec<_>>());
//! ```

mod delta;
pub mod errors;
mod events;
mod list;
mod movement;
mod persist;
mod snapshot;


use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use delta::{DeltaRecord, HAS_ID, HAS_INDEX};
pub use errors::StructError;
pub use events::StructListener;
pub use list::{ElementList, LayoutSource};

use crate::Result;
use crate::member::SyncMember;
use crate::pool::Pooled;
use crate::reference::{AllocationMode, RefId};
use crate::session::Session;
use crate::types::TypeTag;
use events::{ElementEvent, Listeners};

/// Per-collection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructConfig {
    /// Record delta history for local mutations.
    pub sync_enabled: bool,
    /// The collection lives only on this replica; fresh identities come from
    /// the local range.
    pub local: bool,
}

impl Default for StructConfig {
    fn default() -> Self {
        Self {
            sync_enabled: true,
            local: false,
        }
    }
}

/// One slot of the collection.
#[derive(Debug)]
struct ElementRecord {
    member: Box<dyn SyncMember>,
    ty: TypeTag,
    /// An Add/Insert for this element is still in the pending buffer.
    dirty: bool,
    /// Position of that record in the pending buffer.
    delta_index: usize,
}

/// An ordered, runtime-typed collection of synchronized members.
pub struct ElementStruct {
    session: Arc<Session>,
    config: StructConfig,
    elements: Vec<ElementRecord>,
    pending: Option<Pooled<DeltaRecord>>,
    needs_flush: bool,
    initializing: bool,
    listeners: Listeners,
}

impl std::fmt::Debug for ElementStruct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementStruct")
            .field("config", &self.config)
            .field("elements", &self.elements)
            .field("pending", &self.pending_records())
            .field("needs_flush", &self.needs_flush)
            .field("initializing", &self.initializing)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ElementStruct {
    /// Creates an empty, synchronized collection.
    pub fn new(session: Arc<Session>) -> Self {
        Self::with_config(session, StructConfig::default())
    }

    pub fn with_config(session: Arc<Session>, config: StructConfig) -> Self {
        Self {
            session,
            config,
            elements: Vec::new(),
            pending: None,
            needs_flush: false,
            initializing: false,
            listeners: Listeners::default(),
        }
    }

    /// Creates a collection in its initialization phase: inserts record no
    /// history and removals are rejected until [`end_init_phase`](Self::end_init_phase).
    pub fn initializing(session: Arc<Session>, config: StructConfig) -> Self {
        let mut this = Self::with_config(session, config);
        this.initializing = true;
        this
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn config(&self) -> &StructConfig {
        &self.config
    }

    pub fn is_initializing(&self) -> bool {
        self.initializing
    }

    /// Leaves the initialization phase.
    pub fn end_init_phase(&mut self) {
        self.initializing = false;
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Option<&dyn SyncMember> {
        self.elements.get(index).map(|r| &*r.member)
    }

    /// Mutable element at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn SyncMember + 'static)> {
        self.elements.get_mut(index).map(|r| &mut *r.member)
    }

    /// Declared type of the element at `index`.
    pub fn element_type(&self, index: usize) -> Option<&TypeTag> {
        self.elements.get(index).map(|r| &r.ty)
    }

    /// Whether the element at `index` has an unflushed Add/Insert.
    pub fn is_dirty(&self, index: usize) -> Option<bool> {
        self.elements.get(index).map(|r| r.dirty)
    }

    /// Position of the element with identity `id`.
    pub fn index_of(&self, id: RefId) -> Option<usize> {
        self.elements.iter().position(|r| r.member.id() == id)
    }

    pub fn contains(&self, id: RefId) -> bool {
        self.index_of(id).is_some()
    }

    /// Elements in order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn SyncMember> + '_ {
        self.elements.iter().map(|r| &*r.member)
    }

    /// Declared types in order.
    pub fn types(&self) -> impl Iterator<Item = &TypeTag> + '_ {
        self.elements.iter().map(|r| &r.ty)
    }

    /// Identities in order.
    pub fn ids(&self) -> impl Iterator<Item = RefId> + '_ {
        self.elements.iter().map(|r| r.member.id())
    }

    /// Display name of a live element: `"[index]"`.
    pub fn member_name(&self, id: RefId) -> Option<String> {
        self.index_of(id).map(|index| format!("[{index}]"))
    }

    /// Whether history was recorded since the last [`clear_dirty`](Self::clear_dirty).
    pub fn needs_flush(&self) -> bool {
        self.needs_flush
    }

    /// The pending delta buffer, tombstones included.
    pub fn pending_records(&self) -> &[DeltaRecord] {
        self.pending.as_deref().map(Vec::as_slice).unwrap_or_default()
    }

    /// Registers a change listener.
    pub fn add_listener(&mut self, listener: Arc<dyn StructListener>) {
        self.listeners.add(listener);
    }

    /// Unregisters `listener`. Returns false if it was not registered.
    pub fn remove_listener(&mut self, listener: &Arc<dyn StructListener>) -> bool {
        self.listeners.remove(listener)
    }

    /// Inserts a new element of type `ty` at `index`, shifting later
    /// elements up.
    pub fn insert(&mut self, index: usize, ty: TypeTag) -> Result<&mut (dyn SyncMember + 'static)> {
        if index > self.elements.len() {
            return Err(StructError::IndexOutOfRange {
                operation: "insert",
                index,
                len: self.elements.len(),
            }
            .into());
        }
        self.insert_internal(index, ty, None, true, true)?;
        Ok(&mut *self.elements[index].member)
    }

    /// Appends a new element of type `ty`.
    pub fn add(&mut self, ty: TypeTag) -> Result<&mut (dyn SyncMember + 'static)> {
        self.insert(self.elements.len(), ty)
    }

    /// Removes the element at `index`, shifting later elements down.
    pub fn remove_at(&mut self, index: usize) -> Result<()> {
        self.remove_internal(index, true, true)
    }

    /// The element with identity `id`.
    pub fn find(&self, id: RefId) -> Result<&dyn SyncMember> {
        self.index_of(id)
            .map(|index| &*self.elements[index].member)
            .ok_or_else(|| StructError::ElementNotFound { id }.into())
    }

    /// Removes the element with identity `id`. Returns false if there is none.
    pub fn remove(&mut self, id: RefId) -> Result<bool> {
        match self.index_of(id) {
            Some(index) => {
                self.remove_at(index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes every element. A recorded clear supersedes all pending history.
    pub fn clear(&mut self) {
        self.clear_internal(true, true, false);
    }

    /// Reshapes the collection to the type sequence `expected`.
    ///
    /// Mismatched slots are replaced in place, missing trailing slots are
    /// appended and surplus trailing slots removed.
    pub fn ensure_typed_layout(&mut self, expected: &[TypeTag]) -> Result<()> {
        for (index, ty) in expected.iter().enumerate() {
            match self.elements.get(index) {
                None => {
                    self.add(ty.clone())?;
                }
                Some(record) if record.ty == *ty => {}
                Some(_) => {
                    self.remove_at(index)?;
                    self.insert(index, ty.clone())?;
                }
            }
        }
        while self.elements.len() > expected.len() {
            self.remove_at(self.elements.len() - 1)?;
        }
        Ok(())
    }

    /// Confirms a flush: clears every dirty flag and releases the pending
    /// buffer.
    pub fn clear_dirty(&mut self) {
        for record in &mut self.elements {
            record.dirty = false;
        }
        self.pending = None;
        self.needs_flush = false;
    }

    /// Replaces the contents with copies of `source`'s elements.
    ///
    /// Copies get fresh identities; values are copied member by member.
    pub fn copy_from(&mut self, source: &ElementStruct) -> Result<()> {
        self.clear();
        self.elements.reserve(source.len());
        for record in &source.elements {
            let target = self.add(record.ty.clone())?;
            target.copy_values(&*record.member)?;
        }
        Ok(())
    }

    fn allocation_mode(&self) -> AllocationMode {
        if self.config.local {
            AllocationMode::Local
        } else {
            AllocationMode::Network
        }
    }

    fn records_deltas(&self, sync: bool) -> bool {
        sync && self.config.sync_enabled && !self.initializing
    }

    fn pending_mut(&mut self) -> &mut Pooled<DeltaRecord> {
        let session = &self.session;
        self.pending
            .get_or_insert_with(|| session.pools().records.borrow())
    }

    fn notify(&mut self, event: ElementEvent, start: usize, count: usize) {
        if self.listeners.is_empty() {
            return;
        }
        let listeners = std::mem::take(&mut self.listeners);
        listeners.dispatch(event, self, start, count);
        self.listeners = listeners;
    }

    /// Destroys `member`, or hands it to the recycle bin when it may still be
    /// resurrected.
    fn release(&self, mut member: Box<dyn SyncMember>, trash: bool) {
        if trash {
            self.session.trash(member);
        } else {
            member.dispose();
        }
    }

    /// Constructs and inserts an element. `reserved` replays a remote identity.
    fn insert_internal(
        &mut self,
        index: usize,
        ty: TypeTag,
        reserved: Option<RefId>,
        sync: bool,
        notify: bool,
    ) -> Result<()> {
        let member = self
            .session
            .construct(&ty, reserved, self.allocation_mode())?;
        self.insert_member(index, member, ty, sync, notify);
        Ok(())
    }

    fn insert_member(
        &mut self,
        index: usize,
        member: Box<dyn SyncMember>,
        ty: TypeTag,
        sync: bool,
        notify: bool,
    ) {
        let id = member.id();
        let mut record = ElementRecord {
            member,
            ty,
            dirty: false,
            delta_index: 0,
        };
        if self.records_deltas(sync) {
            let delta = if index == self.elements.len() {
                DeltaRecord::Add {
                    ty: record.ty.clone(),
                    id,
                    position: index,
                }
            } else {
                DeltaRecord::Insert {
                    ty: record.ty.clone(),
                    id,
                    position: index,
                }
            };
            let pending = self.pending_mut();
            record.dirty = true;
            record.delta_index = pending.len();
            pending.push(delta);
            self.needs_flush = true;
        }
        self.elements.insert(index, record);
        tracing::trace!(index, id = %id, "inserted element");
        if notify {
            self.notify(ElementEvent::Added, index, 1);
        }
    }

    fn remove_internal(&mut self, index: usize, sync: bool, notify: bool) -> Result<()> {
        if self.initializing {
            return Err(StructError::RemoveDuringInit.into());
        }
        if index >= self.elements.len() {
            return Err(StructError::IndexOutOfRange {
                operation: "remove_at",
                index,
                len: self.elements.len(),
            }
            .into());
        }
        if notify {
            self.notify(ElementEvent::Removing, index, 1);
        }
        let record = self.elements.remove(index);
        let mut trash = false;
        if self.records_deltas(sync) {
            if record.dirty {
                // Never observed remotely: rewrite history instead
                self.compact(record.delta_index);
            } else {
                self.pending_mut()
                    .push(DeltaRecord::Remove { position: index });
                trash = true;
            }
            self.needs_flush = true;
        }
        tracing::trace!(index, id = %record.member.id(), trash, "removed element");
        if notify {
            self.notify(ElementEvent::Removed, index, 1);
        }
        self.release(record.member, trash);
        Ok(())
    }

    fn clear_internal(&mut self, sync: bool, notify: bool, force_trash: bool) {
        if self.elements.is_empty() {
            return;
        }
        let count = self.elements.len();
        if notify {
            self.notify(ElementEvent::Removing, 0, count);
        }
        let records = std::mem::take(&mut self.elements);
        let recording = self.records_deltas(sync);
        if recording {
            let pending = self.pending_mut();
            pending.clear();
            pending.push(DeltaRecord::Clear);
            self.needs_flush = true;
        }
        let trash = recording || force_trash;
        for record in records {
            self.release(record.member, trash);
        }
        tracing::debug!(count, trash, "cleared collection");
        if notify {
            self.notify(ElementEvent::Removed, 0, count);
        }
    }

    /// Elides the unflushed Add/Insert at `delta_index` whose element was just
    /// removed, shifting the positions of later records to match the shorter
    /// sequence.
    fn compact(&mut self, delta_index: usize) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        let mut tracked = match pending.get(delta_index) {
            Some(DeltaRecord::Add { position, .. } | DeltaRecord::Insert { position, .. }) => {
                *position
            }
            _ => return,
        };
        for delta in pending.iter_mut().skip(delta_index + 1) {
            match delta {
                DeltaRecord::Add { position, .. } | DeltaRecord::Insert { position, .. } => {
                    if *position <= tracked {
                        tracked += 1;
                    } else {
                        *position -= 1;
                    }
                }
                DeltaRecord::Remove { position } => {
                    if *position <= tracked {
                        tracked = tracked.saturating_sub(1);
                    } else {
                        *position -= 1;
                    }
                }
                DeltaRecord::Empty | DeltaRecord::Clear => {}
            }
        }
        pending[delta_index] = DeltaRecord::Empty;
        tracing::debug!(delta_index, "compacted pending delta");
    }
}

impl Drop for ElementStruct {
    fn drop(&mut self) {
        for mut record in self.elements.drain(..) {
            record.member.dispose();
        }
        self.listeners.clear();
    }
}
