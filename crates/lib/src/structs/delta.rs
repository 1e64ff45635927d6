//! Delta batch encoding.
//!
//! A batch is `count, offset` followed by `count` records. Each record is one
//! tag byte; bit `0x20` means a type and an identity relative to `offset`
//! follow, bit `0x10` that a position follows. `offset` is the smallest
//! identity added in the batch, so relative identities of a burst of
//! consecutive allocations stay one byte each.
//!
//! | record | tag    | payload                      |
//! |--------|--------|------------------------------|
//! | Empty  | `0x00` | never written                |
//! | Add    | `0x21` | type, identity               |
//! | Insert | `0x32` | type, identity, position     |
//! | Remove | `0x13` | position                     |
//! | Clear  | `0x04` |                              |

use std::collections::HashSet;

use super::ElementStruct;
use crate::Result;
use crate::codec::{ByteReader, ByteWriter, CodecError};
use crate::constants::NO_ADDITIONS_OFFSET;
use crate::reference::RefId;
use crate::types::{TypeCodec, TypeTag};

/// Tag bit: a position follows.
pub const HAS_INDEX: u8 = 0x10;
/// Tag bit: a type and relative identity follow.
pub const HAS_ID: u8 = 0x20;

const TAG_EMPTY: u8 = 0x00;
const TAG_ADD: u8 = HAS_ID | 0x01;
const TAG_INSERT: u8 = HAS_ID | HAS_INDEX | 0x02;
const TAG_REMOVE: u8 = HAS_INDEX | 0x03;
const TAG_CLEAR: u8 = 0x04;

/// One pending structural change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaRecord {
    /// Elided by compaction; skipped when encoding.
    Empty,
    /// Append. `position` is the length at the time and is not encoded.
    Add {
        ty: TypeTag,
        id: RefId,
        position: usize,
    },
    Insert {
        ty: TypeTag,
        id: RefId,
        position: usize,
    },
    Remove {
        position: usize,
    },
    Clear,
}

impl DeltaRecord {
    /// The wire tag of this record.
    pub fn tag(&self) -> u8 {
        match self {
            DeltaRecord::Empty => TAG_EMPTY,
            DeltaRecord::Add { .. } => TAG_ADD,
            DeltaRecord::Insert { .. } => TAG_INSERT,
            DeltaRecord::Remove { .. } => TAG_REMOVE,
            DeltaRecord::Clear => TAG_CLEAR,
        }
    }

    /// Whether this record creates an element.
    pub fn is_addition(&self) -> bool {
        self.tag() & HAS_ID != 0
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, DeltaRecord::Empty)
    }

    /// Identity created by an `Add` or `Insert`.
    pub fn addition_id(&self) -> Option<RefId> {
        match self {
            DeltaRecord::Add { id, .. } | DeltaRecord::Insert { id, .. } => Some(*id),
            _ => None,
        }
    }

    fn encode(&self, writer: &mut ByteWriter, offset: u64, types: &dyn TypeCodec) {
        writer.write_u8(self.tag());
        match self {
            DeltaRecord::Add { ty, id, .. } => {
                types.encode_type(writer, ty);
                writer.write_varint(id.raw() - offset);
            }
            DeltaRecord::Insert { ty, id, position } => {
                types.encode_type(writer, ty);
                writer.write_varint(id.raw() - offset);
                writer.write_varint(*position as u64);
            }
            DeltaRecord::Remove { position } => writer.write_varint(*position as u64),
            DeltaRecord::Empty | DeltaRecord::Clear => {}
        }
    }

    /// Reads one record. `Add` positions are left at zero for the caller to
    /// fill in.
    fn decode(
        reader: &mut ByteReader<'_>,
        offset: u64,
        types: &dyn TypeCodec,
    ) -> std::result::Result<Self, CodecError> {
        let tag = reader.read_u8()?;
        let record = match tag {
            TAG_EMPTY => DeltaRecord::Empty,
            TAG_ADD => {
                let (ty, id) = read_addition(reader, offset, types)?;
                DeltaRecord::Add {
                    ty,
                    id,
                    position: 0,
                }
            }
            TAG_INSERT => {
                let (ty, id) = read_addition(reader, offset, types)?;
                let position = reader.read_len()?;
                DeltaRecord::Insert { ty, id, position }
            }
            TAG_REMOVE => DeltaRecord::Remove {
                position: reader.read_len()?,
            },
            TAG_CLEAR => DeltaRecord::Clear,
            tag => return Err(CodecError::UnknownTag { tag }),
        };
        Ok(record)
    }
}

impl ElementStruct {
    /// Writes the pending history as a delta batch.
    pub fn encode_delta(&self, writer: &mut ByteWriter) {
        let records = self.pending_records();
        let count = records.iter().filter(|r| !r.is_tombstone()).count();
        let offset = records
            .iter()
            .filter_map(DeltaRecord::addition_id)
            .map(RefId::raw)
            .min()
            .unwrap_or(NO_ADDITIONS_OFFSET);

        writer.write_varint(count as u64);
        writer.write_varint(offset);
        let types = self.session.type_codec();
        for record in records.iter().filter(|r| !r.is_tombstone()) {
            record.encode(writer, offset, types);
        }
        tracing::debug!(entries = count, offset, "encoded delta batch");
    }

    /// Encodes the pending history and confirms it.
    pub fn flush_delta(&mut self, writer: &mut ByteWriter) {
        self.encode_delta(writer);
        self.clear_dirty();
    }

    /// Replays a remote delta batch without recording history.
    ///
    /// The whole batch is read and checked against the current length and
    /// identities before any element changes; on error the collection is
    /// untouched.
    pub fn decode_delta(&mut self, reader: &mut ByteReader<'_>) -> Result<()> {
        let session = self.session.clone();
        let count = reader.read_len()?;
        let offset = reader.read_varint()?;
        // Every record takes at least its tag byte
        if count > reader.remaining() {
            return Err(CodecError::UnexpectedEof {
                offset: reader.position(),
                needed: count - reader.remaining(),
            }
            .into());
        }

        let mut batch = session.pools().records.borrow();
        let mut live = LiveIds::new(self.ids());
        for index in 0..count {
            let record = DeltaRecord::decode(reader, offset, session.type_codec())?;
            let len = live.len();
            let record = match record {
                DeltaRecord::Empty => continue,
                DeltaRecord::Add { ty, id, .. } => {
                    session.members().resolve(&ty)?;
                    live.insert(len, id)?;
                    DeltaRecord::Add {
                        ty,
                        id,
                        position: len,
                    }
                }
                DeltaRecord::Insert { ty, id, position } => {
                    if position > len {
                        return Err(out_of_range(index, position, len));
                    }
                    session.members().resolve(&ty)?;
                    live.insert(position, id)?;
                    DeltaRecord::Insert { ty, id, position }
                }
                DeltaRecord::Remove { position } => {
                    if self.initializing {
                        return Err(super::StructError::RemoveDuringInit.into());
                    }
                    if position >= len {
                        return Err(out_of_range(index, position, len));
                    }
                    live.remove(position);
                    DeltaRecord::Remove { position }
                }
                DeltaRecord::Clear => {
                    live.clear();
                    DeltaRecord::Clear
                }
            };
            batch.push(record);
        }
        let len = live.len();

        for record in batch.drain(..) {
            match record {
                DeltaRecord::Add { ty, id, position } | DeltaRecord::Insert { ty, id, position } => {
                    self.insert_internal(position, ty, Some(id), false, true)?;
                }
                DeltaRecord::Remove { position } => self.remove_internal(position, false, true)?,
                DeltaRecord::Clear => self.clear_internal(false, true, false),
                DeltaRecord::Empty => {}
            }
        }
        tracing::debug!(entries = count, offset, len, "decoded delta batch");
        Ok(())
    }
}

/// Identities of the collection as a batch under validation would leave it.
struct LiveIds {
    order: Vec<RefId>,
    set: HashSet<RefId>,
}

impl LiveIds {
    fn new(ids: impl Iterator<Item = RefId>) -> Self {
        let order: Vec<RefId> = ids.collect();
        let set = order.iter().copied().collect();
        Self { order, set }
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn insert(&mut self, position: usize, id: RefId) -> std::result::Result<(), CodecError> {
        if !self.set.insert(id) {
            return Err(CodecError::DuplicateIdentity { id });
        }
        self.order.insert(position, id);
        Ok(())
    }

    fn remove(&mut self, position: usize) {
        let id = self.order.remove(position);
        self.set.remove(&id);
    }

    fn clear(&mut self) {
        self.order.clear();
        self.set.clear();
    }
}

fn read_addition(
    reader: &mut ByteReader<'_>,
    offset: u64,
    types: &dyn TypeCodec,
) -> std::result::Result<(TypeTag, RefId), CodecError> {
    let ty = types.decode_type(reader)?;
    let relative = reader.read_varint()?;
    let id = offset
        .checked_add(relative)
        .ok_or(CodecError::IdentityOverflow { offset, relative })?;
    Ok((ty, RefId::new(id)))
}

fn out_of_range(record: usize, position: usize, len: usize) -> crate::Error {
    CodecError::PositionOutOfRange {
        record,
        position: position as u64,
        len,
    }
    .into()
}
