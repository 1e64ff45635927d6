//! Full snapshot encoding.
//!
//! Layout: type count, the distinct types in first-occurrence order, then the
//! per-element type indices and the per-element identities, both as
//! delta-coded sequences. An empty collection is the single byte `0`.

use std::collections::HashSet;

use super::ElementStruct;
use super::events::ElementEvent;
use crate::Result;
use crate::codec::{ByteReader, ByteWriter, CodecError};
use crate::reference::RefId;
use crate::session::InboundContext;

impl ElementStruct {
    /// Writes the full state.
    pub fn encode_full(&self, writer: &mut ByteWriter) {
        if self.elements.is_empty() {
            writer.write_u8(0);
            return;
        }
        let pools = self.session.pools();
        let mut table = pools.types.borrow();
        let mut indices = pools.words.borrow();
        for record in &self.elements {
            let index = match table.iter().position(|ty| *ty == record.ty) {
                Some(index) => index,
                None => {
                    table.push(record.ty.clone());
                    table.len() - 1
                }
            };
            indices.push(index as u64);
        }

        writer.write_varint(table.len() as u64);
        let types = self.session.type_codec();
        for ty in table.iter() {
            types.encode_type(writer, ty);
        }
        writer.write_delta_sequence(&indices);

        let mut ids = pools.words.borrow();
        ids.extend(self.elements.iter().map(|r| r.member.id().raw()));
        writer.write_delta_sequence(&ids);
    }

    /// Replaces the state with a remote snapshot.
    ///
    /// The snapshot is read and validated completely first. The current
    /// elements then go to the recycle bin, and every snapshot element whose
    /// identity can be retrieved there for the confirmation tick (see
    /// [`Session::confirmation_tick`](crate::Session::confirmation_tick)) is
    /// resurrected instead of constructed. Pending history is discarded. One
    /// aggregated added notification covers the new contents.
    pub fn decode_full(
        &mut self,
        reader: &mut ByteReader<'_>,
        inbound: &InboundContext,
    ) -> Result<()> {
        let session = self.session.clone();
        let pools = session.pools();
        let mut table = pools.types.borrow();
        let mut indices = pools.words.borrow();
        let mut ids = pools.words.borrow();

        let type_count = reader.read_len()?;
        if type_count > 0 {
            if type_count > reader.remaining() {
                return Err(CodecError::UnexpectedEof {
                    offset: reader.position(),
                    needed: type_count - reader.remaining(),
                }
                .into());
            }
            for _ in 0..type_count {
                table.push(session.type_codec().decode_type(reader)?);
            }
            reader.read_delta_sequence(&mut indices)?;
            reader.read_delta_sequence(&mut ids)?;
            if indices.len() != ids.len() {
                return Err(CodecError::LengthMismatch {
                    types: indices.len(),
                    ids: ids.len(),
                }
                .into());
            }
            if let Some(&index) = indices.iter().find(|&&i| i >= table.len() as u64) {
                return Err(CodecError::TypeIndexOutOfRange {
                    index,
                    table_len: table.len(),
                }
                .into());
            }
            let mut seen = HashSet::with_capacity(ids.len());
            if let Some(&raw) = ids.iter().find(|&&raw| !seen.insert(raw)) {
                return Err(CodecError::DuplicateIdentity {
                    id: RefId::new(raw),
                }
                .into());
            }
            for ty in table.iter() {
                session.members().resolve(ty)?;
            }
        }

        self.clear_internal(false, true, true);
        self.pending = None;
        self.needs_flush = false;

        let tick = session.confirmation_tick(inbound);
        let mode = self.allocation_mode();
        let mut resurrected = 0usize;
        for (&index, &raw) in indices.iter().zip(ids.iter()) {
            let ty = &table[index as usize];
            let id = RefId::new(raw);
            let retrieved = tick.and_then(|tick| session.recycle_bin().try_retrieve(tick, id));
            let member = match retrieved {
                Some(member) if member.element_type() == ty => {
                    resurrected += 1;
                    member
                }
                Some(mut stale) => {
                    tracing::warn!(
                        id = %id,
                        expected = %ty,
                        actual = %stale.element_type(),
                        "Resurrected element has a different type; constructing a fresh one"
                    );
                    stale.dispose();
                    session.construct(ty, Some(id), mode)?
                }
                None => session.construct(ty, Some(id), mode)?,
            };
            let position = self.elements.len();
            self.insert_member(position, member, ty.clone(), false, false);
        }

        let count = self.elements.len();
        if count > 0 {
            self.notify(ElementEvent::Added, 0, count);
        }
        tracing::debug!(elements = count, resurrected, tick = ?tick, "decoded full snapshot");
        Ok(())
    }
}
