//! Binary encoding of [`TypeTag`]s.

use super::{FieldDecl, TypeTag};
use crate::codec::{ByteReader, ByteWriter, CodecError};

/// Encodes and decodes runtime type descriptors on the wire.
pub trait TypeCodec: Send + Sync {
    fn encode_type(&self, writer: &mut ByteWriter, ty: &TypeTag);

    fn decode_type(&self, reader: &mut ByteReader<'_>) -> Result<TypeTag, CodecError>;
}

const KIND_BOOL: u8 = 1;
const KIND_INT32: u8 = 2;
const KIND_INT64: u8 = 3;
const KIND_FLOAT32: u8 = 4;
const KIND_FLOAT64: u8 = 5;
const KIND_STRING: u8 = 6;
const KIND_REF: u8 = 7;
const KIND_RECORD: u8 = 8;
const KIND_CUSTOM: u8 = 9;

/// Nesting limit for decoded types, so hostile input cannot recurse without bound.
const MAX_DEPTH: usize = 32;

/// Structural type encoding: a kind byte followed by kind-specific payload.
///
/// - `Ref` is followed by its target type
/// - `Record` by its name, field count, then name and type of every field
/// - `Custom` by its name
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryTypeCodec;

impl BinaryTypeCodec {
    fn decode_depth(reader: &mut ByteReader<'_>, depth: usize) -> Result<TypeTag, CodecError> {
        let offset = reader.position();
        if depth > MAX_DEPTH {
            return Err(CodecError::NestingTooDeep { limit: MAX_DEPTH });
        }
        let kind = reader.read_u8()?;
        let ty = match kind {
            KIND_BOOL => TypeTag::Bool,
            KIND_INT32 => TypeTag::Int32,
            KIND_INT64 => TypeTag::Int64,
            KIND_FLOAT32 => TypeTag::Float32,
            KIND_FLOAT64 => TypeTag::Float64,
            KIND_STRING => TypeTag::String,
            KIND_REF => TypeTag::Ref(Box::new(Self::decode_depth(reader, depth + 1)?)),
            KIND_RECORD => {
                let name = reader.read_str("record name")?;
                let count = reader.read_len()?;
                if count > reader.remaining() {
                    return Err(CodecError::UnexpectedEof {
                        offset: reader.position(),
                        needed: count - reader.remaining(),
                    });
                }
                let mut fields = Vec::with_capacity(count);
                for _ in 0..count {
                    let field_name = reader.read_str("field name")?;
                    let field_ty = Self::decode_depth(reader, depth + 1)?;
                    fields.push(FieldDecl::new(field_name, field_ty));
                }
                TypeTag::Record { name, fields }
            }
            KIND_CUSTOM => TypeTag::Custom(reader.read_str("custom type name")?),
            kind => {
                tracing::debug!(kind, offset, "unknown type kind");
                return Err(CodecError::UnknownType { kind });
            }
        };
        Ok(ty)
    }
}

impl TypeCodec for BinaryTypeCodec {
    fn encode_type(&self, writer: &mut ByteWriter, ty: &TypeTag) {
        match ty {
            TypeTag::Bool => writer.write_u8(KIND_BOOL),
            TypeTag::Int32 => writer.write_u8(KIND_INT32),
            TypeTag::Int64 => writer.write_u8(KIND_INT64),
            TypeTag::Float32 => writer.write_u8(KIND_FLOAT32),
            TypeTag::Float64 => writer.write_u8(KIND_FLOAT64),
            TypeTag::String => writer.write_u8(KIND_STRING),
            TypeTag::Ref(target) => {
                writer.write_u8(KIND_REF);
                self.encode_type(writer, target);
            }
            TypeTag::Record { name, fields } => {
                writer.write_u8(KIND_RECORD);
                writer.write_str(name);
                writer.write_varint(fields.len() as u64);
                for field in fields {
                    writer.write_str(&field.name);
                    self.encode_type(writer, &field.ty);
                }
            }
            TypeTag::Custom(name) => {
                writer.write_u8(KIND_CUSTOM);
                writer.write_str(name);
            }
        }
    }

    fn decode_type(&self, reader: &mut ByteReader<'_>) -> Result<TypeTag, CodecError> {
        Self::decode_depth(reader, 0)
    }
}
