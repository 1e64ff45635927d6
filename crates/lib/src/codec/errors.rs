//! Error types for the binary codecs.
//!
//! Every failure to read a delta batch, a full snapshot or an encoded type
//! surfaces as a [`CodecError`]. Decoding validates a whole batch before any
//! mutation is applied, so a `CodecError` always leaves the target collection
//! in its previous state.

use thiserror::Error;

use crate::reference::RefId;

/// Structured error types for the binary wire formats.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CodecError {
    /// The stream ended before a complete value could be read
    #[error("Unexpected end of stream: needed {needed} more byte(s) at offset {offset}")]
    UnexpectedEof { offset: usize, needed: usize },

    /// A variable-length integer did not terminate within 10 bytes
    #[error("Varint overflow at offset {offset}")]
    VarintOverflow { offset: usize },

    /// A decoded integer does not fit the target width
    #[error("Value {value} does not fit in {target}")]
    ValueOutOfRange { value: u64, target: &'static str },

    /// A delta record carried a tag byte that is not part of the protocol
    #[error("Unknown delta tag: {tag:#04x}")]
    UnknownTag { tag: u8 },

    /// An encoded type descriptor carried an unknown kind byte
    #[error("Unknown type kind: {kind:#04x}")]
    UnknownType { kind: u8 },

    /// An encoded type nested deeper than the decoder accepts
    #[error("Type nesting exceeds {limit} levels")]
    NestingTooDeep { limit: usize },

    /// A string payload was not valid UTF-8
    #[error("Invalid UTF-8 in {context}")]
    InvalidUtf8 { context: &'static str },

    /// A snapshot referenced a type table slot that does not exist
    #[error("Type index {index} out of range for table of {table_len} type(s)")]
    TypeIndexOutOfRange { index: u64, table_len: usize },

    /// Two sequences of a snapshot that must line up had different lengths
    #[error("Snapshot length mismatch: {types} type indices, {ids} identities")]
    LengthMismatch { types: usize, ids: usize },

    /// A delta record addressed a position outside the collection it replays into
    #[error("Delta record {record} addresses position {position} of a {len}-element collection")]
    PositionOutOfRange {
        record: usize,
        position: u64,
        len: usize,
    },

    /// An identity could not be reconstructed from the batch offset
    #[error("Identity overflow: offset {offset} + relative {relative}")]
    IdentityOverflow { offset: u64, relative: u64 },

    /// A stream would give a second element an identity that is already live
    #[error("Duplicate identity {id}")]
    DuplicateIdentity { id: RefId },
}

impl CodecError {
    /// Check if this error was caused by a truncated stream
    pub fn is_truncated(&self) -> bool {
        matches!(self, CodecError::UnexpectedEof { .. })
    }

    /// Check if this error was caused by an unknown tag or type kind
    pub fn is_unknown_tag(&self) -> bool {
        matches!(
            self,
            CodecError::UnknownTag { .. } | CodecError::UnknownType { .. }
        )
    }

    /// Check if this error reports a batch that is well formed but does not
    /// fit the collection it is replayed into
    pub fn is_inconsistent(&self) -> bool {
        matches!(
            self,
            CodecError::TypeIndexOutOfRange { .. }
                | CodecError::LengthMismatch { .. }
                | CodecError::PositionOutOfRange { .. }
                | CodecError::IdentityOverflow { .. }
                | CodecError::DuplicateIdentity { .. }
        )
    }

    /// Check if this error reports an identity collision
    pub fn is_duplicate_identity(&self) -> bool {
        matches!(self, CodecError::DuplicateIdentity { .. })
    }
}

// Conversion from CodecError to the main Error type
impl From<CodecError> for crate::Error {
    fn from(err: CodecError) -> Self {
        crate::Error::Codec(err)
    }
}
