//!
//! syncstruct: a replicated, heterogeneous, ordered collection.
//! This library provides a runtime-typed element sequence that converges between replicas over a compact binary delta protocol.
//!
//! ## Core Concepts
//!
//! * **Collections (`structs::ElementStruct`)**: An ordered sequence of independently synchronized members, each constructed for a runtime type. Local mutations are recorded as delta history and flushed as a compact batch.
//! * **Members (`member::SyncMember`)**: The payload of one slot. Built-in payloads are scalar fields, references and nested records; custom payloads are registered with the `member::MemberRegistry`.
//! * **Types (`types::TypeTag`)**: Runtime type descriptors, encoded on the wire by a `types::TypeCodec`.
//! * **Sessions (`session::Session`)**: The collaborators shared by the collections of one replica:
//!     * **Identity allocation (`reference::IdAllocator`)**: Globally unique reference identities, with reserved blocks for replaying remote creations.
//!     * **Recycle bin (`trash::RecycleBin`)**: Soft-deleted members, resurrectable by a later full snapshot that still lists them.
//!     * **Clock (`clock::Clock`)**: The logical sync tick ordering deletions against confirmations.
//! * **Wire formats (`codec`)**: Varints, delta-coded sequences, the delta batch and the full snapshot.

pub mod clock;
pub mod codec;
pub mod constants;
pub mod member;
pub mod pool;
pub mod reference;
pub mod session;
pub mod structs;
pub mod trash;
pub mod types;

pub use clock::{Clock, SessionClock};
pub use codec::{ByteReader, ByteWriter};
pub use member::{MemberRegistry, SyncMember};
pub use reference::RefId;
pub use session::{FallbackTick, InboundContext, Session, SessionConfig};
pub use structs::{ElementList, ElementStruct, LayoutSource, StructConfig, StructListener};
pub use types::{TypeTag, Value};

/// Result type used throughout the syncstruct library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the syncstruct library.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured wire-format errors from the codec module
    #[error(transparent)]
    Codec(codec::CodecError),

    /// Structured member errors from the member module
    #[error(transparent)]
    Member(member::MemberError),

    /// Structured collection errors from the structs module
    #[error(transparent)]
    Struct(structs::StructError),

    /// Structured session errors from the session module
    #[error(transparent)]
    Session(session::SessionError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Codec(_) => "codec",
            Error::Member(_) => "member",
            Error::Struct(_) => "structs",
            Error::Session(_) => "session",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Member(member_err) => member_err.is_not_found(),
            Error::Struct(struct_err) => struct_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error is an out-of-range index.
    pub fn is_out_of_range(&self) -> bool {
        match self {
            Error::Struct(struct_err) => struct_err.is_out_of_range(),
            _ => false,
        }
    }

    /// Check if this error rejects an operation in the collection's current phase.
    pub fn is_invalid_phase(&self) -> bool {
        match self {
            Error::Struct(struct_err) => struct_err.is_invalid_phase(),
            _ => false,
        }
    }

    /// Check if this error comes from a malformed or inconsistent stream.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Error::Codec(_))
    }

    /// Check if this error was caused by a truncated stream.
    pub fn is_truncated(&self) -> bool {
        match self {
            Error::Codec(codec_err) => codec_err.is_truncated(),
            _ => false,
        }
    }

    /// Check if this error is an unknown delta tag or type kind.
    pub fn is_unknown_tag(&self) -> bool {
        match self {
            Error::Codec(codec_err) => codec_err.is_unknown_tag(),
            _ => false,
        }
    }

    /// Check if this error reports a stream reusing a live identity.
    pub fn is_duplicate_identity(&self) -> bool {
        match self {
            Error::Codec(codec_err) => codec_err.is_duplicate_identity(),
            _ => false,
        }
    }

    /// Check if this error is type-related.
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::Member(member_err) => member_err.is_type_error(),
            _ => false,
        }
    }

    /// Check if this error reports a type without a registered factory.
    pub fn is_missing_factory(&self) -> bool {
        match self {
            Error::Member(member_err) => member_err.is_missing_factory(),
            _ => false,
        }
    }

    /// Check if this error is configuration-related.
    pub fn is_config_error(&self) -> bool {
        match self {
            Error::Session(session_err) => session_err.is_config_error(),
            _ => false,
        }
    }

    /// Check if this error is a serialization failure.
    pub fn is_serialization_error(&self) -> bool {
        matches!(self, Error::Serialize(_))
    }
}
