//! Constants used throughout the syncstruct library.
//!
//! Central definitions for persisted key names and wire-level sentinels.

/// Key of the type descriptor in a tree-persistence node.
pub const TYPE_KEY: &str = "Type";

/// Key of the saved member value in a tree-persistence node.
pub const VALUE_KEY: &str = "Value";

/// Identity offset written by a delta batch that carries no additions.
pub const NO_ADDITIONS_OFFSET: u64 = u64::MAX;

/// Idle buffers each scratch pool keeps by default.
pub const DEFAULT_POOL_RETENTION: usize = 16;

/// Highest replica number whose network identities stay clear of the local range.
pub const MAX_REPLICA: u16 = 0x7FFF;
