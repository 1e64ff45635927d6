//! Reference identifier type used throughout syncstruct.
//!
//! A `RefId` is a session-wide unique 64-bit identity. Network identities
//! carry the issuing replica in bits 48..63 so independently allocating
//! replicas never collide; local identities set the top bit and never leave
//! the replica that issued them.

use serde::{Deserialize, Serialize};

/// Bit marking an identity from the local (never replicated) range.
pub const LOCAL_BIT: u64 = 1 << 63;

/// Shift of the replica number inside a network identity.
pub const REPLICA_SHIFT: u32 = 48;

/// Mask of the per-replica counter inside a network identity.
pub const COUNTER_MASK: u64 = (1 << REPLICA_SHIFT) - 1;

/// A globally unique reference identifier for a synchronized member.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RefId(u64);

impl RefId {
    /// The null identity. Never issued by an allocator.
    pub const NULL: RefId = RefId(0);

    /// The largest representable identity.
    pub const MAX: RefId = RefId(u64::MAX);

    /// Wraps a raw identity.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Builds the network identity `counter` of `replica`.
    pub const fn network(replica: u16, counter: u64) -> Self {
        Self(((replica as u64) << REPLICA_SHIFT) | (counter & COUNTER_MASK))
    }

    /// Builds the local identity `counter`.
    pub const fn local(counter: u64) -> Self {
        Self(LOCAL_BIT | counter)
    }

    /// Returns the raw 64-bit value.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns true for [`RefId::NULL`].
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Returns true if this identity comes from the local range.
    pub const fn is_local(self) -> bool {
        self.0 & LOCAL_BIT != 0
    }

    /// The replica that issued this network identity.
    pub const fn replica(self) -> u16 {
        ((self.0 & !LOCAL_BIT) >> REPLICA_SHIFT) as u16
    }

    /// The per-replica (or local) counter part of this identity.
    pub const fn counter(self) -> u64 {
        self.0 & COUNTER_MASK
    }

    /// The identity `n` slots after this one, if representable.
    pub fn checked_add(self, n: u64) -> Option<RefId> {
        self.0.checked_add(n).map(RefId)
    }
}

impl From<u64> for RefId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<RefId> for u64 {
    fn from(id: RefId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RefId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ID{:X}", self.0)
    }
}
