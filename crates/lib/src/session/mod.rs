//! The hosting session shared by every collection.
//!
//! A [`Session`] bundles the collaborators a collection needs: identity
//! allocation, member construction, the recycle bin, the sync clock, the type
//! codec, the reference table and the scratch pools. Collections hold it as
//! `Arc<Session>`.
//!
//! ```
//! use syncstruct::{FallbackTick, InboundContext, Session, SessionConfig};
//!
//! let session = Session::builder()
//!     .config(SessionConfig {
//!         replica: 2,
//!         fallback_tick: FallbackTick::Disabled,
//!         ..SessionConfig::default()
//!     })
//!     .build()
//!     .unwrap();
//! assert_eq!(session.confirmation_tick(&InboundContext::confirmed(4)), Some(4));
//! assert_eq!(session.confirmation_tick(&InboundContext::default()), None);
//! ```

pub mod config;
pub mod errors;

use std::collections::HashMap;
use std::sync::Arc;

pub use config::{FallbackTick, SessionConfig};
pub use errors::SessionError;

use crate::Result;
use crate::clock::{Clock, SessionClock};
use crate::member::{MemberContext, MemberRegistry, SyncMember};
use crate::pool::Pool;
use crate::reference::{
    AllocationMode, AllocationScope, IdAllocator, RefId, ReferenceController, ReferenceTable,
};
use crate::structs::DeltaRecord;
use crate::trash::{RecycleBin, TrashBin};
use crate::types::{BinaryTypeCodec, TypeCodec, TypeTag};

/// Context of an inbound full snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InboundContext {
    /// Tick the remote confirmed with this message, if any.
    pub confirm_tick: Option<u64>,
}

impl InboundContext {
    /// A message confirming the state at `tick`.
    pub fn confirmed(tick: u64) -> Self {
        Self {
            confirm_tick: Some(tick),
        }
    }
}

/// Scratch pools shared by all collections of a session.
#[derive(Debug)]
pub(crate) struct Pools {
    pub(crate) records: Pool<DeltaRecord>,
    pub(crate) ids: Pool<RefId>,
    pub(crate) words: Pool<u64>,
    pub(crate) types: Pool<TypeTag>,
}

impl Pools {
    fn new(retention: usize) -> Self {
        Self {
            records: Pool::new(retention),
            ids: Pool::new(retention),
            words: Pool::new(retention),
            types: Pool::new(retention),
        }
    }
}

/// Shared collaborators of the collections in one replica.
pub struct Session {
    allocator: Arc<dyn IdAllocator>,
    bin: Arc<dyn RecycleBin>,
    clock: Arc<dyn Clock>,
    types: Arc<dyn TypeCodec>,
    members: MemberRegistry,
    references: Arc<ReferenceTable>,
    pools: Pools,
    config: SessionConfig,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("members", &self.members)
            .field("references", &self.references.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Starts building a session.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// A session with default collaborators for `config`.
    pub fn new(config: SessionConfig) -> Result<Arc<Self>> {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn allocator(&self) -> &dyn IdAllocator {
        &*self.allocator
    }

    pub fn recycle_bin(&self) -> &dyn RecycleBin {
        &*self.bin
    }

    pub fn clock(&self) -> &dyn Clock {
        &*self.clock
    }

    pub fn type_codec(&self) -> &dyn TypeCodec {
        &*self.types
    }

    pub fn members(&self) -> &MemberRegistry {
        &self.members
    }

    pub fn references(&self) -> &Arc<ReferenceTable> {
        &self.references
    }

    pub(crate) fn pools(&self) -> &Pools {
        &self.pools
    }

    /// Constructs a member of type `ty` inside an allocation block.
    ///
    /// With `reserved` set, the member and its nested members take the
    /// identities starting at `reserved`; otherwise fresh identities are drawn
    /// in `mode`.
    pub fn construct(
        &self,
        ty: &TypeTag,
        reserved: Option<RefId>,
        mode: AllocationMode,
    ) -> Result<Box<dyn SyncMember>> {
        if let Some(id) = reserved {
            if self.bin.discard(id) {
                tracing::debug!(id = %id, "binned member superseded by a fresh construction");
            }
        }
        let _scope = AllocationScope::begin(&*self.allocator, reserved, mode);
        let ctx = MemberContext::new(&*self.allocator, &self.references, &self.members);
        self.members.construct(ty, &ctx)
    }

    /// Moves `member` into the recycle bin at the current tick.
    pub fn trash(&self, member: Box<dyn SyncMember>) {
        self.bin.move_to_bin(self.clock.now_tick(), member);
    }

    /// The confirmation tick a full decode resurrects against, or `None` to
    /// construct every element afresh.
    pub fn confirmation_tick(&self, inbound: &InboundContext) -> Option<u64> {
        if let Some(tick) = inbound.confirm_tick {
            return Some(tick);
        }
        match self.config.fallback_tick {
            FallbackTick::SessionTick => Some(self.clock.now_tick()),
            FallbackTick::Oldest => Some(0),
            FallbackTick::Disabled => None,
        }
    }

    /// Points every reference at a key of `replacements` to its value.
    /// Returns how many links changed.
    pub fn replace_reference_targets(&self, replacements: &HashMap<RefId, RefId>) -> usize {
        self.references.replace_targets(replacements)
    }
}

/// Builder for [`Session`], defaulting every collaborator not supplied.
#[derive(Default)]
pub struct SessionBuilder {
    config: SessionConfig,
    allocator: Option<Arc<dyn IdAllocator>>,
    bin: Option<Arc<dyn RecycleBin>>,
    clock: Option<Arc<dyn Clock>>,
    types: Option<Arc<dyn TypeCodec>>,
    members: Option<MemberRegistry>,
}

impl SessionBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Replica number for the default allocator.
    pub fn replica(mut self, replica: u16) -> Self {
        self.config.replica = replica;
        self
    }

    pub fn fallback_tick(mut self, policy: FallbackTick) -> Self {
        self.config.fallback_tick = policy;
        self
    }

    /// Use `allocator` instead of a [`ReferenceController`] for the replica.
    pub fn allocator(mut self, allocator: Arc<dyn IdAllocator>) -> Self {
        self.allocator = Some(allocator);
        self
    }

    /// Use `bin` instead of an in-memory [`TrashBin`].
    pub fn recycle_bin(mut self, bin: Arc<dyn RecycleBin>) -> Self {
        self.bin = Some(bin);
        self
    }

    /// Use `clock` instead of a [`SessionClock`] starting at tick zero.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn type_codec(mut self, types: Arc<dyn TypeCodec>) -> Self {
        self.types = Some(types);
        self
    }

    /// Start from `members`, typically with custom factories registered.
    pub fn members(mut self, members: MemberRegistry) -> Self {
        self.members = Some(members);
        self
    }

    /// Validate the configuration and build the session.
    pub fn build(self) -> Result<Arc<Session>> {
        self.config.validate()?;
        let replica = self.config.replica;
        tracing::debug!(replica, policy = ?self.config.fallback_tick, "building session");
        Ok(Arc::new(Session {
            allocator: self
                .allocator
                .unwrap_or_else(|| Arc::new(ReferenceController::new(replica))),
            bin: self.bin.unwrap_or_else(|| Arc::new(TrashBin::new())),
            clock: self.clock.unwrap_or_else(|| Arc::new(SessionClock::default())),
            types: self.types.unwrap_or_else(|| Arc::new(BinaryTypeCodec)),
            members: self.members.unwrap_or_default(),
            references: Arc::new(ReferenceTable::new()),
            pools: Pools::new(self.config.pool_retention),
            config: self.config,
        }))
    }
}
