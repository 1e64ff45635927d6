//! Identity allocation.
//!
//! Element construction is bracketed by [`IdAllocator::begin_allocation`] and
//! [`IdAllocator::end_allocation`]. Everything allocated inside the bracket,
//! the element itself and then its nested members in declaration order, draws
//! from the block opened by `begin_allocation`:
//!
//! - a **reserved** block replays identities chosen by a remote replica,
//!   handing out `start, start + 1, ...`
//! - a **local** block draws from this replica's local range
//! - outside any block, identities come from this replica's network range
//!
//! [`AllocationScope`] ties the bracket to a lexical scope so it is closed on
//! every exit path.

use std::sync::{Mutex, MutexGuard};

use super::id::{COUNTER_MASK, RefId};

/// Where fresh identities are drawn from when none is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationMode {
    /// The replicated range of this replica.
    #[default]
    Network,
    /// The local range, for purely client-side structures.
    Local,
}

/// Issues and reserves globally unique reference identifiers.
///
/// Implementations must tolerate nested blocks: a block opened while another
/// is active takes precedence until it is closed.
pub trait IdAllocator: Send + Sync {
    /// Opens an allocation block.
    ///
    /// With `reserved = Some(id)` the block replays identities starting at
    /// `id` regardless of `mode`. With `None` a fresh block is opened in
    /// `mode`.
    fn begin_allocation(&self, reserved: Option<RefId>, mode: AllocationMode);

    /// Closes the innermost allocation block.
    fn end_allocation(&self);

    /// Returns the next identity of the innermost block, or a fresh network
    /// identity outside any block.
    fn allocate(&self) -> RefId;
}

/// RAII bracket around an allocation block.
///
/// ```
/// use syncstruct::reference::{AllocationMode, AllocationScope, ReferenceController, RefId};
///
/// let allocator = ReferenceController::new(0);
/// {
///     let remote = RefId::network(9, 40);
///     let scope = AllocationScope::begin(&allocator, Some(remote), AllocationMode::Network);
///     assert_eq!(scope.allocate(), remote);
///     assert_eq!(scope.allocate(), RefId::network(9, 41));
/// }
/// assert_eq!(allocator.allocate_network(), RefId::new(1));
/// ```
pub struct AllocationScope<'a> {
    allocator: &'a dyn IdAllocator,
}

impl<'a> AllocationScope<'a> {
    /// Opens a block on `allocator` that is closed when the scope drops.
    pub fn begin(
        allocator: &'a dyn IdAllocator,
        reserved: Option<RefId>,
        mode: AllocationMode,
    ) -> Self {
        allocator.begin_allocation(reserved, mode);
        Self { allocator }
    }

    /// Allocates from the block this scope opened.
    pub fn allocate(&self) -> RefId {
        self.allocator.allocate()
    }

    /// The allocator this scope brackets.
    pub fn allocator(&self) -> &'a dyn IdAllocator {
        self.allocator
    }
}

impl Drop for AllocationScope<'_> {
    fn drop(&mut self) {
        self.allocator.end_allocation();
    }
}

#[derive(Debug, Clone, Copy)]
enum Block {
    Reserved { next: u64 },
    Local,
    Network,
}

#[derive(Debug)]
struct ControllerState {
    next_network: u64,
    next_local: u64,
    blocks: Vec<Block>,
}

/// The default [`IdAllocator`].
///
/// Network identities of replica `r` are `RefId::network(r, n)` for
/// `n = 1, 2, ...`. Reserved identities that land in this replica's own range
/// push the network counter past them so they are never issued twice.
#[derive(Debug)]
pub struct ReferenceController {
    replica: u16,
    state: Mutex<ControllerState>,
}

impl ReferenceController {
    /// Creates a controller issuing identities for `replica`.
    pub fn new(replica: u16) -> Self {
        Self {
            replica,
            state: Mutex::new(ControllerState {
                next_network: 1,
                next_local: 1,
                blocks: Vec::new(),
            }),
        }
    }

    /// The replica this controller allocates for.
    pub fn replica(&self) -> u16 {
        self.replica
    }

    /// Issues a fresh network identity, ignoring any open block.
    pub fn allocate_network(&self) -> RefId {
        let mut state = self.lock();
        Self::next_network(&mut state, self.replica)
    }

    /// Number of blocks currently open.
    pub fn open_blocks(&self) -> usize {
        self.lock().blocks.len()
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_network(state: &mut ControllerState, replica: u16) -> RefId {
        let id = RefId::network(replica, state.next_network);
        state.next_network = (state.next_network + 1) & COUNTER_MASK;
        id
    }

    fn observe_reserved(&self, state: &mut ControllerState, id: RefId) {
        if !id.is_local() && id.replica() == self.replica && id.counter() >= state.next_network {
            state.next_network = id.counter() + 1;
        }
    }
}

impl Default for ReferenceController {
    fn default() -> Self {
        Self::new(0)
    }
}

impl IdAllocator for ReferenceController {
    fn begin_allocation(&self, reserved: Option<RefId>, mode: AllocationMode) {
        let block = match (reserved, mode) {
            (Some(start), _) => Block::Reserved { next: start.raw() },
            (None, AllocationMode::Local) => Block::Local,
            (None, AllocationMode::Network) => Block::Network,
        };
        self.lock().blocks.push(block);
    }

    fn end_allocation(&self) {
        let mut state = self.lock();
        if state.blocks.pop().is_none() {
            tracing::warn!("end_allocation called without an open block");
        }
    }

    fn allocate(&self) -> RefId {
        let mut state = self.lock();
        match state.blocks.last_mut() {
            Some(Block::Reserved { next }) => {
                let id = RefId::new(*next);
                *next = next.wrapping_add(1);
                self.observe_reserved(&mut state, id);
                id
            }
            Some(Block::Local) => {
                let id = RefId::local(state.next_local);
                state.next_local += 1;
                id
            }
            Some(Block::Network) | None => Self::next_network(&mut state, self.replica),
        }
    }
}
