//! Recycle bin for soft-deleted members.
//!
//! A synchronized removal does not destroy the member right away: the remote
//! side may still send a full snapshot, taken before it saw the removal, that
//! lists the member. Keeping the member around lets the snapshot decode
//! resurrect it, identity and values intact, instead of constructing a
//! stranger with the same identity.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::member::SyncMember;
use crate::reference::RefId;

/// Holds soft-deleted members keyed by identity and deletion tick.
pub trait RecycleBin: Send + Sync {
    /// Transfers ownership of `member`, deleted at `tick`, to the bin.
    fn move_to_bin(&self, tick: u64, member: Box<dyn SyncMember>);

    /// Takes `id` back out of the bin if it is still resurrectable for a
    /// state confirmed at `tick`.
    fn try_retrieve(&self, tick: u64, id: RefId) -> Option<Box<dyn SyncMember>>;

    /// Disposes the binned member with identity `id`, if any. Called before a
    /// fresh member takes over the identity.
    fn discard(&self, id: RefId) -> bool;
}

#[derive(Debug)]
struct TrashEntry {
    tick: u64,
    member: Box<dyn SyncMember>,
}

/// The default in-memory [`RecycleBin`].
///
/// A member trashed at tick `t` is retrievable for confirmation tick `c` iff
/// `t >= c`: the member was still alive in the state the remote confirmed.
#[derive(Debug, Default)]
pub struct TrashBin {
    entries: Mutex<HashMap<RefId, TrashEntry>>,
}

impl TrashBin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members in the bin.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the bin is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether `id` is in the bin.
    pub fn contains(&self, id: RefId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Tick at which `id` was trashed.
    pub fn trashed_at(&self, id: RefId) -> Option<u64> {
        self.lock().get(&id).map(|entry| entry.tick)
    }

    /// Disposes every member trashed before `tick`. Returns how many were
    /// disposed.
    pub fn purge_before(&self, tick: u64) -> usize {
        let expired: Vec<TrashEntry> = {
            let mut entries = self.lock();
            let ids: Vec<RefId> = entries
                .iter()
                .filter(|(_, entry)| entry.tick < tick)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| entries.remove(&id))
                .collect()
        };
        let purged = expired.len();
        for mut entry in expired {
            entry.member.dispose();
        }
        if purged > 0 {
            tracing::debug!(purged, tick, "purged recycle bin");
        }
        purged
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RefId, TrashEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RecycleBin for TrashBin {
    fn move_to_bin(&self, tick: u64, member: Box<dyn SyncMember>) {
        let id = member.id();
        tracing::trace!(id = %id, tick, "moved to recycle bin");
        let previous = self.lock().insert(id, TrashEntry { tick, member });
        if let Some(mut previous) = previous {
            previous.member.dispose();
        }
    }

    fn try_retrieve(&self, tick: u64, id: RefId) -> Option<Box<dyn SyncMember>> {
        let mut entries = self.lock();
        match entries.get(&id) {
            Some(entry) if entry.tick >= tick => entries.remove(&id).map(|entry| entry.member),
            _ => None,
        }
    }

    fn discard(&self, id: RefId) -> bool {
        // Dispose outside the lock
        let entry = self.lock().remove(&id);
        match entry {
            Some(mut entry) => {
                tracing::trace!(id = %id, tick = entry.tick, "discarded from recycle bin");
                entry.member.dispose();
                true
            }
            None => false,
        }
    }
}
