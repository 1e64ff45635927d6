//! Session-wide registry of reference links.
//!
//! A reference member does not own its target; it owns a *holder* identity
//! and the table maps that holder to whatever it currently points at. Keeping
//! the links in one place is what lets a structural move retarget every
//! reference to a replaced element in one pass.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::RefId;

#[derive(Debug, Default, Clone, Copy)]
struct Link {
    owner: u64,
    target: Option<RefId>,
}

#[derive(Debug, Default)]
struct Links {
    entries: HashMap<RefId, Link>,
    next_owner: u64,
}

/// Maps reference holders to their current targets.
///
/// Each registration hands out an owner token. A member that shares its
/// holder identity with a newer registration can only release its own link.
#[derive(Debug, Default)]
pub struct ReferenceTable {
    links: Mutex<Links>,
}

impl ReferenceTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `holder` as a new owner pointing at `target`, replacing any
    /// previous registration. Returns the owner token.
    pub fn register(&self, holder: RefId, target: Option<RefId>) -> u64 {
        let mut links = self.lock();
        links.next_owner += 1;
        let owner = links.next_owner;
        links.entries.insert(holder, Link { owner, target });
        owner
    }

    /// Points `holder` at `target`, registering it if needed.
    pub fn link(&self, holder: RefId, target: Option<RefId>) {
        self.lock().entries.entry(holder).or_default().target = target;
    }

    /// Current target of `holder`. `None` if unlinked or pointing at nothing.
    pub fn target(&self, holder: RefId) -> Option<RefId> {
        self.lock().entries.get(&holder).and_then(|link| link.target)
    }

    /// Whether `holder` is registered.
    pub fn contains(&self, holder: RefId) -> bool {
        self.lock().entries.contains_key(&holder)
    }

    /// Removes `holder`, returning its last target.
    pub fn unlink(&self, holder: RefId) -> Option<RefId> {
        self.lock().entries.remove(&holder).and_then(|link| link.target)
    }

    /// Removes `holder` only if `owner` still owns it. Returns whether the
    /// link was removed.
    pub fn release(&self, holder: RefId, owner: u64) -> bool {
        let mut links = self.lock();
        match links.entries.get(&holder) {
            Some(link) if link.owner == owner => {
                links.entries.remove(&holder);
                true
            }
            Some(_) => {
                tracing::trace!(holder = %holder, "link owned by a newer member; kept");
                false
            }
            None => false,
        }
    }

    /// All holders currently pointing at `target`, in ascending order.
    pub fn holders_of(&self, target: RefId) -> Vec<RefId> {
        let mut holders: Vec<RefId> = self
            .lock()
            .entries
            .iter()
            .filter(|(_, link)| link.target == Some(target))
            .map(|(holder, _)| *holder)
            .collect();
        holders.sort_unstable();
        holders
    }

    /// Number of registered holders.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether no holder is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Retargets every link whose target is a key of `replacements`.
    ///
    /// Returns the number of links changed.
    pub fn replace_targets(&self, replacements: &HashMap<RefId, RefId>) -> usize {
        let mut changed = 0;
        for link in self.lock().entries.values_mut() {
            if let Some(replacement) = link.target.and_then(|t| replacements.get(&t)) {
                link.target = Some(*replacement);
                changed += 1;
            }
        }
        changed
    }

    fn lock(&self) -> MutexGuard<'_, Links> {
        self.links.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
