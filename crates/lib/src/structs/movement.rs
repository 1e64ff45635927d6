//! Moving an element to another position.
//!
//! Remote replicas only know Insert and Remove, so a move is a recreation: a
//! new element of the same type is inserted at the destination, takes over the
//! old element's values and every reference that pointed at it, and the old
//! element is removed.

use std::collections::HashMap;

use super::{ElementRecord, ElementStruct, StructError};
use crate::Result;
use crate::member::SyncMember;
use crate::reference::RefId;

impl ElementStruct {
    /// Moves the element at `old_index` so that it ends up at `new_index`.
    ///
    /// Returns the recreated element. Both indices must be in `[0, len)`; on
    /// a range error nothing changes.
    pub fn move_to_index(
        &mut self,
        old_index: usize,
        new_index: usize,
    ) -> Result<&mut (dyn SyncMember + 'static)> {
        let len = self.elements.len();
        for index in [old_index, new_index] {
            if index >= len {
                return Err(StructError::IndexOutOfRange {
                    operation: "move_to_index",
                    index,
                    len,
                }
                .into());
            }
        }
        if old_index == new_index {
            return Ok(&mut *self.elements[old_index].member);
        }
        if self.initializing {
            return Err(StructError::RemoveDuringInit.into());
        }

        // Account for the slot the insertion opens before the other index
        let (mut old, mut new) = (old_index, new_index);
        if new < old {
            old += 1;
        } else {
            new += 1;
        }

        let ty = self.elements[old_index].ty.clone();
        self.insert(new, ty)?;

        let (source, target) = self.pair_mut(old, new);
        if let Err(e) = target.member.copy_values(&*source.member) {
            // Freshly inserted and still dirty: removal compacts it away
            self.remove_at(new)?;
            return Err(e);
        }
        let replacements = self.reference_replacements(old, new);
        let remapped = self.session.replace_reference_targets(&replacements);
        self.remove_at(old)?;

        tracing::debug!(old_index, new_index, remapped, "moved element");
        Ok(&mut *self.elements[new_index].member)
    }

    /// Maps the old element and its nested members to their counterparts in
    /// the new element, pairwise in declaration order.
    fn reference_replacements(&self, old: usize, new: usize) -> HashMap<RefId, RefId> {
        let source = &*self.elements[old].member;
        let target = &*self.elements[new].member;
        let mut replacements = HashMap::new();
        replacements.insert(source.id(), target.id());

        let pools = self.session.pools();
        let mut source_children = pools.ids.borrow();
        let mut target_children = pools.ids.borrow();
        source.child_ids(&mut source_children);
        target.child_ids(&mut target_children);
        if source_children.len() == target_children.len() {
            replacements.extend(source_children.iter().copied().zip(target_children.iter().copied()));
        } else {
            tracing::warn!(
                old = source_children.len(),
                new = target_children.len(),
                "Number of nested members differs between old and new element; remapping root only"
            );
        }
        replacements
    }

    fn pair_mut(&mut self, a: usize, b: usize) -> (&mut ElementRecord, &mut ElementRecord) {
        if a < b {
            let (head, tail) = self.elements.split_at_mut(b);
            (&mut head[a], &mut tail[0])
        } else {
            let (head, tail) = self.elements.split_at_mut(a);
            (&mut tail[0], &mut head[b])
        }
    }
}
