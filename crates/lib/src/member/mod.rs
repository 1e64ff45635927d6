//! Synchronized payload members.
//!
//! Every element slot of a collection owns exactly one [`SyncMember`]. The
//! collection never looks inside it: it only needs the member's identity, the
//! identities of its nested members (to retarget references when a slot is
//! recreated), value copying, and the tree-persistence form.
//!
//! # Built-in payloads
//!
//! - [`Field`] - a scalar [`Value`](crate::types::Value)
//! - [`Reference`] - a link to another member, stored in the session's
//!   [`ReferenceTable`](crate::reference::ReferenceTable)
//! - [`Record`] - ordered named child members
//!
//! Custom payloads are installed through [`MemberRegistry::register`].

pub mod errors;
pub mod field;
pub mod record;
pub mod reference;
pub mod registry;

use std::any::Any;

use crate::Result;
use crate::reference::RefId;
use crate::types::TypeTag;

pub use errors::MemberError;
pub use field::Field;
pub use record::Record;
pub use reference::Reference;
pub use registry::{MemberContext, MemberFactory, MemberRegistry};

/// An independently synchronized value owned by one collection slot.
pub trait SyncMember: Send + std::fmt::Debug + 'static {
    /// Identity assigned at construction.
    fn id(&self) -> RefId;

    /// The type this member was constructed for.
    fn element_type(&self) -> &TypeTag;

    /// Appends the identities of all nested members, depth-first in
    /// declaration order. The member's own identity is not included.
    fn child_ids(&self, _out: &mut Vec<RefId>) {}

    /// Copies the value of `source`, a member of the same type, into `self`.
    fn copy_values(&mut self, source: &dyn SyncMember) -> Result<()>;

    /// Tree-persistence form of the current value.
    fn save(&self) -> serde_json::Value;

    /// Restores the value from its tree-persistence form.
    fn load(&mut self, node: &serde_json::Value) -> Result<()>;

    /// Releases session resources held by this member. Called exactly once,
    /// when the member is destroyed rather than moved to the recycle bin.
    fn dispose(&mut self) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn SyncMember {
    /// Returns the concrete member if it is a `T`.
    pub fn downcast_ref<T: SyncMember>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Returns the concrete member mutably if it is a `T`.
    pub fn downcast_mut<T: SyncMember>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Identities of all nested members, depth-first.
    pub fn collect_child_ids(&self) -> Vec<RefId> {
        let mut out = Vec::new();
        self.child_ids(&mut out);
        out
    }
}

/// Downcasts `source` to the member kind of `target`, failing with a type
/// mismatch otherwise.
pub(crate) fn same_kind<'a, T: SyncMember>(
    target: &T,
    source: &'a dyn SyncMember,
) -> Result<&'a T> {
    source.downcast_ref::<T>().ok_or_else(|| {
        MemberError::TypeMismatch {
            expected: target.element_type().name(),
            actual: source.element_type().name(),
        }
        .into()
    })
}
