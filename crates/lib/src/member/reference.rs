//! Reference member.

use std::any::Any;
use std::sync::Arc;

use super::{MemberError, SyncMember, same_kind};
use crate::Result;
use crate::reference::{RefId, ReferenceTable};
use crate::types::TypeTag;

/// A member pointing at another member by identity.
///
/// The target lives in the session's [`ReferenceTable`] under this member's
/// own identity, so structural moves can retarget it without visiting the
/// member.
#[derive(Debug)]
pub struct Reference {
    id: RefId,
    ty: TypeTag,
    links: Arc<ReferenceTable>,
    owner: u64,
}

impl Reference {
    /// Creates an unset reference and registers it in `links`.
    pub fn new(id: RefId, ty: TypeTag, links: Arc<ReferenceTable>) -> Self {
        let owner = links.register(id, None);
        Self {
            id,
            ty,
            links,
            owner,
        }
    }

    /// Current target.
    pub fn target(&self) -> Option<RefId> {
        self.links.target(self.id)
    }

    /// Points this reference at `target`.
    pub fn set_target(&self, target: Option<RefId>) {
        self.links.link(self.id, target);
    }
}

impl SyncMember for Reference {
    fn id(&self) -> RefId {
        self.id
    }

    fn element_type(&self) -> &TypeTag {
        &self.ty
    }

    fn copy_values(&mut self, source: &dyn SyncMember) -> Result<()> {
        let source = same_kind(self, source)?;
        self.set_target(source.target());
        Ok(())
    }

    fn save(&self) -> serde_json::Value {
        match self.target() {
            Some(target) => serde_json::Value::from(target.raw()),
            None => serde_json::Value::Null,
        }
    }

    fn load(&mut self, node: &serde_json::Value) -> Result<()> {
        let target = match node {
            serde_json::Value::Null => None,
            other => Some(RefId::new(other.as_u64().ok_or_else(|| {
                MemberError::InvalidValue {
                    type_name: self.ty.name(),
                    reason: format!("expected identity or null, got {other}"),
                }
            })?)),
        };
        self.set_target(target);
        Ok(())
    }

    fn dispose(&mut self) {
        self.links.release(self.id, self.owner);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
