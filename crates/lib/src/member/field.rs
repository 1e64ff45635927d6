//! Scalar field member.

use std::any::Any;

use super::{MemberError, SyncMember, same_kind};
use crate::Result;
use crate::reference::RefId;
use crate::types::{TypeTag, Value};

/// A member holding a single scalar [`Value`].
#[derive(Debug, Clone)]
pub struct Field {
    id: RefId,
    ty: TypeTag,
    value: Value,
}

impl Field {
    /// Creates a field of scalar type `ty` holding its zero value.
    pub fn new(id: RefId, ty: TypeTag) -> Result<Self> {
        let value = Value::default_for(&ty).ok_or_else(|| MemberError::TypeMismatch {
            expected: "scalar type".to_string(),
            actual: ty.name(),
        })?;
        Ok(Self { id, ty, value })
    }

    /// Current value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Replaces the value. The new value must have this field's type.
    pub fn set(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let actual = value.type_tag();
        if actual != self.ty {
            return Err(MemberError::TypeMismatch {
                expected: self.ty.name(),
                actual: actual.name(),
            }
            .into());
        }
        self.value = value;
        Ok(())
    }
}

impl SyncMember for Field {
    fn id(&self) -> RefId {
        self.id
    }

    fn element_type(&self) -> &TypeTag {
        &self.ty
    }

    fn copy_values(&mut self, source: &dyn SyncMember) -> Result<()> {
        let source = same_kind(self, source)?;
        self.set(source.value.clone())
    }

    fn save(&self) -> serde_json::Value {
        self.value.to_json()
    }

    fn load(&mut self, node: &serde_json::Value) -> Result<()> {
        let value = Value::from_json(&self.ty, node).ok_or_else(|| MemberError::InvalidValue {
            type_name: self.ty.name(),
            reason: format!("cannot read {node}"),
        })?;
        self.value = value;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
