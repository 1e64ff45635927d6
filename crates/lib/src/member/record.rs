//! Nested record member.

use std::any::Any;

use super::{MemberError, SyncMember, same_kind};
use crate::Result;
use crate::reference::RefId;
use crate::types::TypeTag;

/// A member with ordered, named child members.
///
/// Children are constructed right after the record itself, so within one
/// allocation block a record of `n` fields occupies `n + 1` consecutive
/// identities (more if fields nest further).
#[derive(Debug)]
pub struct Record {
    id: RefId,
    ty: TypeTag,
    fields: Vec<Box<dyn SyncMember>>,
}

impl Record {
    /// Assembles a record from already constructed children.
    ///
    /// `fields` must follow the declaration order of `ty`.
    pub fn new(id: RefId, ty: TypeTag, fields: Vec<Box<dyn SyncMember>>) -> Self {
        Self { id, ty, fields }
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no children.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Child at declaration position `index`.
    pub fn field_at(&self, index: usize) -> Option<&dyn SyncMember> {
        self.fields.get(index).map(|f| &**f)
    }

    /// Mutable child at declaration position `index`.
    pub fn field_at_mut(&mut self, index: usize) -> Option<&mut (dyn SyncMember + 'static)> {
        self.fields.get_mut(index).map(|f| &mut **f)
    }

    /// Child declared as `name`.
    pub fn field(&self, name: &str) -> Result<&dyn SyncMember> {
        let index = self.position_of(name)?;
        Ok(&*self.fields[index])
    }

    /// Mutable child declared as `name`.
    pub fn field_mut(&mut self, name: &str) -> Result<&mut (dyn SyncMember + 'static)> {
        let index = self.position_of(name)?;
        Ok(&mut *self.fields[index])
    }

    fn declared_names(&self) -> Vec<&str> {
        match &self.ty {
            TypeTag::Record { fields, .. } => fields.iter().map(|f| f.name.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    fn position_of(&self, name: &str) -> Result<usize> {
        self.declared_names()
            .iter()
            .position(|n| *n == name)
            .filter(|i| *i < self.fields.len())
            .ok_or_else(|| {
                MemberError::FieldNotFound {
                    record: self.ty.name(),
                    field: name.to_string(),
                }
                .into()
            })
    }
}

impl SyncMember for Record {
    fn id(&self) -> RefId {
        self.id
    }

    fn element_type(&self) -> &TypeTag {
        &self.ty
    }

    fn child_ids(&self, out: &mut Vec<RefId>) {
        for field in &self.fields {
            out.push(field.id());
            field.child_ids(out);
        }
    }

    fn copy_values(&mut self, source: &dyn SyncMember) -> Result<()> {
        let source = same_kind(self, source)?;
        if source.fields.len() != self.fields.len() {
            return Err(MemberError::TypeMismatch {
                expected: format!("{} with {} fields", self.ty.name(), self.fields.len()),
                actual: format!("{} with {} fields", source.ty.name(), source.fields.len()),
            }
            .into());
        }
        for (target, source) in self.fields.iter_mut().zip(&source.fields) {
            target.copy_values(&**source)?;
        }
        Ok(())
    }

    fn save(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, field) in self.declared_names().into_iter().zip(&self.fields) {
            map.insert(name.to_string(), field.save());
        }
        serde_json::Value::Object(map)
    }

    fn load(&mut self, node: &serde_json::Value) -> Result<()> {
        let map = node.as_object().ok_or_else(|| MemberError::InvalidValue {
            type_name: self.ty.name(),
            reason: format!("expected object, got {node}"),
        })?;
        let names: Vec<String> = self
            .declared_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        for (name, field) in names.iter().zip(self.fields.iter_mut()) {
            // Fields missing from older saves keep their defaults
            if let Some(child) = map.get(name) {
                field.load(child)?;
            }
        }
        Ok(())
    }

    fn dispose(&mut self) {
        for field in &mut self.fields {
            field.dispose();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
