//! Runtime type descriptors and scalar values.
//!
//! A [`TypeTag`] is chosen when an element slot is created and decides which
//! payload the member registry instantiates for it. Tags compare by value, so
//! two replicas that decode the same tag agree on the slot's shape.

pub mod codec;

use serde::{Deserialize, Serialize};

pub use codec::{BinaryTypeCodec, TypeCodec};

/// Runtime type descriptor of an element slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    /// A reference to another member of the given type
    Ref(Box<TypeTag>),
    /// A nested record with ordered, named fields
    Record {
        name: String,
        fields: Vec<FieldDecl>,
    },
    /// A payload supplied by a registered custom factory
    Custom(String),
}

/// One declared field of a [`TypeTag::Record`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeTag,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeTag) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

impl TypeTag {
    /// Shorthand for a reference to `target`.
    pub fn reference(target: TypeTag) -> Self {
        TypeTag::Ref(Box::new(target))
    }

    /// Shorthand for a record type.
    pub fn record(name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        TypeTag::Record {
            name: name.into(),
            fields,
        }
    }

    /// Returns true for the scalar kinds stored in a [`Value`].
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            TypeTag::Bool
                | TypeTag::Int32
                | TypeTag::Int64
                | TypeTag::Float32
                | TypeTag::Float64
                | TypeTag::String
        )
    }

    /// Short human-readable name, used in logs and errors.
    pub fn name(&self) -> String {
        match self {
            TypeTag::Bool => "bool".to_string(),
            TypeTag::Int32 => "int32".to_string(),
            TypeTag::Int64 => "int64".to_string(),
            TypeTag::Float32 => "float32".to_string(),
            TypeTag::Float64 => "float64".to_string(),
            TypeTag::String => "string".to_string(),
            TypeTag::Ref(target) => format!("ref<{}>", target.name()),
            TypeTag::Record { name, .. } => name.clone(),
            TypeTag::Custom(name) => name.clone(),
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// A scalar payload value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
}

impl Value {
    /// The zero value of a scalar type, or `None` for non-scalar tags.
    pub fn default_for(ty: &TypeTag) -> Option<Value> {
        match ty {
            TypeTag::Bool => Some(Value::Bool(false)),
            TypeTag::Int32 => Some(Value::Int32(0)),
            TypeTag::Int64 => Some(Value::Int64(0)),
            TypeTag::Float32 => Some(Value::Float32(0.0)),
            TypeTag::Float64 => Some(Value::Float64(0.0)),
            TypeTag::String => Some(Value::String(String::new())),
            _ => None,
        }
    }

    /// The scalar type this value belongs to.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Bool(_) => TypeTag::Bool,
            Value::Int32(_) => TypeTag::Int32,
            Value::Int64(_) => TypeTag::Int64,
            Value::Float32(_) => TypeTag::Float32,
            Value::Float64(_) => TypeTag::Float64,
            Value::String(_) => TypeTag::String,
        }
    }

    /// Plain JSON form used by tree persistence.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::from(*b),
            Value::Int32(n) => serde_json::Value::from(*n),
            Value::Int64(n) => serde_json::Value::from(*n),
            Value::Float32(n) => serde_json::Value::from(*n),
            Value::Float64(n) => serde_json::Value::from(*n),
            Value::String(s) => serde_json::Value::from(s.as_str()),
        }
    }

    /// Reads the plain JSON form of a value of type `ty`.
    ///
    /// Returns `None` if `node` does not hold a value of that type.
    pub fn from_json(ty: &TypeTag, node: &serde_json::Value) -> Option<Value> {
        match ty {
            TypeTag::Bool => node.as_bool().map(Value::Bool),
            TypeTag::Int32 => node
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(Value::Int32),
            TypeTag::Int64 => node.as_i64().map(Value::Int64),
            TypeTag::Float32 => node.as_f64().map(|n| Value::Float32(n as f32)),
            TypeTag::Float64 => node.as_f64().map(Value::Float64),
            TypeTag::String => node.as_str().map(|s| Value::String(s.to_string())),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float32(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}
