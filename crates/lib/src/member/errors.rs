//! Error types for member construction and value access.

use thiserror::Error;

/// Structured error types for payload members.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MemberError {
    /// No factory is registered for the requested type
    #[error("No member factory registered for type '{type_name}'")]
    NoFactory { type_name: String },

    /// A value or source member did not have the expected type
    #[error("Member type mismatch: expected {expected}, found {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// A persisted value could not be interpreted
    #[error("Invalid member value for {type_name}: {reason}")]
    InvalidValue { type_name: String, reason: String },

    /// A record field lookup failed
    #[error("Record '{record}' has no field '{field}'")]
    FieldNotFound { record: String, field: String },
}

impl MemberError {
    /// Check if this error is a missing factory
    pub fn is_missing_factory(&self) -> bool {
        matches!(self, MemberError::NoFactory { .. })
    }

    /// Check if this error is related to type mismatches, including values
    /// that cannot be read as their declared type
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            MemberError::TypeMismatch { .. } | MemberError::InvalidValue { .. }
        )
    }

    /// Check if this error is a lookup failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, MemberError::FieldNotFound { .. })
    }
}

// Conversion from MemberError to the main Error type
impl From<MemberError> for crate::Error {
    fn from(err: MemberError) -> Self {
        crate::Error::Member(err)
    }
}
