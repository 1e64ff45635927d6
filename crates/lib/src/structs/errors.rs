//! Error types for collection operations.
//!
//! These report caller misuse. A collection that returns one of these errors
//! has not been modified.

use thiserror::Error;

use crate::reference::RefId;

/// Structured error types for [`ElementStruct`](super::ElementStruct) operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StructError {
    /// An index argument was outside the valid range for the operation
    #[error("{operation}: index {index} out of range for {len} element(s)")]
    IndexOutOfRange {
        operation: &'static str,
        index: usize,
        len: usize,
    },

    /// Elements cannot be removed while the collection is initializing
    #[error("Cannot remove elements during initialization phase")]
    RemoveDuringInit,

    /// No live element has the given identity
    #[error("Element not found: {id}")]
    ElementNotFound { id: RefId },

    /// The layout source has no type for the next slot
    #[error("Layout defines no type at index {index}")]
    LayoutExhausted { index: usize },
}

impl StructError {
    /// Check if this error is an out-of-range index, including a slot past
    /// the end of the layout
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            StructError::IndexOutOfRange { .. } | StructError::LayoutExhausted { .. }
        )
    }

    /// Check if this error indicates a missing element
    pub fn is_not_found(&self) -> bool {
        matches!(self, StructError::ElementNotFound { .. })
    }

    /// Check if this error reports an operation not allowed in the current phase
    pub fn is_invalid_phase(&self) -> bool {
        matches!(self, StructError::RemoveDuringInit)
    }
}

// Conversion from StructError to the main Error type
impl From<StructError> for crate::Error {
    fn from(err: StructError) -> Self {
        crate::Error::Struct(err)
    }
}
