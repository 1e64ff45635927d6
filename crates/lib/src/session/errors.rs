//! Error types for session construction.

use thiserror::Error;

/// Structured error types for invalid session setup.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SessionError {
    /// The replica number would collide with the local identity range
    #[error("Replica {replica} out of range (max {max})")]
    InvalidReplica { replica: u16, max: u16 },

    /// A configuration value was rejected
    #[error("Invalid session configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl SessionError {
    /// Check if this error was caused by invalid configuration
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidReplica { .. } | SessionError::InvalidConfig { .. }
        )
    }
}

// Conversion from SessionError to the main Error type
impl From<SessionError> for crate::Error {
    fn from(err: SessionError) -> Self {
        crate::Error::Session(err)
    }
}
