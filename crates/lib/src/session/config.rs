//! Session configuration.

use serde::{Deserialize, Serialize};

use super::SessionError;
use crate::constants::{DEFAULT_POOL_RETENTION, MAX_REPLICA};

/// Confirmation tick used by full decodes whose inbound message carries none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FallbackTick {
    /// The session clock's current tick.
    #[default]
    SessionTick,
    /// Tick zero: anything still in the recycle bin can come back.
    Oldest,
    /// Never resurrect without an explicit confirmation.
    Disabled,
}

/// Configuration for a [`Session`](super::Session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Replica number namespacing this session's network identities.
    pub replica: u16,

    /// Tick policy for unconfirmed full decodes.
    pub fallback_tick: FallbackTick,

    /// Idle scratch buffers each pool keeps.
    pub pool_retention: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            replica: 0,
            fallback_tick: FallbackTick::default(),
            pool_retention: DEFAULT_POOL_RETENTION,
        }
    }
}

impl SessionConfig {
    /// Config for `replica` with every other setting at its default.
    pub fn for_replica(replica: u16) -> Self {
        Self {
            replica,
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), SessionError> {
        if self.replica > MAX_REPLICA {
            return Err(SessionError::InvalidReplica {
                replica: self.replica,
                max: MAX_REPLICA,
            });
        }
        Ok(())
    }
}
