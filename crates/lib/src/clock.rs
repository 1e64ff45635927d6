//! Logical time provider abstraction
//!
//! This module provides a [`Clock`] trait that abstracts over the session's
//! synchronization tick, allowing hosts to drive the tick from their own sync
//! loop while tests pin it to known values.
//!
//! # Example
//!
//! ```
//! use syncstruct::{Clock, SessionClock};
//!
//! let clock = SessionClock::new(10);
//! assert_eq!(clock.now_tick(), 10);
//! clock.advance();
//! assert_eq!(clock.now_tick(), 11);
//! ```

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

/// A source of logical synchronization ticks.
///
/// Ticks order soft deletions against confirmations: an element moved to the
/// recycle bin at tick `t` may be resurrected by a snapshot confirmed at any
/// tick `<= t`.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current tick.
    fn now_tick(&self) -> u64;
}

/// Default clock: a monotonic counter the host advances once per sync cycle.
#[derive(Debug, Default)]
pub struct SessionClock {
    tick: AtomicU64,
}

impl SessionClock {
    /// Create a clock starting at `tick`.
    pub fn new(tick: u64) -> Self {
        Self {
            tick: AtomicU64::new(tick),
        }
    }

    /// Advance by one tick, returning the new tick.
    pub fn advance(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Advance by `ticks`.
    pub fn advance_by(&self, ticks: u64) {
        self.tick.fetch_add(ticks, Ordering::Relaxed);
    }

    /// Set the clock to a specific tick.
    pub fn set(&self, tick: u64) {
        self.tick.store(tick, Ordering::Relaxed);
    }
}

impl Clock for SessionClock {
    fn now_tick(&self) -> u64 {
        self.tick.load(Ordering::Relaxed)
    }
}
