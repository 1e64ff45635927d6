//! Recycled scratch buffers.
//!
//! Encoding, decoding and structural moves need short-lived vectors on every
//! call. [`Pool::borrow`] hands out a cleared vector wrapped in a [`Pooled`]
//! guard; dropping the guard returns the allocation to the pool, so buffers
//! come back on every exit path, `?` and panics included.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::constants::DEFAULT_POOL_RETENTION;

#[derive(Debug)]
struct Shared<T> {
    free: Mutex<Vec<Vec<T>>>,
    retention: usize,
}

/// A shared free-list of `Vec<T>` buffers.
#[derive(Debug)]
pub struct Pool<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Pool<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_RETENTION)
    }
}

impl<T> Pool<T> {
    /// Creates a pool keeping at most `retention` idle buffers.
    pub fn new(retention: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                free: Mutex::new(Vec::new()),
                retention,
            }),
        }
    }

    /// Borrows an empty buffer.
    pub fn borrow(&self) -> Pooled<T> {
        let buf = lock(&self.shared.free).pop().unwrap_or_default();
        Pooled {
            buf,
            shared: self.shared.clone(),
        }
    }

    /// Number of idle buffers currently held.
    pub fn idle(&self) -> usize {
        lock(&self.shared.free).len()
    }
}

fn lock<T>(free: &Mutex<Vec<Vec<T>>>) -> MutexGuard<'_, Vec<Vec<T>>> {
    free.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A buffer borrowed from a [`Pool`]; returned on drop.
#[derive(Debug)]
pub struct Pooled<T> {
    buf: Vec<T>,
    shared: Arc<Shared<T>>,
}

impl<T> Deref for Pooled<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.buf
    }
}

impl<T> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.buf
    }
}

impl<T> Drop for Pooled<T> {
    fn drop(&mut self) {
        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        let mut free = lock(&self.shared.free);
        if free.len() < self.shared.retention {
            free.push(buf);
        }
    }
}
