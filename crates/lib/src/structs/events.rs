//! Element change notifications.
//!
//! Listeners are invoked in registration order. A listener that returns an
//! error or panics is logged and skipped; the remaining listeners still run
//! and the mutation in progress always completes.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use super::ElementStruct;
use crate::Result;

/// Receives element change notifications from an [`ElementStruct`].
///
/// Every method defaults to a no-op.
pub trait StructListener: Send + Sync {
    /// `count` elements were inserted starting at `start`.
    fn on_elements_added(
        &self,
        _target: &ElementStruct,
        _start: usize,
        _count: usize,
    ) -> Result<()> {
        Ok(())
    }

    /// `count` elements starting at `start` are about to be removed. They are
    /// still present.
    fn on_elements_removing(
        &self,
        _target: &ElementStruct,
        _start: usize,
        _count: usize,
    ) -> Result<()> {
        Ok(())
    }

    /// `count` elements that started at `start` were removed.
    fn on_elements_removed(
        &self,
        _target: &ElementStruct,
        _start: usize,
        _count: usize,
    ) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElementEvent {
    Added,
    Removing,
    Removed,
}

impl ElementEvent {
    fn name(self) -> &'static str {
        match self {
            ElementEvent::Added => "ElementsAdded",
            ElementEvent::Removing => "ElementsRemoving",
            ElementEvent::Removed => "ElementsRemoved",
        }
    }
}

/// Ordered listener list of one collection.
#[derive(Default, Clone)]
pub(crate) struct Listeners {
    entries: Vec<Arc<dyn StructListener>>,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: Arc<dyn StructListener>) {
        self.entries.push(listener);
    }

    pub(crate) fn remove(&mut self, listener: &Arc<dyn StructListener>) -> bool {
        let before = self.entries.len();
        self.entries.retain(|l| !Arc::ptr_eq(l, listener));
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Calls every listener, isolating failures.
    pub(crate) fn dispatch(
        &self,
        event: ElementEvent,
        target: &ElementStruct,
        start: usize,
        count: usize,
    ) {
        for (listener_index, listener) in self.entries.iter().enumerate() {
            let outcome = catch_unwind(AssertUnwindSafe(|| match event {
                ElementEvent::Added => listener.on_elements_added(target, start, count),
                ElementEvent::Removing => listener.on_elements_removing(target, start, count),
                ElementEvent::Removed => listener.on_elements_removed(target, start, count),
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(
                        event = event.name(),
                        listener_index,
                        start,
                        count,
                        "Listener failed: {e}"
                    );
                }
                Err(panic) => {
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "non-string panic payload".to_string());
                    tracing::error!(
                        event = event.name(),
                        listener_index,
                        start,
                        count,
                        "Listener panicked: {message}"
                    );
                }
            }
        }
    }
}
