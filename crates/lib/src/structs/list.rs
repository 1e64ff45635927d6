//! A collection whose element types follow an external layout.

use std::ops::{Deref, DerefMut};

use super::{ElementStruct, StructError};
use crate::Result;
use crate::member::SyncMember;
use crate::types::TypeTag;

/// Supplies the type expected at each position.
pub trait LayoutSource {
    /// Type expected at `index`, or `None` past the end of the layout.
    fn type_at(&self, index: usize) -> Option<TypeTag>;

    /// The full expected type sequence.
    fn expected_layout(&self) -> Vec<TypeTag> {
        (0..).map_while(|index| self.type_at(index)).collect()
    }
}

impl LayoutSource for Vec<TypeTag> {
    fn type_at(&self, index: usize) -> Option<TypeTag> {
        self.get(index).cloned()
    }

    fn expected_layout(&self) -> Vec<TypeTag> {
        self.clone()
    }
}

/// An [`ElementStruct`] paired with the [`LayoutSource`] that decides the type
/// of each slot.
#[derive(Debug)]
pub struct ElementList<S> {
    inner: ElementStruct,
    source: S,
}

impl<S: LayoutSource> ElementList<S> {
    pub fn new(inner: ElementStruct, source: S) -> Self {
        Self { inner, source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Replaces the layout source. Call [`sync_layout`](Self::sync_layout)
    /// to reshape existing elements.
    pub fn set_source(&mut self, source: S) {
        self.source = source;
    }

    /// Appends an element of the type the layout expects next.
    pub fn add_element(&mut self) -> Result<&mut (dyn SyncMember + 'static)> {
        let index = self.inner.len();
        let ty = self
            .source
            .type_at(index)
            .ok_or(StructError::LayoutExhausted { index })?;
        self.inner.add(ty)
    }

    /// Reshapes the collection to the current layout.
    pub fn sync_layout(&mut self) -> Result<()> {
        let expected = self.source.expected_layout();
        self.inner.ensure_typed_layout(&expected)
    }

    pub fn into_inner(self) -> ElementStruct {
        self.inner
    }
}

impl<S> Deref for ElementList<S> {
    type Target = ElementStruct;

    fn deref(&self) -> &ElementStruct {
        &self.inner
    }
}

impl<S> DerefMut for ElementList<S> {
    fn deref_mut(&mut self) -> &mut ElementStruct {
        &mut self.inner
    }
}
