//! Member construction by runtime type.
//!
//! The registry maps a [`TypeTag`] to the factory that instantiates its
//! payload. Built-in kinds resolve to built-in factories the first time they
//! are requested and are memoized from then on; custom kinds must be
//! registered before use.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Field, MemberError, Record, Reference, SyncMember};
use crate::Result;
use crate::reference::{IdAllocator, RefId, ReferenceTable};
use crate::types::TypeTag;

/// Constructs the payload for one type.
///
/// Factories must allocate the member's own identity first and then the
/// identities of any nested members in declaration order, so a replica
/// replaying a reserved block reproduces the same identities.
pub type MemberFactory =
    Arc<dyn Fn(&TypeTag, &MemberContext<'_>) -> Result<Box<dyn SyncMember>> + Send + Sync>;

/// What a factory may use while constructing a member.
pub struct MemberContext<'a> {
    allocator: &'a dyn IdAllocator,
    references: &'a Arc<ReferenceTable>,
    registry: &'a MemberRegistry,
}

impl<'a> MemberContext<'a> {
    pub fn new(
        allocator: &'a dyn IdAllocator,
        references: &'a Arc<ReferenceTable>,
        registry: &'a MemberRegistry,
    ) -> Self {
        Self {
            allocator,
            references,
            registry,
        }
    }

    /// Draws the next identity from the open allocation block.
    pub fn allocate_id(&self) -> RefId {
        self.allocator.allocate()
    }

    /// The session's reference links.
    pub fn references(&self) -> &Arc<ReferenceTable> {
        self.references
    }

    /// Constructs a nested member of type `ty`.
    pub fn construct(&self, ty: &TypeTag) -> Result<Box<dyn SyncMember>> {
        self.registry.construct(ty, self)
    }
}

/// Factory table keyed by type.
#[derive(Default)]
pub struct MemberRegistry {
    factories: Mutex<HashMap<TypeTag, MemberFactory>>,
}

impl std::fmt::Debug for MemberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberRegistry")
            .field("cached", &self.lock().len())
            .finish()
    }
}

impl MemberRegistry {
    /// Creates a registry that knows only the built-in kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs (or replaces) the factory for `ty`.
    pub fn register(&self, ty: TypeTag, factory: MemberFactory) {
        self.lock().insert(ty, factory);
    }

    /// Whether a factory is cached for `ty`.
    pub fn is_resolved(&self, ty: &TypeTag) -> bool {
        self.lock().contains_key(ty)
    }

    /// Number of cached factories.
    pub fn cached(&self) -> usize {
        self.lock().len()
    }

    /// Returns the factory for `ty`, resolving and memoizing a built-in one
    /// on first use.
    pub fn resolve(&self, ty: &TypeTag) -> Result<MemberFactory> {
        let mut factories = self.lock();
        if let Some(factory) = factories.get(ty) {
            return Ok(factory.clone());
        }
        let factory = builtin_factory(ty).ok_or_else(|| MemberError::NoFactory {
            type_name: ty.name(),
        })?;
        factories.insert(ty.clone(), factory.clone());
        Ok(factory)
    }

    /// Constructs a member of type `ty`.
    pub fn construct(&self, ty: &TypeTag, ctx: &MemberContext<'_>) -> Result<Box<dyn SyncMember>> {
        // The table lock is released before the factory runs; record
        // factories re-enter the registry for their fields.
        let factory = self.resolve(ty)?;
        factory(ty, ctx)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TypeTag, MemberFactory>> {
        self.factories
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn builtin_factory(ty: &TypeTag) -> Option<MemberFactory> {
    let factory: MemberFactory = match ty {
        t if t.is_scalar() => Arc::new(construct_field),
        TypeTag::Ref(_) => Arc::new(construct_reference),
        TypeTag::Record { .. } => Arc::new(construct_record),
        _ => return None,
    };
    Some(factory)
}

fn construct_field(ty: &TypeTag, ctx: &MemberContext<'_>) -> Result<Box<dyn SyncMember>> {
    Ok(Box::new(Field::new(ctx.allocate_id(), ty.clone())?))
}

fn construct_reference(ty: &TypeTag, ctx: &MemberContext<'_>) -> Result<Box<dyn SyncMember>> {
    Ok(Box::new(Reference::new(
        ctx.allocate_id(),
        ty.clone(),
        ctx.references().clone(),
    )))
}

fn construct_record(ty: &TypeTag, ctx: &MemberContext<'_>) -> Result<Box<dyn SyncMember>> {
    let id = ctx.allocate_id();
    let TypeTag::Record { fields, .. } = ty else {
        return Err(MemberError::TypeMismatch {
            expected: "record".to_string(),
            actual: ty.name(),
        }
        .into());
    };
    let mut children: Vec<Box<dyn SyncMember>> = Vec::with_capacity(fields.len());
    for decl in fields {
        match ctx.construct(&decl.ty) {
            Ok(child) => children.push(child),
            Err(err) => {
                for mut child in children {
                    child.dispose();
                }
                return Err(err);
            }
        }
    }
    Ok(Box::new(Record::new(id, ty.clone(), children)))
}
