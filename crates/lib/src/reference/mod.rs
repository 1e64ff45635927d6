//! Reference identities, their allocation, and the links between them.

pub mod allocator;
pub mod id;
pub mod table;

pub use allocator::{AllocationMode, AllocationScope, IdAllocator, ReferenceController};
pub use id::RefId;
pub use table::ReferenceTable;
