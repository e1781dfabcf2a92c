//! twinbase core - in-memory element tree of a digital twin model
//!
//! This crate provides:
//! - The element data model (closed set of element kinds, value types,
//!   references, handler capabilities)
//! - IdShort path addressing
//! - The element container arena with CRUD, list reindexing, subtree
//!   rebasing, reference derivation and change notification
//! - Cursor-based pagination
//! - The command/apply mutation boundary
//! - The error and logging facilities shared by the other crates

pub mod apply;
pub mod commands;
pub mod container;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod pagination;
pub mod path;

// Re-export commonly used types
pub use apply::apply;
pub use commands::ContainerCommand;
pub use container::{
    ContainerEvent, ContainerEventKind, ContainerObserver, ElementContainer, NodeId, NodeRef,
};
pub use errors::{ExError, ExErrorKind, Result, TwinError};
pub use model::{AssetAdministrationShell, Element, ElementKind, ModelType, Reference, Submodel};
pub use pagination::{paginate, PagedResult, PaginationParams};
pub use path::IdShortPath;
