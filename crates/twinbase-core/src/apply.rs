//! Functional-boundary apply function
//!
//! `apply()` is the canonical entry point for container mutations. Every
//! command validates before it mutates, so on `Err` the container is
//! unchanged.
//!
//! ## Example
//!
//! ```
//! use twinbase_core::{apply, ContainerCommand, ElementContainer};
//! use twinbase_core::model::Element;
//!
//! let mut container = ElementContainer::default();
//! let cmd = ContainerCommand::Create {
//!     path: ".".to_string(),
//!     element: Element::collection("Measurements"),
//! };
//!
//! let created = apply(&mut container, cmd).unwrap();
//! assert_eq!(created.and_then(|e| e.id_short), Some("Measurements".to_string()));
//! ```

use crate::commands::ContainerCommand;
use crate::container::ElementContainer;
use crate::errors::Result;
use crate::model::Element;

/// Apply a command to a container
///
/// Returns the stored element for create and update commands and `None`
/// for deletes.
///
/// # Errors
///
/// Returns the typed error of the underlying container operation. See
/// `TwinError` for the full taxonomy.
pub fn apply(container: &mut ElementContainer, cmd: ContainerCommand) -> Result<Option<Element>> {
    match cmd {
        ContainerCommand::Create { path, element } => {
            container.create_at(&path, element).map(Some)
        }
        ContainerCommand::Update { path, element } => container.update(&path, element).map(Some),
        ContainerCommand::CreateOrUpdate { path, element } => {
            container.create_or_update(&path, element).map(Some)
        }
        ContainerCommand::Delete { path } => {
            container.delete(&path)?;
            Ok(None)
        }
    }
}
