//! Mutation commands
//!
//! This module defines the command inventory that serves as the entry point
//! for container mutations via the `apply()` function.

use crate::model::Element;

/// Mutation of an element container addressed by path
///
/// Commands are processed by the `apply()` function against a container the
/// caller holds exclusively for the duration of the call.
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerCommand {
    /// Create `element` under the node at `path` (`.` for the root)
    Create { path: String, element: Element },

    /// Replace the element at `path`
    Update { path: String, element: Element },

    /// Update the element at `path` if present, create it otherwise
    CreateOrUpdate { path: String, element: Element },

    /// Remove the element at `path`
    Delete { path: String },
}

impl ContainerCommand {
    pub fn path(&self) -> &str {
        match self {
            ContainerCommand::Create { path, .. }
            | ContainerCommand::Update { path, .. }
            | ContainerCommand::CreateOrUpdate { path, .. }
            | ContainerCommand::Delete { path } => path,
        }
    }

    /// Operation name used in logs
    pub fn op_name(&self) -> &'static str {
        match self {
            ContainerCommand::Create { .. } => "create_element",
            ContainerCommand::Update { .. } => "update_element",
            ContainerCommand::CreateOrUpdate { .. } => "create_or_update_element",
            ContainerCommand::Delete { .. } => "delete_element",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_path_and_op_name() {
        let cmd = ContainerCommand::Delete {
            path: "Measurements.Temp".to_string(),
        };
        assert_eq!(cmd.path(), "Measurements.Temp");
        assert_eq!(cmd.op_name(), "delete_element");
    }
}
