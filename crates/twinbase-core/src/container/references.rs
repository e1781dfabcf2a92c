//! Reference derivation
//!
//! References are never hand-authored: the key chain comes from walking
//! parent links up to the structural root, and the owning identifiable
//! contributes the first key.

use super::{ElementContainer, NodeRef};
use crate::errors::Result;
use crate::model::{Key, KeyType, Reference};

impl NodeRef<'_> {
    /// Own key: model type plus IdShort, or index for list children
    pub fn key(&self) -> Option<Key> {
        let element = self.element()?;
        let value = element
            .id_short()
            .map(str::to_string)
            .unwrap_or_else(|| self.index().to_string());
        Some(Key::new(KeyType::from(element.model_type()), value))
    }

    /// Keys from the structural root down to this node
    ///
    /// Nodes without a value (the bare root of a submodel or shell store)
    /// contribute no key.
    pub fn reference_keys(&self) -> Vec<Key> {
        let mut keys = Vec::new();
        let mut current = Some(*self);
        while let Some(node) = current {
            if let Some(key) = node.key() {
                keys.push(key);
            }
            current = node.parent();
        }
        keys.reverse();
        keys
    }
}

impl ElementContainer {
    /// Structural key chain of the element at `path`
    ///
    /// # Errors
    /// * `ElementNotFound` - If nothing resolves at `path`
    pub fn reference_keys(&self, path: &str) -> Result<Vec<Key>> {
        Ok(self.resolve(path)?.reference_keys())
    }

    /// Model reference to the element at `path`, starting with the owner's
    /// key when the container has one
    ///
    /// # Errors
    /// * `ElementNotFound` - If nothing resolves at `path`
    pub fn element_reference(&self, path: &str) -> Result<Reference> {
        let mut keys: Vec<Key> = self.owner().cloned().into_iter().collect();
        keys.extend(self.reference_keys(path)?);
        Ok(Reference::model(keys))
    }
}
