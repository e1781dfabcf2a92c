use serde::{Deserialize, Serialize};

use super::element::ModelType;

/// Type tag of a single reference key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    AssetAdministrationShell,
    Submodel,
    Property,
    MultiLanguageProperty,
    Range,
    Blob,
    File,
    ReferenceElement,
    SubmodelElementCollection,
    SubmodelElementList,
    Operation,
    BasicEventElement,
    Entity,
    Capability,
    GlobalReference,
}

impl From<ModelType> for KeyType {
    fn from(model_type: ModelType) -> Self {
        match model_type {
            ModelType::Property => KeyType::Property,
            ModelType::MultiLanguageProperty => KeyType::MultiLanguageProperty,
            ModelType::Range => KeyType::Range,
            ModelType::Blob => KeyType::Blob,
            ModelType::File => KeyType::File,
            ModelType::ReferenceElement => KeyType::ReferenceElement,
            ModelType::SubmodelElementCollection => KeyType::SubmodelElementCollection,
            ModelType::SubmodelElementList => KeyType::SubmodelElementList,
            ModelType::Operation => KeyType::Operation,
            ModelType::BasicEventElement => KeyType::BasicEventElement,
            ModelType::Entity => KeyType::Entity,
            ModelType::Capability => KeyType::Capability,
            ModelType::Submodel => KeyType::Submodel,
        }
    }
}

/// One step of a reference chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    #[serde(rename = "type")]
    pub key_type: KeyType,
    pub value: String,
}

impl Key {
    pub fn new(key_type: KeyType, value: impl Into<String>) -> Self {
        Self {
            key_type,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceType {
    /// Points into a model held by this system
    ModelReference,
    /// Points at something outside any model
    ExternalReference,
}

/// Ordered key chain from a known root down to an element
///
/// Equality is structural: same type tag, same number of keys, and keys
/// pairwise equal in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "type")]
    pub reference_type: ReferenceType,
    pub keys: Vec<Key>,
}

impl Reference {
    pub fn model(keys: Vec<Key>) -> Self {
        Self {
            reference_type: ReferenceType::ModelReference,
            keys,
        }
    }

    /// External reference with a single global key, typically a semantic id
    pub fn external(value: impl Into<String>) -> Self {
        Self {
            reference_type: ReferenceType::ExternalReference,
            keys: vec![Key::new(KeyType::GlobalReference, value)],
        }
    }

    /// Value of the first key, if any
    pub fn first_value(&self) -> Option<&str> {
        self.keys.first().map(|k| k.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_order_sensitive() {
        let a = Reference::model(vec![
            Key::new(KeyType::Submodel, "sm-1"),
            Key::new(KeyType::Property, "Temp"),
        ]);
        let b = Reference::model(vec![
            Key::new(KeyType::Property, "Temp"),
            Key::new(KeyType::Submodel, "sm-1"),
        ]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_equality_requires_equal_length() {
        let short = Reference::model(vec![Key::new(KeyType::Submodel, "sm-1")]);
        let long = Reference::model(vec![
            Key::new(KeyType::Submodel, "sm-1"),
            Key::new(KeyType::Property, "Temp"),
        ]);
        assert_ne!(short, long);
    }

    #[test]
    fn test_type_tag_participates_in_equality() {
        let keys = vec![Key::new(KeyType::GlobalReference, "urn:x")];
        let model = Reference::model(keys.clone());
        let external = Reference {
            reference_type: ReferenceType::ExternalReference,
            keys,
        };
        assert_ne!(model, external);
    }
}
