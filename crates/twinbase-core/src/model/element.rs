use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::handler::{MethodHandler, MethodHandlerRef, ValueHandler, ValueHandlerRef};
use super::reference::Reference;
use super::value::DataType;
use crate::errors::{Result, TwinError};
use std::sync::Arc;

/// Discriminator tag of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
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
    Submodel,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Property => "Property",
            ModelType::MultiLanguageProperty => "MultiLanguageProperty",
            ModelType::Range => "Range",
            ModelType::Blob => "Blob",
            ModelType::File => "File",
            ModelType::ReferenceElement => "ReferenceElement",
            ModelType::SubmodelElementCollection => "SubmodelElementCollection",
            ModelType::SubmodelElementList => "SubmodelElementList",
            ModelType::Operation => "Operation",
            ModelType::BasicEventElement => "BasicEventElement",
            ModelType::Entity => "Entity",
            ModelType::Capability => "Capability",
            ModelType::Submodel => "Submodel",
        }
    }

    /// Whether nodes of this type may hold children
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            ModelType::SubmodelElementCollection
                | ModelType::SubmodelElementList
                | ModelType::Entity
                | ModelType::Submodel
        )
    }

    /// Whether children are addressed by position
    pub fn is_list(&self) -> bool {
        *self == ModelType::SubmodelElementList
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text in a single language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangString {
    pub language: String,
    pub text: String,
}

impl LangString {
    pub fn new(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Qualifier {
    #[serde(rename = "type")]
    pub qualifier_type: String,
    pub value_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<Reference>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    CoManagedEntity,
    SelfManagedEntity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StateOfEvent {
    On,
    Off,
}

/// Kind-specific payload of an element
///
/// Children of container kinds are not stored here; they live in the
/// element container that holds the element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modelType", rename_all_fields = "camelCase")]
pub enum ElementKind {
    Property {
        value_type: DataType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_id: Option<Reference>,
    },
    MultiLanguageProperty {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        value: Vec<LangString>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_id: Option<Reference>,
    },
    Range {
        value_type: DataType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<Value>,
    },
    Blob {
        content_type: String,
        #[serde(default, with = "blob_bytes", skip_serializing_if = "Option::is_none")]
        value: Option<Vec<u8>>,
    },
    File {
        content_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    ReferenceElement {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Reference>,
    },
    SubmodelElementCollection,
    SubmodelElementList {
        type_value_list_element: ModelType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        semantic_id_list_element: Option<Reference>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_type_list_element: Option<DataType>,
        #[serde(default = "default_order_relevant")]
        order_relevant: bool,
    },
    Operation {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        input_variables: Vec<Element>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        output_variables: Vec<Element>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        inoutput_variables: Vec<Element>,
        #[serde(skip)]
        method: Option<MethodHandlerRef>,
    },
    BasicEventElement {
        observed: Reference,
        direction: Direction,
        state: StateOfEvent,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_topic: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_broker: Option<Reference>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_update: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_interval: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_interval: Option<String>,
    },
    Entity {
        entity_type: EntityType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        global_asset_id: Option<String>,
    },
    Capability,
    Submodel {
        id: String,
    },
}

fn default_order_relevant() -> bool {
    true
}

mod blob_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => s.serialize_str(&STANDARD.encode(b)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(d)?;
        encoded
            .map(|e| STANDARD.decode(e).map_err(serde::de::Error::custom))
            .transpose()
    }
}

impl ElementKind {
    pub fn model_type(&self) -> ModelType {
        match self {
            ElementKind::Property { .. } => ModelType::Property,
            ElementKind::MultiLanguageProperty { .. } => ModelType::MultiLanguageProperty,
            ElementKind::Range { .. } => ModelType::Range,
            ElementKind::Blob { .. } => ModelType::Blob,
            ElementKind::File { .. } => ModelType::File,
            ElementKind::ReferenceElement { .. } => ModelType::ReferenceElement,
            ElementKind::SubmodelElementCollection => ModelType::SubmodelElementCollection,
            ElementKind::SubmodelElementList { .. } => ModelType::SubmodelElementList,
            ElementKind::Operation { .. } => ModelType::Operation,
            ElementKind::BasicEventElement { .. } => ModelType::BasicEventElement,
            ElementKind::Entity { .. } => ModelType::Entity,
            ElementKind::Capability => ModelType::Capability,
            ElementKind::Submodel { .. } => ModelType::Submodel,
        }
    }
}

/// One modeled unit of a digital twin
///
/// `id_short` is required for every element except children of a list.
/// Semantic annotations are carried opaquely. `handler` is the optional
/// read/write capability injected by whatever binds the model to live data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_short: Option<String>,
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LangString>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub display_name: Vec<LangString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,
    #[serde(skip)]
    pub handler: Option<ValueHandlerRef>,
}

impl Element {
    pub fn new(id_short: Option<String>, kind: ElementKind) -> Self {
        Self {
            id_short,
            kind,
            category: None,
            description: Vec::new(),
            display_name: Vec::new(),
            semantic_id: None,
            qualifiers: Vec::new(),
            handler: None,
        }
    }

    pub fn property(id_short: impl Into<String>, value_type: DataType, value: Value) -> Self {
        Self::new(
            Some(id_short.into()),
            ElementKind::Property {
                value_type,
                value: (!value.is_null()).then_some(value),
                value_id: None,
            },
        )
    }

    /// Property without IdShort, for use as a list child
    pub fn list_item(value_type: DataType, value: Value) -> Self {
        Self::new(
            None,
            ElementKind::Property {
                value_type,
                value: (!value.is_null()).then_some(value),
                value_id: None,
            },
        )
    }

    pub fn collection(id_short: impl Into<String>) -> Self {
        Self::new(Some(id_short.into()), ElementKind::SubmodelElementCollection)
    }

    pub fn list(id_short: impl Into<String>, type_value_list_element: ModelType) -> Self {
        Self::new(
            Some(id_short.into()),
            ElementKind::SubmodelElementList {
                type_value_list_element,
                semantic_id_list_element: None,
                value_type_list_element: None,
                order_relevant: true,
            },
        )
    }

    pub fn operation(
        id_short: impl Into<String>,
        input_variables: Vec<Element>,
        output_variables: Vec<Element>,
    ) -> Self {
        Self::new(
            Some(id_short.into()),
            ElementKind::Operation {
                input_variables,
                output_variables,
                inoutput_variables: Vec::new(),
                method: None,
            },
        )
    }

    pub fn submodel(id_short: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(Some(id_short.into()), ElementKind::Submodel { id: id.into() })
    }

    pub fn with_semantic_id(mut self, semantic_id: Reference) -> Self {
        self.semantic_id = Some(semantic_id);
        self
    }

    pub fn with_description(mut self, description: LangString) -> Self {
        self.description.push(description);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Bind a read/write handler
    pub fn with_handler(mut self, handler: Arc<dyn ValueHandler>) -> Self {
        self.handler = Some(ValueHandlerRef::new(handler));
        self
    }

    /// Bind the method handler of an operation; ignored for other kinds
    pub fn with_method(mut self, handler: Arc<dyn MethodHandler>) -> Self {
        if let ElementKind::Operation { method, .. } = &mut self.kind {
            *method = Some(MethodHandlerRef::new(handler));
        }
        self
    }

    pub fn model_type(&self) -> ModelType {
        self.kind.model_type()
    }

    pub fn id_short(&self) -> Option<&str> {
        self.id_short.as_deref()
    }

    pub fn is_container(&self) -> bool {
        self.model_type().is_container()
    }

    /// Bound method handler, for operations only
    pub fn method(&self) -> Option<&MethodHandlerRef> {
        match &self.kind {
            ElementKind::Operation { method, .. } => method.as_ref(),
            _ => None,
        }
    }

    /// In-memory value of a leaf element
    ///
    /// Container kinds, operations and capabilities carry no value of their
    /// own and return `None`.
    pub fn value(&self) -> Option<Value> {
        match &self.kind {
            ElementKind::Property { value, .. } => value.clone(),
            ElementKind::MultiLanguageProperty { value, .. } if !value.is_empty() => {
                serde_json::to_value(value).ok()
            }
            ElementKind::Range { min, max, .. } if min.is_some() || max.is_some() => {
                Some(json!({ "min": min, "max": max }))
            }
            ElementKind::Blob { value, .. } => {
                value.as_ref().map(|b| Value::String(STANDARD.encode(b)))
            }
            ElementKind::File { value, .. } => value.clone().map(Value::String),
            ElementKind::ReferenceElement { value: Some(r) } => serde_json::to_value(r).ok(),
            ElementKind::BasicEventElement { observed, .. } => serde_json::to_value(observed).ok(),
            _ => None,
        }
    }

    /// Replace the in-memory value
    ///
    /// Scalars are coerced into the declared value type.
    ///
    /// # Errors
    /// * `ValueCoercion` - If the value does not fit the declared type
    /// * `ModelTypeMismatch` - If the element kind carries no value
    /// * `Serialization` - If a structured value has the wrong shape
    pub fn set_value(&mut self, new_value: Value) -> Result<()> {
        let name = self.id_short.clone().unwrap_or_default();
        let model_type = self.model_type();
        let coercion = |value_type: &str, value: &Value| TwinError::ValueCoercion {
            parameter: name.clone(),
            value_type: value_type.to_string(),
            value: value.to_string(),
        };

        match &mut self.kind {
            ElementKind::Property {
                value_type, value, ..
            } => {
                let coerced = value_type.coerce(&name, &new_value)?;
                *value = (!coerced.is_null()).then_some(coerced);
            }
            ElementKind::MultiLanguageProperty { value, .. } => {
                *value = serde_json::from_value(new_value)?;
            }
            ElementKind::Range {
                value_type,
                min,
                max,
            } => {
                let bounds = new_value
                    .as_object()
                    .ok_or_else(|| coercion("range", &new_value))?;
                let lower = bounds.get("min").cloned().unwrap_or(Value::Null);
                let upper = bounds.get("max").cloned().unwrap_or(Value::Null);
                let lower = value_type.coerce(&name, &lower)?;
                let upper = value_type.coerce(&name, &upper)?;
                *min = (!lower.is_null()).then_some(lower);
                *max = (!upper.is_null()).then_some(upper);
            }
            ElementKind::Blob { value, .. } => {
                let encoded = new_value
                    .as_str()
                    .ok_or_else(|| coercion("base64", &new_value))?;
                let bytes = STANDARD
                    .decode(encoded)
                    .map_err(|_| coercion("base64", &new_value))?;
                *value = Some(bytes);
            }
            ElementKind::File { value, .. } => {
                let location = new_value
                    .as_str()
                    .ok_or_else(|| coercion(DataType::String.as_str(), &new_value))?;
                *value = Some(location.to_string());
            }
            ElementKind::ReferenceElement { value } => {
                *value = serde_json::from_value(new_value)?;
            }
            ElementKind::BasicEventElement { observed, .. } => {
                *observed = serde_json::from_value(new_value)?;
            }
            _ => {
                return Err(TwinError::ModelTypeMismatch {
                    expected: "value-bearing element".to_string(),
                    actual: model_type.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Overlay the metadata of `update` onto this element
    ///
    /// Values are left untouched, except that a Property or Range whose
    /// value type changes has its stored value coerced into the new type.
    /// Optional fields overlay only when set on `update`; lists overlay only
    /// when non-empty. Nothing changes when an error is returned.
    ///
    /// # Errors
    /// * `ModelTypeMismatch` - If the two elements are of different kinds
    /// * `ValueCoercion` - If the stored value does not fit a new value type
    pub fn merge_metadata(&mut self, update: &Element) -> Result<()> {
        if self.model_type() != update.model_type() {
            return Err(TwinError::ModelTypeMismatch {
                expected: self.model_type().to_string(),
                actual: update.model_type().to_string(),
            });
        }
        let retyped = self.retyped_value(update)?;

        if update.category.is_some() {
            self.category.clone_from(&update.category);
        }
        if !update.description.is_empty() {
            self.description.clone_from(&update.description);
        }
        if !update.display_name.is_empty() {
            self.display_name.clone_from(&update.display_name);
        }
        if update.semantic_id.is_some() {
            self.semantic_id.clone_from(&update.semantic_id);
        }
        if !update.qualifiers.is_empty() {
            self.qualifiers.clone_from(&update.qualifiers);
        }

        match (&mut self.kind, &update.kind) {
            (
                ElementKind::Property {
                    value_type,
                    value_id,
                    ..
                },
                ElementKind::Property {
                    value_type: new_type,
                    value_id: new_id,
                    ..
                },
            ) => {
                *value_type = *new_type;
                if new_id.is_some() {
                    value_id.clone_from(new_id);
                }
            }
            (
                ElementKind::MultiLanguageProperty { value_id, .. },
                ElementKind::MultiLanguageProperty { value_id: new_id, .. },
            ) => {
                if new_id.is_some() {
                    value_id.clone_from(new_id);
                }
            }
            (
                ElementKind::Range { value_type, .. },
                ElementKind::Range {
                    value_type: new_type,
                    ..
                },
            ) => *value_type = *new_type,
            (
                ElementKind::Blob { content_type, .. },
                ElementKind::Blob {
                    content_type: new_type,
                    ..
                },
            )
            | (
                ElementKind::File { content_type, .. },
                ElementKind::File {
                    content_type: new_type,
                    ..
                },
            ) => content_type.clone_from(new_type),
            (
                ElementKind::SubmodelElementList {
                    type_value_list_element,
                    semantic_id_list_element,
                    value_type_list_element,
                    order_relevant,
                },
                ElementKind::SubmodelElementList {
                    type_value_list_element: new_type,
                    semantic_id_list_element: new_semantic_id,
                    value_type_list_element: new_value_type,
                    order_relevant: new_order_relevant,
                },
            ) => {
                *type_value_list_element = *new_type;
                *order_relevant = *new_order_relevant;
                if new_semantic_id.is_some() {
                    semantic_id_list_element.clone_from(new_semantic_id);
                }
                if new_value_type.is_some() {
                    *value_type_list_element = *new_value_type;
                }
            }
            (
                ElementKind::Operation {
                    input_variables,
                    output_variables,
                    inoutput_variables,
                    ..
                },
                ElementKind::Operation {
                    input_variables: new_inputs,
                    output_variables: new_outputs,
                    inoutput_variables: new_inoutputs,
                    ..
                },
            ) => {
                if !new_inputs.is_empty() {
                    input_variables.clone_from(new_inputs);
                }
                if !new_outputs.is_empty() {
                    output_variables.clone_from(new_outputs);
                }
                if !new_inoutputs.is_empty() {
                    inoutput_variables.clone_from(new_inoutputs);
                }
            }
            (
                ElementKind::Entity {
                    entity_type,
                    global_asset_id,
                },
                ElementKind::Entity {
                    entity_type: new_type,
                    global_asset_id: new_asset_id,
                },
            ) => {
                *entity_type = *new_type;
                if new_asset_id.is_some() {
                    global_asset_id.clone_from(new_asset_id);
                }
            }
            (event @ ElementKind::BasicEventElement { .. }, new_event) => {
                *event = new_event.clone();
            }
            _ => {}
        }
        if let Some(value) = retyped {
            self.set_value(value)?;
        }
        Ok(())
    }

    /// Current value coerced into the value type `update` declares
    ///
    /// `None` when the type is unchanged or there is no value to carry over.
    fn retyped_value(&self, update: &Element) -> Result<Option<Value>> {
        let name = self.id_short.clone().unwrap_or_default();
        match (&self.kind, &update.kind) {
            (
                ElementKind::Property {
                    value_type,
                    value: Some(value),
                    ..
                },
                ElementKind::Property {
                    value_type: new_type,
                    ..
                },
            ) if value_type != new_type => new_type.coerce(&name, value).map(Some),
            (
                ElementKind::Range {
                    value_type,
                    min,
                    max,
                },
                ElementKind::Range {
                    value_type: new_type,
                    ..
                },
            ) if value_type != new_type && (min.is_some() || max.is_some()) => {
                let null = Value::Null;
                new_type.coerce(&name, min.as_ref().unwrap_or(&null))?;
                new_type.coerce(&name, max.as_ref().unwrap_or(&null))?;
                Ok(Some(json!({ "min": min, "max": max })))
            }
            _ => Ok(None),
        }
    }

    /// Copy of this element with identity and metadata but no value
    ///
    /// Used to build output arguments: the handler only fills in values.
    pub fn skeleton(&self) -> Element {
        let mut copy = self.clone();
        copy.handler = None;
        match &mut copy.kind {
            ElementKind::Property { value, .. } => *value = None,
            ElementKind::MultiLanguageProperty { value, .. } => value.clear(),
            ElementKind::Range { min, max, .. } => {
                *min = None;
                *max = None;
            }
            ElementKind::Blob { value, .. } => *value = None,
            ElementKind::File { value, .. } => *value = None,
            ElementKind::ReferenceElement { value } => *value = None,
            ElementKind::Operation { method, .. } => *method = None,
            _ => {}
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_kinds() {
        assert!(ModelType::SubmodelElementCollection.is_container());
        assert!(ModelType::SubmodelElementList.is_container());
        assert!(ModelType::Entity.is_container());
        assert!(!ModelType::Property.is_container());
        assert!(!ModelType::Operation.is_container());
    }

    #[test]
    fn test_set_value_coerces_into_declared_type() {
        let mut temp = Element::property("Temp", DataType::Double, json!(20.0));
        temp.set_value(json!("21.5")).unwrap();
        assert_eq!(temp.value(), Some(json!(21.5)));
    }

    #[test]
    fn test_set_value_on_collection_fails() {
        let mut coll = Element::collection("Measurements");
        let err = coll.set_value(json!(1)).unwrap_err();
        assert!(matches!(err, TwinError::ModelTypeMismatch { .. }));
    }

    #[test]
    fn test_blob_value_is_base64() {
        let mut blob = Element::new(
            Some("Firmware".to_string()),
            ElementKind::Blob {
                content_type: "application/octet-stream".to_string(),
                value: None,
            },
        );
        blob.set_value(json!("AAEC")).unwrap();
        assert_eq!(blob.value(), Some(json!("AAEC")));
        assert!(blob.set_value(json!("%%%")).is_err());
    }

    #[test]
    fn test_merge_metadata_rejects_other_kind() {
        let mut prop = Element::property("Temp", DataType::Double, json!(1.0));
        let err = prop
            .merge_metadata(&Element::collection("Temp"))
            .unwrap_err();
        assert!(matches!(err, TwinError::ModelTypeMismatch { .. }));
    }

    #[test]
    fn test_merge_metadata_keeps_value_and_overlays_annotations() {
        let mut prop = Element::property("Temp", DataType::Double, json!(1.0));
        let update = Element::property("Temp", DataType::Double, Value::Null)
            .with_category("PARAMETER")
            .with_semantic_id(Reference::external("urn:temp"));
        prop.merge_metadata(&update).unwrap();

        assert_eq!(prop.value(), Some(json!(1.0)));
        assert_eq!(prop.category.as_deref(), Some("PARAMETER"));
        assert_eq!(
            prop.semantic_id.as_ref().and_then(|r| r.first_value()),
            Some("urn:temp")
        );
    }

    #[test]
    fn test_merge_metadata_recoerces_property_value() {
        let mut count = Element::property("Count", DataType::Int, json!(5));
        count
            .merge_metadata(&Element::property("Count", DataType::String, Value::Null))
            .unwrap();
        assert_eq!(count.value(), Some(json!("5")));

        let mut count = Element::property("Count", DataType::Int, json!(5));
        let err = count
            .merge_metadata(
                &Element::property("Count", DataType::Boolean, Value::Null).with_category("X"),
            )
            .unwrap_err();
        assert!(matches!(err, TwinError::ValueCoercion { .. }));
        assert_eq!(count.category, None);
        assert!(matches!(
            count.kind,
            ElementKind::Property {
                value_type: DataType::Int,
                ..
            }
        ));
    }

    #[test]
    fn test_range_without_bounds_has_no_value() {
        let mut range = Element::new(
            Some("Band".to_string()),
            ElementKind::Range {
                value_type: DataType::Int,
                min: None,
                max: None,
            },
        );
        assert_eq!(range.value(), None);
        range.set_value(json!({ "min": 1, "max": 9 })).unwrap();
        assert_eq!(range.value(), Some(json!({ "min": 1, "max": 9 })));
    }

    #[test]
    fn test_skeleton_drops_value_but_keeps_identity() {
        let result = Element::property("Result", DataType::Int, json!(7))
            .with_semantic_id(Reference::external("urn:result"));
        let skeleton = result.skeleton();
        assert_eq!(skeleton.id_short(), Some("Result"));
        assert_eq!(skeleton.value(), None);
        assert_eq!(skeleton.semantic_id, result.semantic_id);
    }

    #[test]
    fn test_json_shape_uses_model_type_tag() {
        let prop = Element::property("Temp", DataType::Double, json!(21.5));
        let json = serde_json::to_value(&prop).unwrap();
        assert_eq!(json["modelType"], "Property");
        assert_eq!(json["valueType"], "xs:double");
        assert_eq!(json["idShort"], "Temp");

        let back: Element = serde_json::from_value(json).unwrap();
        assert_eq!(back, prop);
    }
}
