use crate::container::ElementContainer;
use crate::errors::Result;

use super::element::{Element, ElementKind, LangString};
use super::reference::{Key, KeyType, Reference};

/// Identifiable model owning a tree of submodel elements
///
/// Every node of `submodel_elements` shares this submodel's key as its
/// logical owner.
#[derive(Debug, Clone)]
pub struct Submodel {
    pub id: String,
    pub id_short: String,
    pub semantic_id: Option<Reference>,
    pub description: Vec<LangString>,
    pub submodel_elements: ElementContainer,
}

impl Submodel {
    pub fn new(id_short: impl Into<String>, id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            submodel_elements: ElementContainer::new(Some(Key::new(KeyType::Submodel, id.clone()))),
            id,
            id_short: id_short.into(),
            semantic_id: None,
            description: Vec::new(),
        }
    }

    /// Submodel populated with top-level elements in order
    ///
    /// # Errors
    /// Same as [`ElementContainer::create`].
    pub fn with_elements(
        id_short: impl Into<String>,
        id: impl Into<String>,
        elements: impl IntoIterator<Item = Element>,
    ) -> Result<Self> {
        let mut submodel = Self::new(id_short, id);
        for element in elements {
            submodel.submodel_elements.create(element)?;
        }
        Ok(submodel)
    }

    pub fn with_semantic_id(mut self, semantic_id: Reference) -> Self {
        self.semantic_id = Some(semantic_id);
        self
    }

    pub fn key(&self) -> Key {
        Key::new(KeyType::Submodel, self.id.clone())
    }

    /// Model reference a shell records for this submodel
    pub fn reference(&self) -> Reference {
        Reference::model(vec![self.key()])
    }

    /// Element form used when attaching the submodel under a shell
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(
            Some(self.id_short.clone()),
            ElementKind::Submodel {
                id: self.id.clone(),
            },
        );
        element.semantic_id.clone_from(&self.semantic_id);
        element.description.clone_from(&self.description);
        element
    }
}

/// Identifiable shell whose container holds its submodels
///
/// Attaching a submodel records its reference on the shell; removing it
/// drops the reference.
#[derive(Debug, Clone)]
pub struct AssetAdministrationShell {
    pub id: String,
    pub id_short: String,
    submodels: ElementContainer,
}

impl AssetAdministrationShell {
    pub fn new(id_short: impl Into<String>, id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            submodels: ElementContainer::new(Some(Key::new(
                KeyType::AssetAdministrationShell,
                id.clone(),
            ))),
            id,
            id_short: id_short.into(),
        }
    }

    pub fn key(&self) -> Key {
        Key::new(KeyType::AssetAdministrationShell, self.id.clone())
    }

    pub fn submodels(&self) -> &ElementContainer {
        &self.submodels
    }

    pub fn submodels_mut(&mut self) -> &mut ElementContainer {
        &mut self.submodels
    }

    pub fn submodel_references(&self) -> &[Reference] {
        self.submodels.submodel_references()
    }
}
