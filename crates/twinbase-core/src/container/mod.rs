//! Element container tree engine
//!
//! Nodes live in an arena and refer to each other by `NodeId`. Parent links
//! are handles, never owning references, so walking to the root is O(1) per
//! step without reference cycles.
//!
//! The container is not internally synchronized. Callers serialize mutations
//! per model (the engine services hold it behind a lock).

pub mod events;
pub mod mutation;
pub mod references;

use std::sync::Arc;
use tracing::debug;

use crate::errors::{Result, TwinError};
use crate::model::{Element, Key, ModelType};
use crate::path::{IdShortPath, PathSegment};

pub use events::{ContainerEvent, ContainerEventKind, ContainerObserver};

/// Stable handle of a node inside one container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) value: Option<Element>,
    pub(crate) index: usize,
    pub(crate) path: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    fn new(value: Option<Element>, parent: Option<NodeId>) -> Self {
        Self {
            value,
            index: 0,
            path: String::new(),
            parent,
            children: Vec::new(),
        }
    }

    fn is_list(&self) -> bool {
        self.value
            .as_ref()
            .is_some_and(|v| v.model_type().is_list())
    }

    fn id_short(&self) -> Option<&str> {
        self.value.as_ref().and_then(Element::id_short)
    }

    /// Identity among siblings: IdShort, or the index for list children
    fn identity(&self) -> String {
        self.id_short()
            .map(str::to_string)
            .unwrap_or_else(|| self.index.to_string())
    }
}

/// Ownership tree of elements below one structural root
///
/// The root may carry a value (a standalone collection or list built before
/// being attached) or none (the element store of a submodel or shell).
/// `owner` is the key of the identifiable object the tree belongs to; it is
/// shared by every node.
#[derive(Clone)]
pub struct ElementContainer {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    root: NodeId,
    owner: Option<Key>,
    submodel_references: Vec<crate::model::Reference>,
    observers: Vec<Arc<dyn ContainerObserver>>,
}

impl std::fmt::Debug for ElementContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementContainer")
            .field("owner", &self.owner)
            .field("len", &self.len())
            .field("submodel_references", &self.submodel_references)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for ElementContainer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ElementContainer {
    /// Empty container without a root value
    pub fn new(owner: Option<Key>) -> Self {
        Self {
            nodes: vec![Some(Node::new(None, None))],
            free: Vec::new(),
            root: NodeId(0),
            owner,
            submodel_references: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Container whose root holds `element`, used to build a subtree
    /// before attaching it elsewhere
    pub fn with_root(owner: Option<Key>, element: Element) -> Self {
        let mut container = Self::new(owner);
        if let Some(root) = container.nodes[0].as_mut() {
            root.value = Some(element);
        }
        container
    }

    /// Container populated with top-level elements in order
    ///
    /// # Errors
    /// Same as [`ElementContainer::create`].
    pub fn from_elements(
        owner: Option<Key>,
        elements: impl IntoIterator<Item = Element>,
    ) -> Result<Self> {
        let mut container = Self::new(owner);
        for element in elements {
            container.create(element)?;
        }
        Ok(container)
    }

    pub fn owner(&self) -> Option<&Key> {
        self.owner.as_ref()
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            container: self,
            id: self.root,
        }
    }

    /// Number of nodes below the root
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.node(self.root)
            .map(|n| n.children.is_empty())
            .unwrap_or(true)
    }

    /// Submodel references recorded on a shell-owned container
    pub fn submodel_references(&self) -> &[crate::model::Reference] {
        &self.submodel_references
    }

    /// Register an observer for create, update and delete events
    pub fn subscribe(&mut self, observer: Arc<dyn ContainerObserver>) {
        self.observers.push(observer);
    }

    pub(crate) fn notify(&self, event: ContainerEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub(crate) fn expect_node(&self, id: NodeId) -> Result<&Node> {
        self.node(id).ok_or_else(|| TwinError::Internal {
            message: format!("dangling node handle {}", id.0),
        })
    }

    pub(crate) fn expect_node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.node_mut(id).ok_or_else(|| TwinError::Internal {
            message: format!("dangling node handle {}", id.0),
        })
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Release a node and all of its descendants
    pub(crate) fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                stack.extend(node.children);
                self.free.push(current.0);
            }
        }
    }

    pub(crate) fn is_list_node(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(Node::is_list)
    }

    pub(crate) fn root_id(&self) -> NodeId {
        self.root
    }

    pub(crate) fn push_submodel_reference(&mut self, reference: crate::model::Reference) -> bool {
        if self.submodel_references.contains(&reference) {
            return false;
        }
        self.submodel_references.push(reference);
        true
    }

    pub(crate) fn drop_submodel_reference(&mut self, reference: &crate::model::Reference) {
        self.submodel_references.retain(|r| r != reference);
    }

    // ===== Addressing =====

    /// Resolve a parsed path to a node handle
    ///
    /// # Errors
    /// * `ElementNotFound` - If a segment matches no child, an index is out
    ///   of range, or the segment style does not match the parent kind
    pub fn resolve_id(&self, path: &IdShortPath) -> Result<NodeId> {
        let not_found = || TwinError::ElementNotFound {
            path: path.to_string(),
        };

        let mut current = self.root;
        for segment in path.segments() {
            let node = self.expect_node(current)?;
            let is_list = node.is_list();
            current = match segment {
                PathSegment::Index(i) if is_list => {
                    node.children.get(*i).copied().ok_or_else(not_found)?
                }
                PathSegment::Name(name) if !is_list => node
                    .children
                    .iter()
                    .copied()
                    .find(|c| self.node(*c).and_then(Node::id_short) == Some(name.as_str()))
                    .ok_or_else(not_found)?,
                _ => return Err(not_found()),
            };
        }
        Ok(current)
    }

    /// Resolve a path string to a node
    ///
    /// # Errors
    /// * `InvalidPath` - If the path is malformed
    /// * `ElementNotFound` - If nothing resolves at the path
    pub fn resolve(&self, path: &str) -> Result<NodeRef<'_>> {
        let parsed = IdShortPath::parse(path)?;
        let id = self.resolve_id(&parsed)?;
        Ok(NodeRef {
            container: self,
            id,
        })
    }

    // ===== Queries =====

    /// Element at a path
    ///
    /// # Errors
    /// * `ElementNotFound` - If nothing resolves, or the root addressed by
    ///   `.` carries no value
    pub fn retrieve(&self, path: &str) -> Result<&Element> {
        let node = self.resolve(path)?;
        debug!(path, "retrieve element");
        node.element().ok_or_else(|| TwinError::ElementNotFound {
            path: path.to_string(),
        })
    }

    /// Mutable access to the element at a path
    ///
    /// Identity changes through this handle are not checked; use
    /// [`ElementContainer::update`] to rename.
    ///
    /// # Errors
    /// * `ElementNotFound` - If nothing resolves at the path
    pub fn retrieve_mut(&mut self, path: &str) -> Result<&mut Element> {
        let parsed = IdShortPath::parse(path)?;
        let id = self.resolve_id(&parsed)?;
        self.node_mut(id)
            .and_then(|n| n.value.as_mut())
            .ok_or_else(|| TwinError::ElementNotFound {
                path: path.to_string(),
            })
    }

    /// Direct children of the root, in insertion order
    ///
    /// An empty container yields an empty vector, not an error.
    pub fn retrieve_all(&self) -> Vec<&Element> {
        self.root().children().filter_map(|c| c.element()).collect()
    }

    /// Direct children of the root matching `predicate`
    pub fn retrieve_all_where<P>(&self, predicate: P) -> Vec<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        self.retrieve_all()
            .into_iter()
            .filter(|e| predicate(e))
            .collect()
    }

    /// Direct children of the node at `path`
    ///
    /// # Errors
    /// * `ElementNotFound` - If nothing resolves at the path
    pub fn children_of(&self, path: &str) -> Result<Vec<NodeRef<'_>>> {
        Ok(self.resolve(path)?.children().collect())
    }

    /// Lazy pre-order sequence of every element below and including the root
    pub fn flatten(&self) -> Flatten<'_> {
        self.root().flatten()
    }

    /// Call `visitor` for every node in pre-order without materializing a
    /// sequence
    pub fn traverse<F>(&self, mut visitor: F)
    where
        F: FnMut(NodeRef<'_>),
    {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.node(id) {
                visitor(NodeRef {
                    container: self,
                    id,
                });
                stack.extend(node.children.iter().rev().copied());
            }
        }
    }

    pub(crate) fn model_type_of(&self, id: NodeId) -> Option<ModelType> {
        self.node(id)
            .and_then(|n| n.value.as_ref())
            .map(Element::model_type)
    }
}

/// Borrowed view of one node
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    container: &'a ElementContainer,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn node(&self) -> Option<&'a Node> {
        self.container.node(self.id)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn element(&self) -> Option<&'a Element> {
        self.node().and_then(|n| n.value.as_ref())
    }

    /// Fully qualified path from the container root; empty for the root
    pub fn path(&self) -> &'a str {
        self.node().map(|n| n.path.as_str()).unwrap_or_default()
    }

    /// Position among siblings
    pub fn index(&self) -> usize {
        self.node().map(|n| n.index).unwrap_or_default()
    }

    pub fn id_short(&self) -> Option<&'a str> {
        self.node().and_then(Node::id_short)
    }

    pub fn is_list(&self) -> bool {
        self.node().is_some_and(Node::is_list)
    }

    pub fn is_root(&self) -> bool {
        self.id == self.container.root
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node().and_then(|n| n.parent).map(|id| NodeRef {
            container: self.container,
            id,
        })
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let container = self.container;
        self.node()
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&id| NodeRef { container, id })
    }

    pub fn child_count(&self) -> usize {
        self.node().map(|n| n.children.len()).unwrap_or_default()
    }

    /// Lazy pre-order sequence of element values in this subtree
    pub fn flatten(&self) -> Flatten<'a> {
        Flatten {
            container: self.container,
            stack: vec![self.id],
        }
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("path", &self.path())
            .field("index", &self.index())
            .finish()
    }
}

/// Pre-order iterator over element values; nodes without a value are skipped
pub struct Flatten<'a> {
    container: &'a ElementContainer,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            let Some(node) = self.container.node(id) else {
                continue;
            };
            self.stack.extend(node.children.iter().rev().copied());
            if let Some(value) = node.value.as_ref() {
                return Some(value);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataType;
    use serde_json::json;

    fn sample() -> ElementContainer {
        let mut container = ElementContainer::new(None);
        container
            .create(Element::collection("Measurements"))
            .unwrap();
        container
            .create_at(
                "Measurements",
                Element::property("Temp", DataType::Double, json!(21.5)),
            )
            .unwrap();
        container
            .create(Element::list("Readings", ModelType::Property))
            .unwrap();
        container
            .create_at("Readings", Element::list_item(DataType::Int, json!(1)))
            .unwrap();
        container
    }

    #[test]
    fn test_retrieve_all_on_empty_is_empty() {
        let container = ElementContainer::new(None);
        assert!(container.retrieve_all().is_empty());
        assert!(container.is_empty());
    }

    #[test]
    fn test_resolve_named_and_indexed() {
        let container = sample();
        assert_eq!(
            container.resolve("Measurements.Temp").unwrap().path(),
            "Measurements.Temp"
        );
        assert_eq!(container.resolve("Readings[0]").unwrap().path(), "Readings[0]");
    }

    #[test]
    fn test_segment_style_must_match_parent_kind() {
        let container = sample();
        assert!(matches!(
            container.resolve("Measurements[0]"),
            Err(TwinError::ElementNotFound { .. })
        ));
        assert!(matches!(
            container.resolve("Readings.Temp"),
            Err(TwinError::ElementNotFound { .. })
        ));
    }

    #[test]
    fn test_root_without_value_is_not_retrievable() {
        let container = sample();
        assert!(container.resolve(".").unwrap().is_root());
        assert!(container.retrieve(".").is_err());
    }

    #[test]
    fn test_flatten_is_pre_order() {
        let container = sample();
        let ids: Vec<String> = container
            .flatten()
            .map(|e| e.id_short().unwrap_or("#").to_string())
            .collect();
        assert_eq!(ids, vec!["Measurements", "Temp", "Readings", "#"]);
    }

    #[test]
    fn test_traverse_visits_every_node() {
        let container = sample();
        let mut paths = Vec::new();
        container.traverse(|n| paths.push(n.path().to_string()));
        assert_eq!(
            paths,
            vec!["", "Measurements", "Measurements.Temp", "Readings", "Readings[0]"]
        );
    }

    #[test]
    fn test_retrieve_all_where() {
        let container = sample();
        let lists = container.retrieve_all_where(|e| e.model_type().is_list());
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].id_short(), Some("Readings"));
    }
}
