//! Create, update and delete on the element container
//!
//! Every operation validates before it touches the arena, so a failed call
//! leaves the tree unchanged.

use tracing::debug;

use super::events::{ContainerEvent, ContainerEventKind};
use super::{ElementContainer, Node, NodeId};
use crate::errors::{Result, TwinError};
use crate::model::{Element, ElementKind, Key, KeyType, Reference};
use crate::path::{child_path, validate_id_short, IdShortPath, PathSegment};

fn display_path(path: &str) -> String {
    if path.is_empty() {
        ".".to_string()
    } else {
        path.to_string()
    }
}

impl ElementContainer {
    /// Add `element` as a direct child of the root
    ///
    /// # Errors
    /// * `ListChildHasIdShort` / `MissingIdShort` / `InvalidIdShort` - If
    ///   the identity style does not match the parent kind
    /// * `DuplicateIdShort` - If a sibling with the same IdShort exists
    /// * `NotAContainer` - If the root holds a leaf element
    pub fn create(&mut self, element: Element) -> Result<Element> {
        self.create_under(self.root_id(), element)
    }

    /// Add `element` as a child of the node at `path`; `.` means the root
    ///
    /// # Errors
    /// * `ParentNotFound` - If `path` does not resolve
    /// * Same as [`ElementContainer::create`] otherwise
    pub fn create_at(&mut self, path: &str, element: Element) -> Result<Element> {
        let parent = self.resolve_parent(path)?;
        self.create_under(parent, element)
    }

    /// Attach a pre-built subtree under the node at `path`
    ///
    /// If the subtree root carries a value it becomes the new child; if not,
    /// each of its top-level children is attached. Paths of every attached
    /// node are recomputed relative to the new parent.
    ///
    /// # Errors
    /// * `ParentNotFound` - If `path` does not resolve
    /// * Same as [`ElementContainer::create`] for each attached top-level node
    pub fn create_subtree(&mut self, path: &str, subtree: &ElementContainer) -> Result<Vec<Element>> {
        let parent = self.resolve_parent(path)?;
        let source_root = subtree.root_id();
        let tops: Vec<NodeId> = match subtree.expect_node(source_root)?.value {
            Some(_) => vec![source_root],
            None => subtree.expect_node(source_root)?.children.clone(),
        };

        let mut incoming: Vec<Element> = Vec::with_capacity(tops.len());
        for &top in &tops {
            let element = subtree
                .expect_node(top)?
                .value
                .clone()
                .ok_or_else(|| TwinError::Internal {
                    message: "subtree node without value".to_string(),
                })?;
            self.check_child(parent, &element, None)?;
            if let Some(id) = element.id_short() {
                if incoming.iter().any(|e| e.id_short() == Some(id)) {
                    return Err(TwinError::DuplicateIdShort {
                        id_short: id.to_string(),
                        parent: display_path(&self.expect_node(parent)?.path),
                    });
                }
            }
            incoming.push(element);
        }

        let mut attached = Vec::with_capacity(tops.len());
        for top in tops {
            let index = self.expect_node(parent)?.children.len();
            let id = self.copy_nodes(subtree, top, parent, index)?;
            self.expect_node_mut(parent)?.children.push(id);
            self.rebase(id)?;
            let element = self.after_insert(parent, id)?;
            attached.push(element);
        }
        Ok(attached)
    }

    /// Replace the element at `path` in place
    ///
    /// Position is preserved. The children of a container are kept when the
    /// replacement is of the same container kind and dropped otherwise. A
    /// changed IdShort recomputes the paths of the whole subtree. The path
    /// `.` creates under the root instead.
    ///
    /// # Errors
    /// * `ElementNotFound` - If nothing resolves at `path`
    /// * `DuplicateIdShort` - If a rename collides with a sibling
    /// * Identity-style validation errors as for [`ElementContainer::create`]
    pub fn update(&mut self, path: &str, mut element: Element) -> Result<Element> {
        let parsed = IdShortPath::parse(path)?;
        if parsed.is_this() {
            return self.create(element);
        }

        let id = self.resolve_id(&parsed)?;
        let parent = self
            .expect_node(id)?
            .parent
            .ok_or_else(|| TwinError::CannotModifyRoot {
                action: "updated".to_string(),
            })?;
        self.check_child(parent, &element, Some(id))?;
        if self.is_list_node(parent) {
            element.id_short = None;
        }

        let old_reference = self.submodel_reference_at(id)?;
        let node = self.expect_node(id)?;
        let old_type = node.value.as_ref().map(Element::model_type);
        let keep_children = old_type == Some(element.model_type()) && element.is_container();
        let renamed = node.id_short() != element.id_short();
        let dropped: Vec<NodeId> = if keep_children {
            Vec::new()
        } else {
            node.children.clone()
        };

        for child in dropped {
            self.release(child);
        }
        let node = self.expect_node_mut(id)?;
        if !keep_children {
            node.children.clear();
        }
        node.value = Some(element.clone());
        if renamed {
            self.rebase(id)?;
        }

        if let Some(reference) = old_reference {
            self.drop_submodel_reference(&reference);
        }
        if let Some(reference) = self.submodel_reference_for(parent, &element) {
            self.push_submodel_reference(reference);
        }

        let node = self.expect_node(id)?;
        let parent_path = self.expect_node(parent)?.path.clone();
        debug!(path = %node.path, model_type = %element.model_type(), "element updated");
        self.notify(ContainerEvent::new(
            ContainerEventKind::Updated,
            parent_path,
            node.identity(),
        ));
        Ok(element)
    }

    /// Overlay the metadata of `update` onto the element at `path`
    ///
    /// See [`Element::merge_metadata`]. Identity is not touched. A list may
    /// only change its item type when every current item has the new type.
    ///
    /// # Errors
    /// * `ElementNotFound` - If nothing resolves at `path`
    /// * `ModelTypeMismatch` - If `update` is of a different kind, or a list
    ///   item does not match the new item type
    /// * `ValueCoercion` - If the stored value does not fit a new value type
    pub fn merge_metadata(&mut self, path: &str, update: &Element) -> Result<()> {
        let id = self.resolve_id(&IdShortPath::parse(path)?)?;
        let node = self.expect_node(id)?;
        if let ElementKind::SubmodelElementList {
            type_value_list_element,
            ..
        } = &update.kind
        {
            let mismatch = node
                .children
                .iter()
                .filter_map(|c| self.node(*c).and_then(|n| n.value.as_ref()))
                .map(Element::model_type)
                .find(|t| t != type_value_list_element);
            if let Some(actual) = mismatch {
                return Err(TwinError::ModelTypeMismatch {
                    expected: type_value_list_element.to_string(),
                    actual: actual.to_string(),
                });
            }
        }

        let parent = node.parent;
        let identity = node.identity();
        let node = self.expect_node_mut(id)?;
        let element = node.value.as_mut().ok_or_else(|| TwinError::ElementNotFound {
            path: path.to_string(),
        })?;
        element.merge_metadata(update)?;
        debug!(path, model_type = %update.model_type(), "element metadata merged");

        if let Some(parent) = parent {
            let parent_path = self.expect_node(parent)?.path.clone();
            self.notify(ContainerEvent::new(
                ContainerEventKind::Updated,
                parent_path,
                identity,
            ));
        }
        Ok(())
    }

    /// Update if the addressed element exists, create otherwise
    ///
    /// * `.` updates the same-named child of the root, or creates it.
    /// * A path whose last segment equals the element's IdShort updates that
    ///   node if present, or creates under the path's parent.
    /// * An index path updates the list child it addresses.
    /// * Any other path addresses the parent to create under.
    ///
    /// # Errors
    /// * `ParentNotFound` - If the node to create under does not resolve
    /// * Same as [`ElementContainer::create`] and [`ElementContainer::update`]
    pub fn create_or_update(&mut self, path: &str, element: Element) -> Result<Element> {
        let parsed = IdShortPath::parse(path)?;

        if parsed.is_this() {
            if let Some(id_short) = element.id_short().map(str::to_string) {
                if !self.is_list_node(self.root_id())
                    && self.resolve_id(&IdShortPath::parse(&id_short)?).is_ok()
                {
                    return self.update(&id_short, element);
                }
            }
            return self.create(element);
        }

        if let Some((parent_path, last)) = parsed.split_last() {
            let updates_in_place = match last {
                PathSegment::Name(name) => element.id_short() == Some(name.as_str()),
                PathSegment::Index(_) => element.id_short().is_none(),
            };
            if updates_in_place {
                if self.resolve_id(&parsed).is_ok() {
                    return self.update(path, element);
                }
                let parent = self
                    .resolve_id(&parent_path)
                    .map_err(|_| TwinError::ParentNotFound {
                        path: parent_path.to_string(),
                    })?;
                return self.create_under(parent, element);
            }
        }

        self.create_at(path, element)
    }

    /// Remove the element at `path` from its parent
    ///
    /// # Errors
    /// * `ElementNotFound` - If nothing resolves at `path`
    /// * `CannotModifyRoot` - If `path` is `.`
    pub fn delete(&mut self, path: &str) -> Result<()> {
        let parsed = IdShortPath::parse(path)?;
        if parsed.is_this() {
            return Err(TwinError::CannotModifyRoot {
                action: "deleted".to_string(),
            });
        }
        let id = self.resolve_id(&parsed)?;
        let node = self.expect_node(id)?;
        let parent = node.parent.ok_or_else(|| TwinError::CannotModifyRoot {
            action: "deleted".to_string(),
        })?;
        let identity = node.identity();
        self.remove_child(parent, &identity)?;
        Ok(())
    }

    /// Remove children of the node at `parent_path` by identity
    ///
    /// For a list parent, children whose index equals `identity` are removed
    /// and the rest are renumbered densely from 0. For other parents the
    /// child with IdShort `identity` is removed. Returns how many children
    /// were removed; a Deleted event is raised either way.
    ///
    /// # Errors
    /// * `ElementNotFound` - If `parent_path` does not resolve
    pub fn remove(&mut self, parent_path: &str, identity: &str) -> Result<usize> {
        let parsed = IdShortPath::parse(parent_path)?;
        let parent = self.resolve_id(&parsed)?;
        self.remove_child(parent, identity)
    }

    // ===== Internals =====

    fn resolve_parent(&self, path: &str) -> Result<NodeId> {
        let parsed = IdShortPath::parse(path)?;
        self.resolve_id(&parsed)
            .map_err(|_| TwinError::ParentNotFound {
                path: path.to_string(),
            })
    }

    pub(crate) fn create_under(&mut self, parent: NodeId, mut element: Element) -> Result<Element> {
        self.check_child(parent, &element, None)?;
        let parent_node = self.expect_node(parent)?;
        let parent_is_list = parent_node.is_list();
        let index = parent_node.children.len();
        if parent_is_list {
            element.id_short = None;
        }
        let path = child_path(
            &parent_node.path,
            parent_is_list,
            element.id_short(),
            index,
        );

        let mut node = Node::new(Some(element), Some(parent));
        node.index = index;
        node.path = path;
        let id = self.alloc(node);
        self.expect_node_mut(parent)?.children.push(id);
        self.after_insert(parent, id)
    }

    /// Bookkeeping shared by every insertion: shell submodel references,
    /// logging and the Created event
    fn after_insert(&mut self, parent: NodeId, id: NodeId) -> Result<Element> {
        let node = self.expect_node(id)?;
        let element = node.value.clone().ok_or_else(|| TwinError::Internal {
            message: "inserted node without value".to_string(),
        })?;
        let identity = node.identity();
        debug!(path = %node.path, model_type = %element.model_type(), "element created");

        if let Some(reference) = self.submodel_reference_for(parent, &element) {
            self.push_submodel_reference(reference);
        }
        let parent_path = self.expect_node(parent)?.path.clone();
        self.notify(ContainerEvent::new(
            ContainerEventKind::Created,
            parent_path,
            identity,
        ));
        Ok(element)
    }

    /// Validate `element` as a child of `parent`, ignoring `replacing` when
    /// checking sibling uniqueness
    fn check_child(&self, parent: NodeId, element: &Element, replacing: Option<NodeId>) -> Result<()> {
        let parent_node = self.expect_node(parent)?;
        let parent_path = display_path(&parent_node.path);

        if let Some(value) = &parent_node.value {
            if !value.is_container() {
                return Err(TwinError::NotAContainer {
                    path: parent_path,
                    model_type: value.model_type().to_string(),
                });
            }
        }

        if parent_node.is_list() {
            if let Some(id_short) = element.id_short().filter(|s| !s.is_empty()) {
                return Err(TwinError::ListChildHasIdShort {
                    id_short: id_short.to_string(),
                });
            }
            if let Some(ElementKind::SubmodelElementList {
                type_value_list_element,
                ..
            }) = parent_node.value.as_ref().map(|v| &v.kind)
            {
                if element.model_type() != *type_value_list_element {
                    return Err(TwinError::ModelTypeMismatch {
                        expected: type_value_list_element.to_string(),
                        actual: element.model_type().to_string(),
                    });
                }
            }
            return Ok(());
        }

        let id_short = element
            .id_short()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TwinError::MissingIdShort {
                parent: parent_path.clone(),
            })?;
        validate_id_short(id_short)?;
        let taken = parent_node
            .children
            .iter()
            .filter(|c| Some(**c) != replacing)
            .any(|c| self.node(*c).and_then(Node::id_short) == Some(id_short));
        if taken {
            return Err(TwinError::DuplicateIdShort {
                id_short: id_short.to_string(),
                parent: parent_path,
            });
        }
        Ok(())
    }

    pub(crate) fn remove_child(&mut self, parent: NodeId, identity: &str) -> Result<usize> {
        let parent_node = self.expect_node(parent)?;
        let is_list = parent_node.is_list();
        let parent_path = parent_node.path.clone();

        let (removed, kept): (Vec<NodeId>, Vec<NodeId>) =
            parent_node.children.iter().copied().partition(|c| {
                self.node(*c).is_some_and(|n| {
                    if is_list {
                        n.index.to_string() == identity
                    } else {
                        n.id_short() == Some(identity)
                    }
                })
            });

        for &id in &removed {
            if let Some(reference) = self.submodel_reference_at(id)? {
                self.drop_submodel_reference(&reference);
            }
            self.release(id);
        }
        self.expect_node_mut(parent)?.children = kept.clone();

        if is_list {
            for (i, child) in kept.into_iter().enumerate() {
                self.expect_node_mut(child)?.index = i;
                self.rebase(child)?;
            }
        }

        debug!(parent = %display_path(&parent_path), identity, removed = removed.len(), "element removed");
        self.notify(ContainerEvent::new(
            ContainerEventKind::Deleted,
            parent_path,
            identity,
        ));
        Ok(removed.len())
    }

    /// Recompute the path of `id` and all its descendants from the parent's
    /// path, using bracket segments below lists and dot segments elsewhere
    pub(crate) fn rebase(&mut self, id: NodeId) -> Result<()> {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(parent) = self.expect_node(current)?.parent else {
                continue;
            };
            let parent_node = self.expect_node(parent)?;
            let parent_path = parent_node.path.clone();
            let parent_is_list = parent_node.is_list();

            let node = self.expect_node_mut(current)?;
            let path = child_path(&parent_path, parent_is_list, node.id_short(), node.index);
            node.path = path;
            stack.extend(node.children.iter().copied());
        }
        Ok(())
    }

    fn copy_nodes(
        &mut self,
        source: &ElementContainer,
        source_id: NodeId,
        parent: NodeId,
        index: usize,
    ) -> Result<NodeId> {
        let source_node = source.expect_node(source_id)?;
        let mut node = Node::new(source_node.value.clone(), Some(parent));
        node.index = index;
        let id = self.alloc(node);
        for (i, &child) in source_node.children.iter().enumerate() {
            let copied = self.copy_nodes(source, child, id, i)?;
            self.expect_node_mut(id)?.children.push(copied);
        }
        Ok(id)
    }

    /// Submodel reference to record when `element` is attached under
    /// `parent`: only submodels placed directly below a shell's root
    fn submodel_reference_for(&self, parent: NodeId, element: &Element) -> Option<Reference> {
        let owned_by_shell = self
            .owner()
            .is_some_and(|k| k.key_type == KeyType::AssetAdministrationShell);
        match &element.kind {
            ElementKind::Submodel { id } if owned_by_shell && parent == self.root_id() => {
                Some(Reference::model(vec![Key::new(KeyType::Submodel, id.clone())]))
            }
            _ => None,
        }
    }

    fn submodel_reference_at(&self, id: NodeId) -> Result<Option<Reference>> {
        let node = self.expect_node(id)?;
        Ok(match (node.parent, node.value.as_ref()) {
            (Some(parent), Some(element)) => self.submodel_reference_for(parent, element),
            _ => None,
        })
    }
}
