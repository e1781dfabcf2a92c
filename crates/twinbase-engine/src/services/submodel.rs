use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;

use twinbase_core::container::{ContainerObserver, ElementContainer, NodeRef};
use twinbase_core::model::{Element, ModelType, Reference, Submodel};
use twinbase_core::pagination::{paginate, PagedResult};
use twinbase_core::{apply, ContainerCommand, Result, TwinError};
use twinbase_core_types::CorrelationId;
use twinbase_invocation::{InvocationEngine, InvocationRequest, InvocationResponse};

use super::{logged, page_params};
use crate::settings::{EngineSettings, PaginationSection};

/// Operations on the elements of one submodel
///
/// Paths are IdShort paths relative to the submodel; `.` addresses the
/// submodel's top level.
pub struct SubmodelService {
    submodel: RwLock<Submodel>,
    invocation: InvocationEngine,
    pagination: PaginationSection,
}

impl SubmodelService {
    pub fn new(submodel: Submodel) -> Self {
        Self::with_settings(submodel, &EngineSettings::default())
    }

    pub fn with_settings(submodel: Submodel, settings: &EngineSettings) -> Self {
        Self {
            submodel: RwLock::new(submodel),
            invocation: InvocationEngine::new(settings.invocation_settings()),
            pagination: settings.pagination.clone(),
        }
    }

    pub fn submodel_id(&self) -> String {
        self.submodel.read().id.clone()
    }

    /// Copy of the current submodel
    pub fn snapshot(&self) -> Submodel {
        self.submodel.read().clone()
    }

    pub fn subscribe(&self, observer: Arc<dyn ContainerObserver>) {
        self.submodel.write().submodel_elements.subscribe(observer);
    }

    // ===== Elements =====

    /// Page through the children of the element at `path`
    ///
    /// # Errors
    /// * `ElementNotFound` - If nothing resolves at `path`
    /// * `InvalidCursor` / `InvalidLimit` - If the page parameters are bad
    pub fn retrieve_elements(
        &self,
        path: &str,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> Result<PagedResult<Element>> {
        logged("retrieve_elements", path, || {
            let submodel = self.submodel.read();
            let children: Vec<(String, Element)> = submodel
                .submodel_elements
                .children_of(path)?
                .into_iter()
                .filter_map(|c| Some((c.path().to_string(), c.element()?.clone())))
                .collect();
            let params = page_params(&self.pagination, limit, cursor);
            Ok(paginate(children, &params, |(p, _)| p.clone())?.map(|(_, e)| e))
        })
    }

    /// # Errors
    /// * `ElementNotFound` - If nothing resolves at `path`
    pub fn retrieve_element(&self, path: &str) -> Result<Element> {
        logged("retrieve_element", path, || {
            Ok(self.submodel.read().submodel_elements.retrieve(path)?.clone())
        })
    }

    /// Apply a mutation command under the write lock
    ///
    /// # Errors
    /// Same as [`twinbase_core::apply`].
    pub fn execute(&self, command: ContainerCommand) -> Result<Option<Element>> {
        let op = command.op_name();
        let path = command.path().to_string();
        logged(op, &path, || {
            apply(&mut self.submodel.write().submodel_elements, command)
        })
    }

    /// Add `element` under the element at `path`
    ///
    /// # Errors
    /// Same as [`ElementContainer::create_at`].
    pub fn create_element(&self, path: &str, element: Element) -> Result<Element> {
        logged("create_element", path, || {
            self.submodel.write().submodel_elements.create_at(path, element)
        })
    }

    /// Replace the element at `path`
    ///
    /// # Errors
    /// Same as [`ElementContainer::update`].
    pub fn update_element(&self, path: &str, element: Element) -> Result<Element> {
        logged("update_element", path, || {
            self.submodel.write().submodel_elements.update(path, element)
        })
    }

    /// # Errors
    /// Same as [`ElementContainer::create_or_update`].
    pub fn create_or_update_element(&self, path: &str, element: Element) -> Result<Element> {
        logged("create_or_update_element", path, || {
            self.submodel
                .write()
                .submodel_elements
                .create_or_update(path, element)
        })
    }

    /// # Errors
    /// * `ElementNotFound` - If nothing resolves at `path`
    /// * `CannotModifyRoot` - If `path` is `.`
    pub fn delete_element(&self, path: &str) -> Result<()> {
        logged("delete_element", path, || {
            self.submodel.write().submodel_elements.delete(path)
        })
    }

    // ===== Values =====

    /// Value of the element at `path`
    ///
    /// Leaves answer through their bound handler, or their in-memory value
    /// without one. Collections and entities yield an object keyed by child
    /// IdShort, lists an array in index order.
    ///
    /// # Errors
    /// * `ElementNotFound` - If nothing resolves at `path`
    /// * `HandlerNotFound` - If `path` addresses an operation
    /// * Whatever a bound handler reports
    pub fn retrieve_value(&self, path: &str) -> Result<Value> {
        logged("retrieve_value", path, || {
            let submodel = self.submodel.read();
            node_value(submodel.submodel_elements.resolve(path)?)
        })
    }

    /// Write the value of the element at `path`
    ///
    /// Mirrors [`SubmodelService::retrieve_value`]: containers take an
    /// object or array and write each named or indexed child in turn.
    ///
    /// # Errors
    /// * `ElementNotFound` - If `path` or a named child does not resolve
    /// * `HandlerNotFound` - If `path` addresses an operation
    /// * `ValueCoercion` - If the value does not fit the element
    /// * Whatever a bound handler reports
    pub fn update_value(&self, path: &str, value: Value) -> Result<()> {
        logged("update_value", path, || {
            write_value(&mut self.submodel.write().submodel_elements, path, value)
        })
    }

    /// Overlay descriptive metadata without touching the value
    ///
    /// # Errors
    /// Same as [`ElementContainer::merge_metadata`].
    pub fn update_metadata(&self, path: &str, element: Element) -> Result<()> {
        logged("update_metadata", path, || {
            self.submodel
                .write()
                .submodel_elements
                .merge_metadata(path, &element)
        })
    }

    /// Write the value carried by `element`, if any, then its metadata
    ///
    /// # Errors
    /// Same as [`SubmodelService::update_value`] and
    /// [`SubmodelService::update_metadata`].
    pub fn update_by_path(&self, path: &str, element: Element) -> Result<()> {
        logged("update_by_path", path, || {
            let mut submodel = self.submodel.write();
            let container = &mut submodel.submodel_elements;
            let current = container.retrieve(path)?.model_type();
            if current != element.model_type() {
                return Err(TwinError::ModelTypeMismatch {
                    expected: current.to_string(),
                    actual: element.model_type().to_string(),
                });
            }
            if let Some(value) = element.value() {
                write_value(container, path, value)?;
            }
            container.merge_metadata(path, &element)
        })
    }

    // ===== References =====

    /// # Errors
    /// * `ElementNotFound` - If nothing resolves at `path`
    pub fn retrieve_element_reference(&self, path: &str) -> Result<Reference> {
        logged("retrieve_element_reference", path, || {
            self.submodel
                .read()
                .submodel_elements
                .element_reference(path)
        })
    }

    /// Page through references to the top-level elements
    ///
    /// # Errors
    /// * `InvalidCursor` / `InvalidLimit` - If the page parameters are bad
    pub fn retrieve_element_references(
        &self,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> Result<PagedResult<Reference>> {
        logged("retrieve_element_references", ".", || {
            let submodel = self.submodel.read();
            let container = &submodel.submodel_elements;
            let references = container
                .children_of(".")?
                .into_iter()
                .map(|c| {
                    let path = c.path().to_string();
                    container.element_reference(&path).map(|r| (path, r))
                })
                .collect::<Result<Vec<_>>>()?;
            let params = page_params(&self.pagination, limit, cursor);
            Ok(paginate(references, &params, |(p, _)| p.clone())?.map(|(_, r)| r))
        })
    }

    // ===== Operations =====

    /// Invoke the operation at `path`
    ///
    /// Synchronous calls return the terminal response. Asynchronous calls
    /// return `Initiated`; poll with
    /// [`SubmodelService::get_invocation_result`]. The model lock is only
    /// held while the request is validated, never while the handler runs.
    ///
    /// # Errors
    /// Same as [`InvocationEngine::prepare`].
    pub async fn invoke_operation(
        &self,
        path: &str,
        request: InvocationRequest,
        asynchronous: bool,
    ) -> Result<InvocationResponse> {
        let prepared = logged("prepare_invocation", path, || {
            let submodel = self.submodel.read();
            self.invocation
                .prepare(&submodel.submodel_elements, path, request)
        })?;

        Ok(if asynchronous {
            self.invocation.invoke_async(prepared).await
        } else {
            self.invocation.invoke(prepared).await
        })
    }

    /// # Errors
    /// * `InvocationNotFound` - If nothing was stored under the handle
    pub fn get_invocation_result(
        &self,
        path: &str,
        request_id: &CorrelationId,
    ) -> Result<InvocationResponse> {
        self.invocation.get_invocation_result(path, request_id)
    }
}

fn node_value(node: NodeRef<'_>) -> Result<Value> {
    let Some(element) = node.element() else {
        return children_object(node);
    };
    if let Some(handler) = &element.handler {
        return handler.get(element);
    }
    match element.model_type() {
        ModelType::Operation => Err(TwinError::HandlerNotFound {
            path: node.path().to_string(),
        }),
        ModelType::SubmodelElementList => node
            .children()
            .map(node_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        model_type if model_type.is_container() => children_object(node),
        _ => Ok(element.value().unwrap_or(Value::Null)),
    }
}

/// Object of child values; operations have none and are left out
fn children_object(node: NodeRef<'_>) -> Result<Value> {
    let mut object = Map::new();
    for child in node.children() {
        let is_operation = child
            .element()
            .is_some_and(|e| e.model_type() == ModelType::Operation);
        if let (Some(id_short), false) = (child.id_short(), is_operation) {
            object.insert(id_short.to_string(), node_value(child)?);
        }
    }
    Ok(Value::Object(object))
}

fn write_value(container: &mut ElementContainer, path: &str, value: Value) -> Result<()> {
    let node = container.resolve(path)?;
    let shape_error = |expected: &str, value: &Value| TwinError::ValueCoercion {
        parameter: path.to_string(),
        value_type: expected.to_string(),
        value: value.to_string(),
    };

    let model_type = match node.element() {
        Some(element) => {
            if let Some(handler) = &element.handler {
                return handler.set(element, value);
            }
            element.model_type()
        }
        None => ModelType::SubmodelElementCollection,
    };

    match model_type {
        ModelType::Operation => Err(TwinError::HandlerNotFound {
            path: path.to_string(),
        }),
        ModelType::SubmodelElementList => {
            let children: Vec<String> = node.children().map(|c| c.path().to_string()).collect();
            let items = match value {
                Value::Array(items) => items,
                other => return Err(shape_error("array", &other)),
            };
            if items.len() != children.len() {
                return Err(shape_error(
                    &format!("array of {} items", children.len()),
                    &Value::Array(items),
                ));
            }
            for (child, item) in children.iter().zip(items) {
                write_value(container, child, item)?;
            }
            Ok(())
        }
        model_type if model_type.is_container() => {
            let children: Vec<(String, String)> = node
                .children()
                .filter_map(|c| Some((c.id_short()?.to_string(), c.path().to_string())))
                .collect();
            let entries = match value {
                Value::Object(entries) => entries,
                other => return Err(shape_error("object", &other)),
            };
            for (id_short, item) in entries {
                let child = children
                    .iter()
                    .find(|(name, _)| *name == id_short)
                    .map(|(_, child_path)| child_path.clone())
                    .ok_or_else(|| TwinError::ElementNotFound {
                        path: format!("{}.{}", path, id_short),
                    })?;
                write_value(container, &child, item)?;
            }
            Ok(())
        }
        _ => container.retrieve_mut(path)?.set_value(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use twinbase_core::model::DataType;

    fn service() -> SubmodelService {
        let submodel = Submodel::with_elements(
            "Telemetry",
            "urn:sm:telemetry",
            [Element::collection("Measurements")],
        )
        .unwrap();
        let service = SubmodelService::new(submodel);
        service
            .create_element(
                "Measurements",
                Element::property("Temp", DataType::Double, json!(21.5)),
            )
            .unwrap();
        service
    }

    #[test]
    fn test_collection_value_is_object_of_children() {
        let service = service();
        assert_eq!(
            service.retrieve_value("Measurements").unwrap(),
            json!({ "Temp": 21.5 })
        );
    }

    #[test]
    fn test_collection_value_write_reaches_children() {
        let service = service();
        service
            .update_value("Measurements", json!({ "Temp": "22" }))
            .unwrap();
        assert_eq!(service.retrieve_value("Measurements.Temp").unwrap(), json!(22.0));
    }

    #[test]
    fn test_unknown_child_in_value_object() {
        let service = service();
        let err = service
            .update_value("Measurements", json!({ "Pressure": 1 }))
            .unwrap_err();
        assert!(matches!(err, TwinError::ElementNotFound { path } if path == "Measurements.Pressure"));
    }

    #[test]
    fn test_update_by_path_rejects_other_kind() {
        let service = service();
        let err = service
            .update_by_path("Measurements.Temp", Element::collection("Temp"))
            .unwrap_err();
        assert!(matches!(err, TwinError::ModelTypeMismatch { .. }));
        assert_eq!(service.retrieve_value("Measurements.Temp").unwrap(), json!(21.5));
    }
}
