use parking_lot::RwLock;

use twinbase_core::model::{AssetAdministrationShell, Element, ElementKind, Reference, Submodel};
use twinbase_core::pagination::{paginate, PagedResult};
use twinbase_core::{Result, TwinError};

use super::{logged, page_params};
use crate::settings::{EngineSettings, PaginationSection};

/// Submodel bookkeeping of one shell
pub struct ShellService {
    shell: RwLock<AssetAdministrationShell>,
    pagination: PaginationSection,
}

impl ShellService {
    pub fn new(shell: AssetAdministrationShell) -> Self {
        Self::with_settings(shell, &EngineSettings::default())
    }

    pub fn with_settings(shell: AssetAdministrationShell, settings: &EngineSettings) -> Self {
        Self {
            shell: RwLock::new(shell),
            pagination: settings.pagination.clone(),
        }
    }

    pub fn shell_id(&self) -> String {
        self.shell.read().id.clone()
    }

    /// Attach `submodel` and record its reference on the shell
    ///
    /// # Errors
    /// * `DuplicateIdShort` - If a submodel with the same IdShort is attached
    pub fn attach_submodel(&self, submodel: &Submodel) -> Result<Element> {
        logged("attach_submodel", &submodel.id_short, || {
            self.shell.write().submodels_mut().create(submodel.to_element())
        })
    }

    /// Detach the submodel with identifier `submodel_id`
    ///
    /// # Errors
    /// * `ElementNotFound` - If no attached submodel has that identifier
    pub fn delete_submodel(&self, submodel_id: &str) -> Result<()> {
        logged("delete_submodel", submodel_id, || {
            let mut shell = self.shell.write();
            let path = shell
                .submodels()
                .children_of(".")?
                .into_iter()
                .find(|c| {
                    c.element().is_some_and(|e| {
                        matches!(&e.kind, ElementKind::Submodel { id } if id == submodel_id)
                    })
                })
                .map(|c| c.path().to_string())
                .ok_or_else(|| TwinError::ElementNotFound {
                    path: submodel_id.to_string(),
                })?;
            shell.submodels_mut().delete(&path)
        })
    }

    pub fn submodel_references(&self) -> Vec<Reference> {
        self.shell.read().submodel_references().to_vec()
    }

    /// Page through the recorded submodel references, keyed by submodel id
    ///
    /// # Errors
    /// * `InvalidCursor` / `InvalidLimit` - If the page parameters are bad
    pub fn retrieve_submodel_references(
        &self,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> Result<PagedResult<Reference>> {
        logged("retrieve_submodel_references", ".", || {
            let references = self.submodel_references();
            let params = page_params(&self.pagination, limit, cursor);
            paginate(references, &params, |r| {
                r.first_value().unwrap_or_default().to_string()
            })
        })
    }

    /// Page through the attached submodel elements
    ///
    /// # Errors
    /// * `InvalidCursor` / `InvalidLimit` - If the page parameters are bad
    pub fn retrieve_submodels(
        &self,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> Result<PagedResult<Element>> {
        logged("retrieve_submodels", ".", || {
            let shell = self.shell.read();
            let submodels: Vec<(String, Element)> = shell
                .submodels()
                .children_of(".")?
                .into_iter()
                .filter_map(|c| Some((c.path().to_string(), c.element()?.clone())))
                .collect();
            let params = page_params(&self.pagination, limit, cursor);
            Ok(paginate(submodels, &params, |(p, _)| p.clone())?.map(|(_, e)| e))
        })
    }
}
