use serde::{Deserialize, Serialize};
use serde_json::Value;

use common::dataset::{validate_body, Dataset, Structure, ValidationError};
use common::linked_data::ContentAddress;
use common::namespace::SearchParams;
use common::reference::{is_valid_name, DatasetRef};

use super::{default_limit, materialize, page, refs_for, resolve, Dispatch, RequestError};

pub const LIST: &str = "Dataset.List";
pub const GET: &str = "Dataset.Get";
pub const SAVE: &str = "Dataset.Save";
pub const RENAME: &str = "Dataset.Rename";
pub const REMOVE: &str = "Dataset.Remove";
pub const VALIDATE: &str = "Dataset.Validate";
pub const SEARCH: &str = "Dataset.Search";
pub const PACKAGE: &str = "Dataset.Package";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListParams {
    /// Only refs owned by this peername; `me` is this node
    pub peername: Option<String>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            peername: None,
            offset: 0,
            limit: default_limit(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveParams {
    pub name: String,
    /// New manifest. Without one the current version's manifest is reused.
    pub dataset: Option<Dataset>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameParams {
    pub current: DatasetRef,
    pub new_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateParams {
    /// Dataset whose structure and body are checked
    pub reference: Option<DatasetRef>,
    /// Overrides the dataset's structure
    pub structure: Option<Structure>,
    /// Overrides the dataset's body
    pub body: Option<Value>,
}

/// Where a dataset's package ended up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub reference: DatasetRef,
    pub root: ContentAddress,
    /// Namespace the package came from
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct DatasetRequests {
    dispatch: Dispatch,
}

impl DatasetRequests {
    pub fn new(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    /// Refs in the local repository, with manifests where available
    pub async fn list(&self, params: &ListParams) -> Result<Vec<DatasetRef>, RequestError> {
        self.dispatch
            .run(LIST, params, |node| async move {
                let repo = node.repo();
                let refs = refs_for(&node, params.peername.as_deref());

                let mut out = Vec::new();
                for mut r in page(refs, params.offset, params.limit) {
                    if let Some(path) = r.path {
                        r.dataset = repo.load_dataset(&path).await.ok();
                    }
                    out.push(r);
                }
                Ok(out)
            })
            .await
    }

    /// Resolve a ref and attach its manifest, from whichever namespace has it
    pub async fn get(&self, reference: &DatasetRef) -> Result<DatasetRef, RequestError> {
        self.dispatch
            .run(GET, reference, |node| async move {
                let mut r = reference.without_dataset();
                resolve(&node, &mut r).await?;
                let found = node.namespaces().dataset(&r.to_string()).await?;
                if r.path.is_none() {
                    r.path = found.path;
                }
                r.dataset = found.dataset;
                Ok(r)
            })
            .await
    }

    /// Write a new version of one of this node's datasets
    pub async fn save(&self, params: &SaveParams) -> Result<DatasetRef, RequestError> {
        self.dispatch
            .run(SAVE, params, |node| async move {
                if !is_valid_name(&params.name) {
                    return Err(RequestError::InvalidParams(format!(
                        "invalid dataset name '{}'",
                        params.name
                    )));
                }
                let repo = node.repo();
                let own = node.profile();
                let current = repo
                    .get_ref(&DatasetRef {
                        profile_id: Some(own.id),
                        ..DatasetRef::new(own.peername.clone(), params.name.clone())
                    })
                    .ok()
                    .and_then(|r| r.path);

                let dataset = match (&params.dataset, current) {
                    (Some(dataset), _) => dataset.clone(),
                    (None, Some(path)) => repo.load_dataset(&path).await?,
                    (None, None) => Dataset::default(),
                };
                if let Some(body) = &params.body {
                    let errors = validate_body(&dataset.structure, body);
                    if let Some(first) = errors.first() {
                        return Err(RequestError::InvalidParams(format!(
                            "body has {} validation errors, first: {}",
                            errors.len(),
                            first
                        )));
                    }
                }

                Ok(repo
                    .save_dataset(&params.name, dataset, params.body.as_ref())
                    .await?)
            })
            .await
    }

    pub async fn rename(&self, params: &RenameParams) -> Result<DatasetRef, RequestError> {
        self.dispatch
            .run(RENAME, params, |node| async move {
                if !is_valid_name(&params.new_name) {
                    return Err(RequestError::InvalidParams(format!(
                        "invalid dataset name '{}'",
                        params.new_name
                    )));
                }
                let mut current = params.current.without_dataset();
                node.canonicalize(&mut current)?;
                if current.profile_id != Some(node.id()) {
                    return Err(RequestError::InvalidParams(format!(
                        "{} is not owned by this node",
                        current
                    )));
                }
                Ok(node.repo().rename_ref(&current, &params.new_name)?)
            })
            .await
    }

    /// Drop a ref from the repository. Blobs stay in the store.
    pub async fn remove(&self, reference: &DatasetRef) -> Result<DatasetRef, RequestError> {
        self.dispatch
            .run(REMOVE, reference, |node| async move {
                let mut r = reference.without_dataset();
                node.canonicalize(&mut r)?;
                if r.path.is_none() {
                    return Err(RequestError::NotFound(r.to_string()));
                }
                Ok(node.repo().delete_ref(&r)?)
            })
            .await
    }

    /// Every row-level problem with a body under a structure
    pub async fn validate(
        &self,
        params: &ValidateParams,
    ) -> Result<Vec<ValidationError>, RequestError> {
        self.dispatch
            .run(VALIDATE, params, |node| async move {
                let (structure, body) = match &params.reference {
                    Some(reference) => {
                        let mut r = reference.without_dataset();
                        resolve(&node, &mut r).await?;
                        let path = materialize(&node, &r).await?;
                        let dataset = node.repo().load_dataset(&path).await?;
                        let body = match (&params.body, dataset.body_path) {
                            (Some(body), _) => body.clone(),
                            (None, Some(body_path)) => node.repo().load_body(&body_path).await?,
                            (None, None) => {
                                return Err(RequestError::InvalidParams(format!(
                                    "{} has no body",
                                    r
                                )))
                            }
                        };
                        let structure = params.structure.clone().unwrap_or(dataset.structure);
                        (structure, body)
                    }
                    None => {
                        let body = params.body.clone().ok_or_else(|| {
                            RequestError::InvalidParams(
                                "validate needs a reference or a body".to_string(),
                            )
                        })?;
                        (params.structure.clone().unwrap_or_default(), body)
                    }
                };
                Ok(validate_body(&structure, &body))
            })
            .await
    }

    pub async fn search(&self, params: &SearchParams) -> Result<Vec<DatasetRef>, RequestError> {
        self.dispatch
            .run(SEARCH, params, |node| async move {
                Ok(node.namespaces().search(params).await?)
            })
            .await
    }

    /// Get the dataset's complete package into the local store
    pub async fn package(&self, reference: &DatasetRef) -> Result<PackageInfo, RequestError> {
        self.dispatch
            .run(PACKAGE, reference, |node| async move {
                let mut r = reference.without_dataset();
                resolve(&node, &mut r).await?;
                let handle = node.namespaces().store(&r.to_string()).await?;
                Ok(PackageInfo {
                    reference: r,
                    root: handle.root,
                    source: handle.source,
                })
            })
            .await
    }
}
