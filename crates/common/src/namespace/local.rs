use std::sync::Arc;

use async_trait::async_trait;

use crate::canonicalize::canonicalize_dataset_ref;
use crate::dataset::Package;
use crate::linked_data::ContentAddress;
use crate::reference::DatasetRef;
use crate::repo::{RepoError, Repository};

use super::{
    children_of, in_scope, parse_address, Namespace, NamespaceError, NamespaceKind, StoreHandle,
};

/// The node's own repository as a namespace.
///
/// Also answers for addresses materialized from the network: the package
///  cache index maps them to roots already sitting in the local store.
#[derive(Debug, Clone)]
pub struct LocalNamespace {
    name: String,
    repo: Arc<Repository>,
}

impl LocalNamespace {
    pub fn new(name: impl Into<String>, repo: Arc<Repository>) -> Self {
        Self {
            name: name.into(),
            repo,
        }
    }

    pub fn repo(&self) -> &Arc<Repository> {
        &self.repo
    }

    /// Own refs plus cached packages, as refs
    fn known_refs(&self) -> Vec<DatasetRef> {
        let mut refs = self.repo.refs();
        for (addr, root) in self.repo.cached_packages() {
            if let Ok(mut r) = DatasetRef::parse(&addr) {
                if !refs.iter().any(|known| known.same_name(&r)) {
                    r.path = Some(root);
                    refs.push(r);
                }
            }
        }
        refs
    }

    /// Canonicalize `addr` locally; cached packages count as local
    fn resolve(&self, addr: &str) -> Result<DatasetRef, NamespaceError> {
        let mut r = parse_address(addr)?;
        if r.is_empty() || r.is_peer_ref() {
            return Err(NamespaceError::NotFound(format!("{} is not a dataset", addr)));
        }
        canonicalize_dataset_ref(&self.repo, &mut r)?;
        if r.path.is_none() {
            return Err(NamespaceError::NotFound(addr.to_string()));
        }
        Ok(r)
    }

    fn path_of(r: &DatasetRef) -> Result<ContentAddress, NamespaceError> {
        r.path
            .ok_or_else(|| NamespaceError::NotFound(r.to_string()))
    }

    async fn with_dataset(&self, mut r: DatasetRef) -> Result<DatasetRef, NamespaceError> {
        let path = Self::path_of(&r)?;
        r.dataset = Some(self.repo.load_dataset(&path).await.map_err(missing)?);
        Ok(r)
    }
}

/// Blobs we don't hold are a soft miss, not a failure
fn missing(err: RepoError) -> NamespaceError {
    match err {
        RepoError::NotFound(what) => NamespaceError::NotFound(what),
        other => NamespaceError::Repo(other),
    }
}

#[async_trait]
impl Namespace for LocalNamespace {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NamespaceKind {
        NamespaceKind::Local
    }

    async fn child_addresses(&self, addr: &str) -> Result<Vec<String>, NamespaceError> {
        let scope = parse_address(addr)?;
        let children = children_of(&scope, &self.known_refs());
        if children.is_empty() {
            return Err(NamespaceError::NotFound(addr.to_string()));
        }
        Ok(children)
    }

    async fn child_datasets(&self, addr: &str) -> Result<Vec<DatasetRef>, NamespaceError> {
        let scope = parse_address(addr)?;
        let mut out = Vec::new();
        for r in self.known_refs().into_iter().filter(|r| in_scope(&scope, r)) {
            out.push(self.with_dataset(r).await?);
        }
        if out.is_empty() {
            return Err(NamespaceError::NotFound(addr.to_string()));
        }
        Ok(out)
    }

    async fn dataset(&self, addr: &str) -> Result<DatasetRef, NamespaceError> {
        let r = self.resolve(addr)?;
        self.with_dataset(r).await
    }

    async fn package(&self, addr: &str) -> Result<Package, NamespaceError> {
        let r = self.resolve(addr)?;
        self.repo.package(&Self::path_of(&r)?).await.map_err(missing)
    }

    async fn store(&self, addr: &str) -> Result<StoreHandle, NamespaceError> {
        let r = self.resolve(addr)?;
        let root = Self::path_of(&r)?;
        if !self.repo.store().has(&root).await.map_err(RepoError::from)? {
            return Err(NamespaceError::NotFound(addr.to_string()));
        }
        Ok(StoreHandle {
            store: self.repo.store().clone(),
            root,
            source: self.name.clone(),
        })
    }
}
