//! Sources of datasets behind one read contract.
//!
//! A namespace answers lookups by address: `""` is the root, `peername`
//!  lists a peer's datasets and `peername/name` (or any ref string) names a
//!  single dataset. The local variant reads the repository; the network
//!  variant asks a remote peer. `Namespaces` composes them in registration
//!  order.

mod aggregate;
mod local;
mod network;

pub use aggregate::Namespaces;
pub use local::LocalNamespace;
pub use network::NetworkNamespace;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::blobs_store::BlobsStore;
use crate::dataset::Package;
use crate::linked_data::ContentAddress;
use crate::p2p::TransportError;
use crate::reference::{DatasetRef, RefError};
use crate::repo::RepoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceKind {
    /// Backed by this node's repository, no network cost
    Local,
    /// Backed by a remote peer, may need a download
    Network,
}

#[derive(Debug, thiserror::Error)]
pub enum NamespaceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("source unreachable: {0}")]
    Unreachable(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("no namespaces configured")]
    NoNamespaces,
    #[error("no namespace supports search")]
    NotSearchable,
    #[error("{0} is not supported by this namespace")]
    Unsupported(&'static str),
    #[error("remote error: {0}")]
    Remote(String),
    #[error("reference error: {0}")]
    Ref(#[from] RefError),
    #[error("repo error: {0}")]
    Repo(#[from] RepoError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl NamespaceError {
    /// Soft failures mean "this source doesn't have it"; the aggregator moves
    ///  on to the next source. Anything else stops the lookup.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            NamespaceError::NotFound(_) | NamespaceError::Unreachable(_) | NamespaceError::Timeout(_)
        )
    }
}

/// A local store holding the complete package rooted at `root`
#[derive(Debug, Clone)]
pub struct StoreHandle {
    pub store: BlobsStore,
    pub root: ContentAddress,
    /// Name of the namespace that provided the data
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub query: String,
    pub limit: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            query: String::new(),
            limit: 100,
        }
    }
}

#[async_trait]
pub trait Namespace: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    fn kind(&self) -> NamespaceKind;

    /// Addresses directly beneath `addr`
    async fn child_addresses(&self, addr: &str) -> Result<Vec<String>, NamespaceError>;

    /// Dataset refs at or beneath `addr`, with manifests attached
    async fn child_datasets(&self, addr: &str) -> Result<Vec<DatasetRef>, NamespaceError>;

    /// The dataset at `addr`, with its manifest attached
    async fn dataset(&self, addr: &str) -> Result<DatasetRef, NamespaceError>;

    /// Every blob behind the dataset at `addr`
    async fn package(&self, addr: &str) -> Result<Package, NamespaceError>;

    /// A store that already holds the dataset at `addr`
    async fn store(&self, addr: &str) -> Result<StoreHandle, NamespaceError>;

    /// Search capability, if this source has one
    fn as_searchable(&self) -> Option<&dyn Searchable> {
        None
    }
}

#[async_trait]
pub trait Searchable: Send + Sync {
    async fn search(&self, params: &SearchParams) -> Result<Vec<DatasetRef>, NamespaceError>;
}

/// Parse a namespace address into a ref. The root address parses to an
///  empty ref.
pub(crate) fn parse_address(addr: &str) -> Result<DatasetRef, NamespaceError> {
    if addr.is_empty() {
        return Ok(DatasetRef::default());
    }
    Ok(DatasetRef::parse(addr)?)
}

/// Whether `r` lives at or beneath `scope`
pub(crate) fn in_scope(scope: &DatasetRef, r: &DatasetRef) -> bool {
    if scope.is_empty() {
        return true;
    }
    if scope.peername != r.peername {
        return false;
    }
    scope.name.is_empty() || scope.name == r.name
}

/// Addresses one level beneath `scope` drawn from `refs`, in first-seen order
pub(crate) fn children_of(scope: &DatasetRef, refs: &[DatasetRef]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for r in refs.iter().filter(|r| in_scope(scope, r)) {
        let child = if scope.is_empty() {
            r.peername.clone()
        } else if scope.name.is_empty() {
            r.address()
        } else {
            continue;
        };
        if !out.contains(&child) {
            out.push(child);
        }
    }
    out
}
