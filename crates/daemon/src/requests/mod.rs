//! Business operations, one request type per capability area.
//!
//! Every request type wraps a [`Dispatch`]: either a local node the
//!  operation runs against directly, or an RPC client that forwards the
//!  identical call to a running daemon. Callers never branch on which one
//!  they hold.

mod error;
mod dataset;
mod history;
mod peer;
mod profile;
mod query;
pub mod rpc;

pub use dataset::{
    DatasetRequests, ListParams, PackageInfo, RenameParams, SaveParams, ValidateParams,
};
pub use error::RequestError;
pub use history::{HistoryRequests, LogParams};
pub use peer::{ConnectParams, NamespaceParams, PeerInfoParams, PeerListParams, PeerRequests};
pub use profile::{PeernameParams, PhotoParams, ProfileRequests};
pub use query::QueryRequests;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use common::linked_data::ContentAddress;
use common::node::Node;
use common::reference::{DatasetRef, ME};

use crate::http_server::api::client::ApiClient;

/// Where a request executes
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Run against this node's repository
    Local(Arc<Node>),
    /// Forward to the daemon behind this client
    Remote(ApiClient),
}

impl Dispatch {
    /// Pick the mode from exactly one of `local` or `remote`. Supplying both
    ///  or neither is a configuration error.
    pub fn new(local: Option<Arc<Node>>, remote: Option<ApiClient>) -> Result<Self, RequestError> {
        match (local, remote) {
            (Some(node), None) => Ok(Dispatch::Local(node)),
            (None, Some(client)) => Ok(Dispatch::Remote(client)),
            (Some(_), Some(_)) => Err(RequestError::Configuration(
                "requests need a local node or a remote client, not both".to_string(),
            )),
            (None, None) => Err(RequestError::Configuration(
                "requests need a local node or a remote client".to_string(),
            )),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Dispatch::Remote(_))
    }

    /// Forward `method` if remote, otherwise hand the node to `local`
    pub(crate) async fn run<P, R, F, Fut>(
        &self,
        method: &str,
        params: &P,
        local: F,
    ) -> Result<R, RequestError>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
        F: FnOnce(Arc<Node>) -> Fut,
        Fut: std::future::Future<Output = Result<R, RequestError>>,
    {
        match self {
            Dispatch::Remote(client) => client.call(method, params).await,
            Dispatch::Local(node) => local(node.clone()).await,
        }
    }
}

/// Canonicalize `r` locally, asking the network only when the repository
///  can't resolve it. Offline nodes fail fast with `NetworkUnavailable`.
pub(crate) async fn resolve(node: &Node, r: &mut DatasetRef) -> Result<(), RequestError> {
    node.canonicalize(r)?;
    if !r.needs_network() {
        return Ok(());
    }
    if !node.is_online() {
        return Err(RequestError::NetworkUnavailable(format!(
            "{} is not in the local repository and networking is off",
            r
        )));
    }
    node.resolve_ref_online(r).await?;
    Ok(())
}

/// Make sure the manifest and body behind a resolved ref are in the local
///  store, downloading the package from a peer when they aren't
pub(crate) async fn materialize(
    node: &Node,
    r: &DatasetRef,
) -> Result<ContentAddress, RequestError> {
    let path = r
        .path
        .ok_or_else(|| RequestError::NotFound(format!("{} has no version", r)))?;
    let local = node
        .repo()
        .store()
        .has(&path)
        .await
        .map_err(|e| RequestError::Internal(e.to_string()))?;
    if !local {
        node.namespaces().store(&r.to_string()).await?;
    }
    Ok(path)
}

/// Local refs, narrowed to one peername when given. `me` and this node's
///  own peername select refs by owner id.
fn refs_for(node: &Node, peername: Option<&str>) -> Vec<DatasetRef> {
    let refs = node.repo().refs();
    let own = node.profile();
    match peername {
        None | Some("") => refs,
        Some(name) if name == ME || name == own.peername => refs
            .into_iter()
            .filter(|r| r.profile_id == Some(own.id))
            .collect(),
        Some(name) => refs.into_iter().filter(|r| r.peername == name).collect(),
    }
}

fn page<T>(items: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
    items.into_iter().skip(offset).take(limit).collect()
}

fn default_limit() -> usize {
    100
}
