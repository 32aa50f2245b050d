//! Server half of forwarding mode: runs a named method against the local
//!  node with JSON params and returns the JSON result.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use common::namespace::SearchParams;
use common::node::Node;
use common::profile::ProfileEdit;
use common::reference::DatasetRef;

use super::{
    dataset, history, peer, profile, query, ConnectParams, DatasetRequests, Dispatch,
    HistoryRequests, ListParams, LogParams, NamespaceParams, PeerInfoParams, PeerListParams,
    PeerRequests, PeernameParams, PhotoParams, ProfileRequests, QueryRequests, RenameParams,
    RequestError, SaveParams, ValidateParams,
};

/// Every method name the RPC endpoint answers
pub const METHODS: &[&str] = &[
    profile::GET_PROFILE,
    profile::SAVE_PROFILE,
    profile::SAVE_PEERNAME,
    profile::SET_PROFILE_PHOTO,
    profile::SET_POSTER_PHOTO,
    dataset::LIST,
    dataset::GET,
    dataset::SAVE,
    dataset::RENAME,
    dataset::REMOVE,
    dataset::VALIDATE,
    dataset::SEARCH,
    dataset::PACKAGE,
    peer::LIST,
    peer::INFO,
    peer::CONNECT,
    peer::CONNECTED_PEERS,
    peer::NAMESPACE,
    query::LIST,
    query::GET,
    history::LOG,
];

fn decode<P: DeserializeOwned>(method: &str, params: Value) -> Result<P, RequestError> {
    serde_json::from_value(params)
        .map_err(|e| RequestError::InvalidParams(format!("{}: {}", method, e)))
}

async fn call<P, R, F, Fut>(method: &str, params: Value, f: F) -> Result<Value, RequestError>
where
    P: DeserializeOwned,
    R: Serialize,
    F: FnOnce(P) -> Fut,
    Fut: Future<Output = Result<R, RequestError>>,
{
    let params = decode::<P>(method, params)?;
    let result = f(params).await?;
    serde_json::to_value(result).map_err(|e| RequestError::Internal(e.to_string()))
}

/// Run `method` locally on `node`
pub async fn dispatch(node: Arc<Node>, method: &str, params: Value) -> Result<Value, RequestError> {
    let local = Dispatch::Local(node);
    let profiles = ProfileRequests::new(local.clone());
    let datasets = DatasetRequests::new(local.clone());
    let peers = PeerRequests::new(local.clone());
    let queries = QueryRequests::new(local.clone());
    let versions = HistoryRequests::new(local);

    tracing::debug!("rpc {}", method);
    match method {
        profile::GET_PROFILE => call(method, params, |()| profiles.get_profile()).await,
        profile::SAVE_PROFILE => {
            call(method, params, |p: ProfileEdit| async move {
                profiles.save_profile(&p).await
            })
            .await
        }
        profile::SAVE_PEERNAME => {
            call(method, params, |p: PeernameParams| async move {
                profiles.save_peername(&p).await
            })
            .await
        }
        profile::SET_PROFILE_PHOTO => {
            call(method, params, |p: PhotoParams| async move {
                profiles.set_profile_photo(&p).await
            })
            .await
        }
        profile::SET_POSTER_PHOTO => {
            call(method, params, |p: PhotoParams| async move {
                profiles.set_poster_photo(&p).await
            })
            .await
        }
        dataset::LIST => {
            call(method, params, |p: ListParams| async move {
                datasets.list(&p).await
            })
            .await
        }
        dataset::GET => {
            call(method, params, |r: DatasetRef| async move {
                datasets.get(&r).await
            })
            .await
        }
        dataset::SAVE => {
            call(method, params, |p: SaveParams| async move {
                datasets.save(&p).await
            })
            .await
        }
        dataset::RENAME => {
            call(method, params, |p: RenameParams| async move {
                datasets.rename(&p).await
            })
            .await
        }
        dataset::REMOVE => {
            call(method, params, |r: DatasetRef| async move {
                datasets.remove(&r).await
            })
            .await
        }
        dataset::VALIDATE => {
            call(method, params, |p: ValidateParams| async move {
                datasets.validate(&p).await
            })
            .await
        }
        dataset::SEARCH => {
            call(method, params, |p: SearchParams| async move {
                datasets.search(&p).await
            })
            .await
        }
        dataset::PACKAGE => {
            call(method, params, |r: DatasetRef| async move {
                datasets.package(&r).await
            })
            .await
        }
        peer::LIST => {
            call(method, params, |p: PeerListParams| async move {
                peers.list(&p).await
            })
            .await
        }
        peer::INFO => {
            call(method, params, |p: PeerInfoParams| async move {
                peers.info(&p).await
            })
            .await
        }
        peer::CONNECT => {
            call(method, params, |p: ConnectParams| async move {
                peers.connect(&p).await
            })
            .await
        }
        peer::CONNECTED_PEERS => call(method, params, |()| peers.connected_peers()).await,
        peer::NAMESPACE => {
            call(method, params, |p: NamespaceParams| async move {
                peers.namespace(&p).await
            })
            .await
        }
        query::LIST => {
            call(method, params, |p: ListParams| async move {
                queries.list(&p).await
            })
            .await
        }
        query::GET => {
            call(method, params, |r: DatasetRef| async move {
                queries.get(&r).await
            })
            .await
        }
        history::LOG => {
            call(method, params, |p: LogParams| async move {
                versions.log(&p).await
            })
            .await
        }
        other => Err(RequestError::NotFound(format!("no rpc method {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names_are_unique() {
        let mut names = METHODS.to_vec();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), METHODS.len());
        assert!(METHODS.iter().all(|m| m.contains('.')));
    }
}
