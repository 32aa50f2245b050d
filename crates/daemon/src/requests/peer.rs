use serde::{Deserialize, Serialize};

use common::crypto::ProfileId;
use common::profile::Profile;
use common::reference::{DatasetRef, ME};

use super::{default_limit, page, Dispatch, RequestError};

pub const LIST: &str = "Peer.List";
pub const INFO: &str = "Peer.Info";
pub const CONNECT: &str = "Peer.Connect";
pub const CONNECTED_PEERS: &str = "Peer.ConnectedPeers";
pub const NAMESPACE: &str = "Peer.Namespace";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerListParams {
    pub offset: usize,
    pub limit: usize,
}

impl Default for PeerListParams {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: default_limit(),
        }
    }
}

/// Look a peer up by id, by peername, or both
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PeerInfoParams {
    pub peername: Option<String>,
    pub profile_id: Option<ProfileId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    pub profile_id: ProfileId,
    /// Transport addresses to dial; discovery is used when empty
    #[serde(default)]
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceParams {
    pub peername: String,
    pub offset: usize,
    pub limit: usize,
}

impl Default for NamespaceParams {
    fn default() -> Self {
        Self {
            peername: String::new(),
            offset: 0,
            limit: default_limit(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PeerRequests {
    dispatch: Dispatch,
}

impl PeerRequests {
    pub fn new(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    /// Profiles in the address book
    pub async fn list(&self, params: &PeerListParams) -> Result<Vec<Profile>, RequestError> {
        self.dispatch
            .run(LIST, params, |node| async move {
                let profiles = node.repo().peers().into_iter().map(|p| p.profile).collect();
                Ok(page(profiles, params.offset, params.limit))
            })
            .await
    }

    /// A peer's profile, asking the network for peernames the address book
    ///  doesn't know
    pub async fn info(&self, params: &PeerInfoParams) -> Result<Profile, RequestError> {
        self.dispatch
            .run(INFO, params, |node| async move {
                let own = node.profile();
                let peername = params.peername.clone().unwrap_or_default();
                if params.profile_id == Some(own.id) || peername == ME || peername == own.peername
                {
                    return Ok(own);
                }
                if let Some(id) = params.profile_id {
                    return node
                        .repo()
                        .peer(&id)
                        .map(|p| p.profile)
                        .ok_or_else(|| RequestError::NotFound(format!("peer {}", id)));
                }
                if peername.is_empty() {
                    return Err(RequestError::InvalidParams(
                        "peer info needs a peername or a profile id".to_string(),
                    ));
                }

                let mut r = DatasetRef {
                    peername: peername.clone(),
                    ..Default::default()
                };
                node.canonicalize_profile(&mut r).await?;
                let id = r
                    .profile_id
                    .ok_or_else(|| RequestError::NotFound(format!("peer {}", peername)))?;
                node.repo()
                    .peer(&id)
                    .map(|p| p.profile)
                    .ok_or_else(|| RequestError::NotFound(format!("peer {}", peername)))
            })
            .await
    }

    pub async fn connect(&self, params: &ConnectParams) -> Result<Profile, RequestError> {
        self.dispatch
            .run(CONNECT, params, |node| async move {
                Ok(node
                    .connect_peer(params.profile_id, params.addresses.clone())
                    .await?)
            })
            .await
    }

    /// Peers the transport has talked to this session
    pub async fn connected_peers(&self) -> Result<Vec<ProfileId>, RequestError> {
        self.dispatch
            .run(CONNECTED_PEERS, &(), |node| async move {
                Ok(node.transport()?.connected_peers())
            })
            .await
    }

    /// Datasets published under a peername, wherever they live
    pub async fn namespace(
        &self,
        params: &NamespaceParams,
    ) -> Result<Vec<DatasetRef>, RequestError> {
        self.dispatch
            .run(NAMESPACE, params, |node| async move {
                if params.peername.is_empty() {
                    return Err(RequestError::InvalidParams(
                        "namespace needs a peername".to_string(),
                    ));
                }
                let peername = if params.peername == ME {
                    node.profile().peername
                } else {
                    params.peername.clone()
                };
                let refs = node.namespaces().child_datasets(&peername).await?;
                Ok(page(refs, params.offset, params.limit))
            })
            .await
    }
}
