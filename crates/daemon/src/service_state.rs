use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;

use common::blobs_store::BlobsStore;
use common::crypto::SecretKey;
use common::node::{Node, NodeConfig};
use common::repo::Repository;

use super::service_config::Config;
use super::state::default_peername;

/// Main service state: the node every request runs against
#[derive(Clone, Debug)]
pub struct State {
    node: Arc<Node>,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup node secret
        let node_secret = config
            .node_secret
            .clone()
            .unwrap_or_else(SecretKey::generate);

        // 2. Setup blobs store
        let blobs = match &config.blobs_path {
            Some(path) => {
                tracing::debug!("ServiceState::from_config - loading blobs store at {:?}", path);
                BlobsStore::fs(path).await
            }
            None => BlobsStore::memory().await,
        }
        .map_err(|e| StateSetupError::BlobsStoreError(e.to_string()))?;

        // 3. Load the repository under the configured profile
        let mut profile_config = config.profile.clone();
        if profile_config.peername.is_empty() {
            profile_config.peername = default_peername(&node_secret.public());
        }
        let profile = profile_config.to_profile(node_secret.public());
        let repo = match &config.repo_path {
            Some(path) => Repository::load(path, blobs, profile)
                .map_err(|e| StateSetupError::RepoError(e.to_string()))?,
            None => Repository::memory(blobs, profile),
        };

        // 4. Build the node
        let mut node_config = NodeConfig::new(node_secret);
        node_config.online = config.online;
        node_config.discovery = config.discovery;
        node_config.request_timeout = config.request_timeout;
        node_config.listen_addr = config
            .node_listen_addr
            .unwrap_or(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));
        let mut node = Node::new(node_config, Arc::new(repo));
        if let Some(store) = &config.config_store {
            node = node.with_config_store(store.clone());
        }
        tracing::info!("Node id: {} ({})", node.id(), node.profile().peername);

        Ok(Self {
            node: Arc::new(node),
        })
    }

    /// Wrap a node that was built elsewhere
    pub fn from_node(node: Arc<Node>) -> Self {
        Self { node }
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

impl AsRef<Node> for State {
    fn as_ref(&self) -> &Node {
        &self.node
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Blobs store error: {0}")]
    BlobsStoreError(String),
    #[error("Repository error: {0}")]
    RepoError(String),
}
