/// Lightweight harness for multi-node tests
///
/// Nodes are wired into an in-process `MemoryNetwork`, so remote
/// namespaces, network canonicalization and materialization run without
/// sockets or discovery.
///
/// # Example
///
/// ```rust,ignore
/// use common::testkit::TestNetwork;
///
/// #[tokio::test]
/// async fn test_fetch_from_peer() -> anyhow::Result<()> {
///     let net = TestNetwork::new();
///     let b5 = net.add_node("b5").await?;
///     let dustmop = net.add_node("dustmop").await?;
///
///     dustmop.repo().save_dataset("movies", Dataset::default(), None).await?;
///     net.introduce(&b5, &dustmop).await?;
///
///     let handle = b5.namespaces().store("dustmop/movies").await?;
///     net.shutdown().await?;
///     Ok(())
/// }
/// ```
mod network;

pub use network::{MemoryNetwork, MemoryTransport};

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;

use crate::blobs_store::BlobsStore;
use crate::crypto::SecretKey;
use crate::node::{Node, NodeConfig};
use crate::profile::Profile;
use crate::repo::Repository;

/// A coordinator for several in-process nodes
#[derive(Debug, Default)]
pub struct TestNetwork {
    network: MemoryNetwork,
    nodes: Mutex<Vec<Arc<Node>>>,
    /// Overrides the default request timeout on every node built here
    request_timeout: Option<Duration>,
}

impl TestNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give every node built from now on a shorter network deadline
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn network(&self) -> &MemoryNetwork {
        &self.network
    }

    /// Build a node with an in-memory repository. Not started.
    pub async fn build_node(&self, peername: &str) -> Result<Node> {
        let key = SecretKey::generate();
        let store = BlobsStore::memory().await?;
        let repo = Repository::memory(store, Profile::new(key.public(), peername));
        let transport = self.network.transport(key.public());
        let mut config = NodeConfig::new(key);
        if let Some(timeout) = self.request_timeout {
            config.request_timeout = timeout;
        }
        Ok(Node::new(config, Arc::new(repo)).with_transport(transport))
    }

    /// Build a node and start its online services
    pub async fn add_node(&self, peername: &str) -> Result<Arc<Node>> {
        let node = Arc::new(self.build_node(peername).await?);
        node.start_online_services().await?;
        self.nodes.lock().push(node.clone());
        tracing::debug!("test node {} ({}) online", peername, node.id());
        Ok(node)
    }

    /// Tell `a` about `b` by connecting and recording `b`'s profile
    pub async fn introduce(&self, a: &Node, b: &Node) -> Result<()> {
        a.connect_peer(b.id(), b.addresses()).await?;
        Ok(())
    }

    /// Stop every node this network started
    pub async fn shutdown(&self) -> Result<()> {
        let nodes: Vec<_> = self.nodes.lock().drain(..).collect();
        for node in nodes {
            node.stop().await?;
        }
        Ok(())
    }
}
