use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::canonicalize;
use crate::crypto::{ProfileId, SecretKey};
use crate::namespace::{LocalNamespace, Namespace, Namespaces, NetworkNamespace};
use crate::p2p::{IrohTransport, PeerMessage, PeerReply, PeerService, PeerTransport, TransportError};
use crate::profile::Profile;
use crate::reference::{DatasetRef, RefError};
use crate::repo::{RepoError, Repository};

/// Default bound on a single network round trip
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Lifecycle of a node. Transitions only move forward; a stopped node has
///  to be rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Created,
    OnlineServicesStarted,
    Serving,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub secret_key: SecretKey,
    /// Whether this node may start network services at all
    pub online: bool,
    /// Publish and look up peers over the mainline DHT
    pub discovery: bool,
    pub listen_addr: SocketAddrV4,
    pub request_timeout: Duration,
}

impl NodeConfig {
    pub fn new(secret_key: SecretKey) -> Self {
        Self {
            secret_key,
            online: true,
            discovery: false,
            listen_addr: SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("node is stopped")]
    Stopped,
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("failed to save config: {0}")]
    Config(String),
    #[error("unexpected reply from peer: {0}")]
    UnexpectedReply(String),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("repo error: {0}")]
    Repo(#[from] RepoError),
    #[error("reference error: {0}")]
    Ref(#[from] RefError),
}

/// Where a node persists its editable profile
pub trait ConfigStore: Send + Sync + std::fmt::Debug {
    fn save_profile(&self, profile: &Profile) -> anyhow::Result<()>;
}

/// A running participant: owns the repository and the network session.
///
/// Building a node wires it up without accepting connections.
///  `start_online_services` brings up the transport and may be skipped for
///  offline work; `serving` marks the API surface attached.
#[derive(Debug)]
pub struct Node {
    config: NodeConfig,
    repo: Arc<Repository>,
    state: Mutex<NodeState>,
    /// Transport supplied up front, started on `start_online_services`
    pending: Mutex<Option<Arc<dyn PeerTransport>>>,
    /// Held for the whole of `start_online_services`
    starting: tokio::sync::Mutex<()>,
    transport: RwLock<Option<Arc<dyn PeerTransport>>>,
    config_store: Option<Arc<dyn ConfigStore>>,
}

impl Node {
    pub fn new(config: NodeConfig, repo: Arc<Repository>) -> Self {
        Self {
            config,
            repo,
            state: Mutex::new(NodeState::Created),
            pending: Mutex::new(None),
            starting: tokio::sync::Mutex::new(()),
            transport: RwLock::new(None),
            config_store: None,
        }
    }

    /// Use `transport` instead of binding an iroh endpoint
    pub fn with_transport(self, transport: Arc<dyn PeerTransport>) -> Self {
        *self.pending.lock() = Some(transport);
        self
    }

    pub fn with_config_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.config_store = Some(store);
        self
    }

    pub fn id(&self) -> ProfileId {
        self.config.secret_key.public()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn repo(&self) -> &Arc<Repository> {
        &self.repo
    }

    pub fn state(&self) -> NodeState {
        *self.state.lock()
    }

    pub fn request_timeout(&self) -> Duration {
        self.config.request_timeout
    }

    pub fn is_online(&self) -> bool {
        self.transport.read().is_some()
    }

    /// The running transport, or `NetworkUnavailable` when offline
    pub fn transport(&self) -> Result<Arc<dyn PeerTransport>, NodeError> {
        self.transport.read().clone().ok_or_else(|| {
            NodeError::NetworkUnavailable("online services are not running".to_string())
        })
    }

    /// Bring up the peer transport and start answering peers.
    /// Calling this on a node that is already online is a no-op.
    pub async fn start_online_services(&self) -> Result<(), NodeError> {
        let _starting = self.starting.lock().await;
        if self.state() == NodeState::Stopped {
            return Err(NodeError::Stopped);
        }
        if self.is_online() {
            return Ok(());
        }
        if !self.config.online {
            return Err(NodeError::NetworkUnavailable(
                "networking is disabled in the node config".to_string(),
            ));
        }

        let injected = self.pending.lock().take();
        let was_injected = injected.is_some();
        let transport: Arc<dyn PeerTransport> = match injected {
            Some(t) => t,
            None => Arc::new(
                IrohTransport::bind(
                    &self.config.secret_key,
                    self.config.listen_addr,
                    self.config.discovery,
                )
                .await?,
            ),
        };
        if let Err(e) = transport.start(PeerService::new(self.repo.clone())).await {
            if was_injected {
                *self.pending.lock() = Some(transport);
            }
            return Err(e.into());
        }

        for peer in self.repo.peers() {
            if let Err(e) = transport
                .connect(peer.profile.id, &peer.addresses)
                .await
            {
                tracing::warn!("could not reintroduce peer {}: {}", peer.profile.peername, e);
            }
        }

        *self.transport.write() = Some(transport.clone());
        let mut state = self.state.lock();
        if *state == NodeState::Created {
            *state = NodeState::OnlineServicesStarted;
        }
        tracing::info!(
            "online services started for {} at {:?}",
            self.id(),
            transport.encapsulated_addresses()
        );
        Ok(())
    }

    /// Mark the node as serving its API
    pub fn serving(&self) -> Result<(), NodeError> {
        let mut state = self.state.lock();
        if *state == NodeState::Stopped {
            return Err(NodeError::Stopped);
        }
        *state = NodeState::Serving;
        Ok(())
    }

    /// Shut the transport down. Terminal: a stopped node is never restarted.
    pub async fn stop(&self) -> Result<(), NodeError> {
        {
            let mut state = self.state.lock();
            if *state == NodeState::Stopped {
                return Ok(());
            }
            *state = NodeState::Stopped;
        }
        let transport = self.transport.write().take();
        if let Some(transport) = transport {
            transport.shutdown().await?;
        }
        tracing::info!("node {} stopped", self.id());
        Ok(())
    }

    /// Transport addresses peers can reach this node at
    pub fn addresses(&self) -> Vec<String> {
        self.transport
            .read()
            .as_ref()
            .map(|t| t.encapsulated_addresses())
            .unwrap_or_default()
    }

    /// The local repository first, then one namespace per known peer in
    ///  address-book order. Offline nodes only get the local namespace.
    pub fn namespaces(&self) -> Namespaces {
        let local: Arc<dyn Namespace> = Arc::new(LocalNamespace::new("local", self.repo.clone()));
        let mut namespaces = Namespaces::new(self.repo.clone()).with(local);

        let Some(transport) = self.transport.read().clone() else {
            return namespaces;
        };
        let mut seen = Vec::new();
        for peer in self.repo.peers() {
            seen.push(peer.profile.id);
            namespaces.register(Arc::new(NetworkNamespace::new(
                peer.profile.peername,
                peer.profile.id,
                transport.clone(),
                self.config.request_timeout,
            )));
        }
        for id in transport.connected_peers() {
            if !seen.contains(&id) {
                namespaces.register(Arc::new(NetworkNamespace::new(
                    id.to_string(),
                    id,
                    transport.clone(),
                    self.config.request_timeout,
                )));
            }
        }
        namespaces
    }

    /// Canonicalize using only the repository
    pub fn canonicalize(&self, r: &mut DatasetRef) -> Result<(), RefError> {
        canonicalize::canonicalize_dataset_ref(&self.repo, r)
    }

    /// Canonicalize, asking peers when local data is not enough
    pub async fn resolve_ref_online(&self, r: &mut DatasetRef) -> Result<(), RefError> {
        let transport = self.transport.read().clone();
        canonicalize::resolve_ref_online(
            &self.repo,
            transport.as_deref(),
            r,
            self.config.request_timeout,
        )
        .await
    }

    /// Resolve a peer ref's profile id, asking peers when needed
    pub async fn canonicalize_profile(&self, r: &mut DatasetRef) -> Result<(), RefError> {
        let transport = self.transport.read().clone();
        canonicalize::canonicalize_profile(
            &self.repo,
            transport.as_deref(),
            r,
            self.config.request_timeout,
        )
        .await
    }

    /// Dial a peer, fetch its profile and record it in the address book
    pub async fn connect_peer(
        &self,
        peer: ProfileId,
        addresses: Vec<String>,
    ) -> Result<Profile, NodeError> {
        let transport = self.transport()?;
        transport.connect(peer, &addresses).await?;
        let reply = tokio::time::timeout(
            self.config.request_timeout,
            transport.request(peer, PeerMessage::Profile),
        )
        .await
        .map_err(|_| NodeError::Timeout(format!("connecting to {}", peer)))??;
        match reply {
            PeerReply::Profile(profile) => {
                self.repo.put_peer(profile.clone(), addresses)?;
                tracing::info!("connected to {} ({})", profile.peername, peer);
                Ok(profile)
            }
            other => Err(NodeError::UnexpectedReply(format!("{:?}", other))),
        }
    }

    pub fn profile(&self) -> Profile {
        self.repo.profile()
    }

    /// Apply an edit to the owning profile under the repository lock.
    /// Owned refs follow a peername change; the config itself is not
    ///  persisted until `save_config`.
    pub fn update_profile(&self, edit: impl FnOnce(&mut Profile)) -> Result<Profile, NodeError> {
        Ok(self.repo.update_profile(edit)?)
    }

    /// Persist the current profile through the attached config store.
    /// Nodes without one keep their config in memory only.
    pub fn save_config(&self) -> Result<(), NodeError> {
        let Some(store) = &self.config_store else {
            tracing::debug!("no config store attached, skipping save");
            return Ok(());
        };
        store
            .save_profile(&self.repo.profile())
            .map_err(|e| NodeError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blobs_store::BlobsStore;

    async fn offline_node() -> Node {
        let key = SecretKey::generate();
        let store = BlobsStore::memory().await.unwrap();
        let repo = Repository::memory(store, Profile::new(key.public(), "b5"));
        let mut config = NodeConfig::new(key);
        config.online = false;
        Node::new(config, Arc::new(repo))
    }

    #[tokio::test]
    async fn test_offline_lifecycle() {
        let node = offline_node().await;
        assert_eq!(node.state(), NodeState::Created);
        assert!(matches!(
            node.start_online_services().await,
            Err(NodeError::NetworkUnavailable(_))
        ));
        assert_eq!(node.state(), NodeState::Created);
        assert!(!node.is_online());
        assert_eq!(node.namespaces().len(), 1);

        node.serving().unwrap();
        assert_eq!(node.state(), NodeState::Serving);

        node.stop().await.unwrap();
        assert_eq!(node.state(), NodeState::Stopped);
        assert!(matches!(node.serving(), Err(NodeError::Stopped)));
        assert!(matches!(
            node.start_online_services().await,
            Err(NodeError::Stopped)
        ));
    }

    /// Transport that refuses its first `failures` starts
    #[derive(Debug)]
    struct Flaky {
        id: ProfileId,
        failures: Mutex<usize>,
        starts: Mutex<usize>,
    }

    #[async_trait::async_trait]
    impl PeerTransport for Flaky {
        fn local_id(&self) -> ProfileId {
            self.id
        }
        fn encapsulated_addresses(&self) -> Vec<String> {
            vec!["flaky://test".to_string()]
        }
        async fn start(&self, _: PeerService) -> Result<(), TransportError> {
            tokio::task::yield_now().await;
            let mut failures = self.failures.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(TransportError::Offline);
            }
            *self.starts.lock() += 1;
            Ok(())
        }
        async fn connect(&self, peer: ProfileId, _: &[String]) -> Result<(), TransportError> {
            Err(TransportError::Unreachable(peer, "flaky".into()))
        }
        async fn request(&self, peer: ProfileId, _: PeerMessage) -> Result<PeerReply, TransportError> {
            Err(TransportError::Unreachable(peer, "flaky".into()))
        }
        fn connected_peers(&self) -> Vec<ProfileId> {
            Vec::new()
        }
        async fn shutdown(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    async fn flaky_node(failures: usize) -> (Arc<Node>, Arc<Flaky>) {
        let key = SecretKey::generate();
        let store = BlobsStore::memory().await.unwrap();
        let repo = Repository::memory(store, Profile::new(key.public(), "b5"));
        let flaky = Arc::new(Flaky {
            id: key.public(),
            failures: Mutex::new(failures),
            starts: Mutex::new(0),
        });
        let node = Node::new(NodeConfig::new(key), Arc::new(repo)).with_transport(flaky.clone());
        (Arc::new(node), flaky)
    }

    #[tokio::test]
    async fn test_failed_start_keeps_injected_transport() {
        let (node, flaky) = flaky_node(1).await;

        assert!(node.start_online_services().await.is_err());
        assert!(!node.is_online());
        assert_eq!(node.state(), NodeState::Created);

        node.start_online_services().await.unwrap();
        assert_eq!(node.addresses(), vec!["flaky://test".to_string()]);
        assert_eq!(*flaky.starts.lock(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_starts_start_once() {
        let (node, flaky) = flaky_node(0).await;

        let (a, b) = tokio::join!(node.start_online_services(), node.start_online_services());
        a.unwrap();
        b.unwrap();
        assert!(node.is_online());
        assert_eq!(*flaky.starts.lock(), 1);
    }

    #[derive(Debug, Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl ConfigStore for Recorder {
        fn save_profile(&self, profile: &Profile) -> anyhow::Result<()> {
            self.0.lock().push(profile.name.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_profile_edits_saved_explicitly() {
        let recorder = Arc::new(Recorder::default());
        let node = offline_node().await.with_config_store(recorder.clone());
        let id = node.id();

        let updated = node.update_profile(|p| p.name = "Brendan".into()).unwrap();
        assert_eq!(updated.id, id);
        assert!(recorder.0.lock().is_empty());

        node.save_config().unwrap();
        assert_eq!(*recorder.0.lock(), vec!["Brendan".to_string()]);
    }
}
