use std::collections::BTreeSet;
use std::net::{SocketAddr, SocketAddrV4};
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use futures::future::BoxFuture;
use iroh::discovery::pkarr::dht::DhtDiscovery;
use iroh::endpoint::Connection;
use iroh::protocol::{AcceptError, ProtocolHandler, Router};
use iroh::{Endpoint, NodeAddr};
use parking_lot::{Mutex, RwLock};

use crate::crypto::{ProfileId, SecretKey};

use super::messages::{PeerMessage, PeerReply};
use super::service::PeerService;
use super::transport::{PeerTransport, TransportError};
use super::{ALPN, MAX_MESSAGE_SIZE};

/// Peer transport over an iroh endpoint.
///
/// Inbound connections on our ALPN are answered by a `PeerService`; the
///  blobs protocol is not exposed since packages travel in-band.
#[derive(Debug)]
pub struct IrohTransport {
    endpoint: Endpoint,
    router: Mutex<Option<Router>>,
    connected: Arc<RwLock<BTreeSet<ProfileId>>>,
}

impl IrohTransport {
    /// Bind an endpoint for `secret_key` at `addr`
    pub async fn bind(
        secret_key: &SecretKey,
        addr: SocketAddrV4,
        discovery: bool,
    ) -> Result<Self, TransportError> {
        let mut builder = Endpoint::builder().secret_key(secret_key.0.clone());
        if discovery {
            // setup our discovery mechanism for our peer
            let mainline_discovery = DhtDiscovery::builder()
                .secret_key(secret_key.0.clone())
                .build()
                .map_err(|e| anyhow!("failed to build mainline discovery: {}", e))?;
            builder = builder.discovery(mainline_discovery);
        }
        let endpoint = builder
            .bind_addr_v4(addr)
            .bind()
            .await
            .map_err(|e| anyhow!("failed to bind endpoint: {}", e))?;

        tracing::info!(
            "bound peer endpoint {} at {:?}",
            endpoint.node_id(),
            endpoint.bound_sockets()
        );

        Ok(Self {
            endpoint,
            router: Mutex::new(None),
            connected: Arc::new(RwLock::new(BTreeSet::new())),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

#[async_trait]
impl PeerTransport for IrohTransport {
    fn local_id(&self) -> ProfileId {
        self.endpoint.node_id().into()
    }

    fn encapsulated_addresses(&self) -> Vec<String> {
        self.endpoint
            .bound_sockets()
            .into_iter()
            .map(|a| a.to_string())
            .collect()
    }

    async fn start(&self, service: PeerService) -> Result<(), TransportError> {
        let mut router = self.router.lock();
        if router.is_some() {
            return Ok(());
        }
        let handler = PeerProtocol {
            service,
            connected: self.connected.clone(),
        };
        *router = Some(
            Router::builder(self.endpoint.clone())
                .accept(ALPN, handler)
                .spawn(),
        );
        Ok(())
    }

    async fn connect(&self, peer: ProfileId, addresses: &[String]) -> Result<(), TransportError> {
        if addresses.is_empty() {
            // rely on discovery to find the peer
            return Ok(());
        }
        let addrs = addresses
            .iter()
            .map(|a| {
                a.parse::<SocketAddr>()
                    .map_err(|_| TransportError::InvalidAddress(a.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let node_addr = NodeAddr::from_parts(*peer, None, addrs);
        self.endpoint
            .add_node_addr_with_source(node_addr, "strata")
            .map_err(|e| anyhow!("failed to add peer address: {}", e))?;
        Ok(())
    }

    async fn request(
        &self,
        peer: ProfileId,
        message: PeerMessage,
    ) -> Result<PeerReply, TransportError> {
        if self.router.lock().is_none() {
            return Err(TransportError::Offline);
        }
        let unreachable = |e: &dyn std::fmt::Display| {
            tracing::warn!("peer {} unreachable: {}", peer, e);
            TransportError::Unreachable(peer, e.to_string())
        };

        let conn = self
            .endpoint
            .connect(*peer, ALPN)
            .await
            .map_err(|e| unreachable(&e))?;
        let (mut send, mut recv) = conn.open_bi().await.map_err(|e| unreachable(&e))?;

        let request_bytes =
            bincode::serialize(&message).map_err(|e| TransportError::Codec(e.to_string()))?;
        send.write_all(&request_bytes)
            .await
            .map_err(|e| unreachable(&e))?;
        send.finish().map_err(|e| unreachable(&e))?;

        let reply_bytes = recv
            .read_to_end(MAX_MESSAGE_SIZE)
            .await
            .map_err(|e| unreachable(&e))?;
        let reply: PeerReply =
            bincode::deserialize(&reply_bytes).map_err(|e| TransportError::Codec(e.to_string()))?;

        self.connected.write().insert(peer);
        Ok(reply)
    }

    fn connected_peers(&self) -> Vec<ProfileId> {
        self.connected.read().iter().copied().collect()
    }

    async fn shutdown(&self) -> Result<(), TransportError> {
        let router = self.router.lock().take();
        if let Some(router) = router {
            router
                .shutdown()
                .await
                .map_err(|e| anyhow!("failed to shut down router: {}", e))?;
        } else {
            self.endpoint.close().await;
        }
        Ok(())
    }
}

/// Router handler for our ALPN
#[derive(Debug, Clone)]
struct PeerProtocol {
    service: PeerService,
    connected: Arc<RwLock<BTreeSet<ProfileId>>>,
}

impl ProtocolHandler for PeerProtocol {
    #[allow(refining_impl_trait)]
    fn accept(&self, conn: Connection) -> BoxFuture<'static, Result<(), AcceptError>> {
        let this = self.clone();
        Box::pin(async move {
            let remote: ProfileId = conn
                .remote_node_id()
                .map_err(|e| AcceptError::from(std::io::Error::other(e)))?
                .into();
            tracing::debug!("new connection from {}", remote);

            let (mut send, mut recv) = conn.accept_bi().await.map_err(|e| {
                tracing::error!("failed to accept bidirectional stream: {}", e);
                AcceptError::from(e)
            })?;

            let message_bytes = recv.read_to_end(MAX_MESSAGE_SIZE).await.map_err(|e| {
                tracing::error!("failed to read message: {}", e);
                AcceptError::from(std::io::Error::other(e))
            })?;

            let message: PeerMessage = bincode::deserialize(&message_bytes).map_err(|e| {
                tracing::error!("failed to deserialize message: {}", e);
                let err: Box<dyn std::error::Error + Send + Sync> =
                    anyhow!("failed to deserialize message: {}", e).into();
                AcceptError::from(err)
            })?;

            this.connected.write().insert(remote);
            let reply = this.service.handle(remote, message).await;

            let reply_bytes = bincode::serialize(&reply).map_err(|e| {
                tracing::error!("failed to serialize reply: {}", e);
                let err: Box<dyn std::error::Error + Send + Sync> =
                    anyhow!("failed to serialize reply: {}", e).into();
                AcceptError::from(err)
            })?;

            send.write_all(&reply_bytes).await.map_err(|e| {
                tracing::error!("failed to send reply: {}", e);
                AcceptError::from(std::io::Error::other(e))
            })?;
            send.finish().map_err(|e| {
                tracing::error!("failed to finish stream: {}", e);
                AcceptError::from(std::io::Error::other(e))
            })?;

            conn.closed().await;
            Ok(())
        })
    }
}
