use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::crypto::ProfileId;
use crate::p2p::{PeerMessage, PeerReply, PeerService, PeerTransport, TransportError};

#[derive(Debug, Default)]
struct Slot {
    service: Option<PeerService>,
    reachable: bool,
    /// Accepts requests but never answers them
    stalled: bool,
}

/// In-process stand-in for the peer-to-peer network.
///
/// Every transport handed out by one `MemoryNetwork` can reach every other
///  started transport on it. Messages still go through bincode so wire
///  compatibility is exercised without opening sockets.
#[derive(Debug, Clone, Default)]
pub struct MemoryNetwork {
    slots: Arc<RwLock<HashMap<ProfileId, Slot>>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that answers as `id`
    pub fn transport(&self, id: ProfileId) -> Arc<MemoryTransport> {
        self.slots.write().entry(id).or_default();
        Arc::new(MemoryTransport {
            id,
            network: self.clone(),
            running: RwLock::new(false),
            connected: RwLock::new(BTreeSet::new()),
        })
    }

    /// Simulate a peer dropping off (or coming back to) the network
    pub fn set_reachable(&self, id: ProfileId, reachable: bool) {
        if let Some(slot) = self.slots.write().get_mut(&id) {
            slot.reachable = reachable;
        }
    }

    /// Simulate a peer that stays connected but stops answering
    pub fn set_stalled(&self, id: ProfileId, stalled: bool) {
        if let Some(slot) = self.slots.write().get_mut(&id) {
            slot.stalled = stalled;
        }
    }

    fn is_stalled(&self, id: &ProfileId) -> bool {
        self.slots.read().get(id).is_some_and(|slot| slot.stalled)
    }

    fn service(&self, id: &ProfileId) -> Option<PeerService> {
        let slots = self.slots.read();
        let slot = slots.get(id)?;
        if !slot.reachable {
            return None;
        }
        slot.service.clone()
    }
}

#[derive(Debug)]
pub struct MemoryTransport {
    id: ProfileId,
    network: MemoryNetwork,
    running: RwLock<bool>,
    connected: RwLock<BTreeSet<ProfileId>>,
}

fn roundtrip<T>(value: &T) -> Result<T, TransportError>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let bytes = bincode::serialize(value).map_err(|e| TransportError::Codec(e.to_string()))?;
    bincode::deserialize(&bytes).map_err(|e| TransportError::Codec(e.to_string()))
}

#[async_trait]
impl PeerTransport for MemoryTransport {
    fn local_id(&self) -> ProfileId {
        self.id
    }

    fn encapsulated_addresses(&self) -> Vec<String> {
        vec![format!("memory://{}", self.id)]
    }

    async fn start(&self, service: PeerService) -> Result<(), TransportError> {
        let mut slots = self.network.slots.write();
        let slot = slots.entry(self.id).or_default();
        slot.service = Some(service);
        slot.reachable = true;
        *self.running.write() = true;
        Ok(())
    }

    async fn connect(&self, peer: ProfileId, _addresses: &[String]) -> Result<(), TransportError> {
        if !*self.running.read() {
            return Err(TransportError::Offline);
        }
        if self.network.service(&peer).is_none() {
            return Err(TransportError::Unreachable(peer, "not on the network".into()));
        }
        Ok(())
    }

    async fn request(
        &self,
        peer: ProfileId,
        message: PeerMessage,
    ) -> Result<PeerReply, TransportError> {
        if !*self.running.read() {
            return Err(TransportError::Offline);
        }
        let service = self
            .network
            .service(&peer)
            .ok_or_else(|| TransportError::Unreachable(peer, "not on the network".into()))?;
        let message = roundtrip(&message)?;
        if self.network.is_stalled(&peer) {
            tracing::debug!("{} is stalled, holding {} forever", peer, message.name());
            return std::future::pending().await;
        }
        let reply = service.handle(self.id, message).await;
        self.connected.write().insert(peer);
        roundtrip(&reply)
    }

    fn connected_peers(&self) -> Vec<ProfileId> {
        self.connected.read().iter().copied().collect()
    }

    async fn shutdown(&self) -> Result<(), TransportError> {
        *self.running.write() = false;
        self.network.set_reachable(self.id, false);
        Ok(())
    }
}
