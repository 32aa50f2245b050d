use async_trait::async_trait;

use crate::crypto::ProfileId;

use super::messages::{PeerMessage, PeerReply};
use super::service::PeerService;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("peer {0} unreachable: {1}")]
    Unreachable(ProfileId, String),
    #[error("transport is not running")]
    Offline,
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
    #[error("codec error: {0}")]
    Codec(String),
    #[error("transport error: {0}")]
    Default(#[from] anyhow::Error),
}

/// The peer-to-peer session a node talks to other nodes through.
///
/// Requests are one-shot: each call opens a stream, sends one
///  `PeerMessage` and waits for the matching `PeerReply`. Failures to reach
///  the peer are transport errors; failures the peer reports come back as
///  `PeerReply::Error`.
#[async_trait]
pub trait PeerTransport: Send + Sync + std::fmt::Debug {
    /// Identity this transport dials out and answers as
    fn local_id(&self) -> ProfileId;

    /// Addresses other peers can reach us at
    fn encapsulated_addresses(&self) -> Vec<String>;

    /// Begin answering inbound requests with `service`
    async fn start(&self, service: PeerService) -> Result<(), TransportError>;

    /// Make a peer reachable, optionally at known addresses
    async fn connect(&self, peer: ProfileId, addresses: &[String]) -> Result<(), TransportError>;

    async fn request(
        &self,
        peer: ProfileId,
        message: PeerMessage,
    ) -> Result<PeerReply, TransportError>;

    /// Peers we have exchanged messages with this session
    fn connected_peers(&self) -> Vec<ProfileId>;

    async fn shutdown(&self) -> Result<(), TransportError>;
}
