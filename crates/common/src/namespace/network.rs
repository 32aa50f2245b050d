use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::crypto::ProfileId;
use crate::dataset::Package;
use crate::p2p::{PeerMessage, PeerReply, PeerTransport, ReplyErrorKind, TransportError};
use crate::reference::DatasetRef;

use super::{
    children_of, in_scope, parse_address, Namespace, NamespaceError, NamespaceKind, SearchParams,
    Searchable, StoreHandle,
};

/// Upper bound on refs fetched when listing a peer
const LIST_LIMIT: usize = 1000;

/// A remote peer's repository as a namespace
#[derive(Debug, Clone)]
pub struct NetworkNamespace {
    name: String,
    peer: ProfileId,
    transport: Arc<dyn PeerTransport>,
    timeout: Duration,
}

impl NetworkNamespace {
    pub fn new(
        name: impl Into<String>,
        peer: ProfileId,
        transport: Arc<dyn PeerTransport>,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            peer,
            transport,
            timeout,
        }
    }

    pub fn peer(&self) -> ProfileId {
        self.peer
    }

    async fn request(&self, message: PeerMessage) -> Result<PeerReply, NamespaceError> {
        let what = message.name();
        let reply = tokio::time::timeout(self.timeout, self.transport.request(self.peer, message))
            .await
            .map_err(|_| NamespaceError::Timeout(format!("{} from {}", what, self.name)))?;
        match reply {
            Ok(PeerReply::Error(ReplyErrorKind::NotFound, what)) => {
                Err(NamespaceError::NotFound(what))
            }
            Ok(PeerReply::Error(_, message)) => Err(NamespaceError::Remote(message)),
            Ok(reply) => Ok(reply),
            Err(TransportError::Unreachable(peer, reason)) => Err(NamespaceError::Unreachable(
                format!("{}: {}", peer, reason),
            )),
            Err(TransportError::Offline) => Err(NamespaceError::Unreachable(self.name.clone())),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<DatasetRef>, NamespaceError> {
        match self
            .request(PeerMessage::ListRefs {
                offset: 0,
                limit: LIST_LIMIT,
            })
            .await?
        {
            PeerReply::Refs(refs) => Ok(refs),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(reply: PeerReply) -> NamespaceError {
    NamespaceError::Remote(format!("unexpected reply: {:?}", reply))
}

#[async_trait]
impl Namespace for NetworkNamespace {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NamespaceKind {
        NamespaceKind::Network
    }

    async fn child_addresses(&self, addr: &str) -> Result<Vec<String>, NamespaceError> {
        let scope = parse_address(addr)?;
        let children = children_of(&scope, &self.list().await?);
        if children.is_empty() {
            return Err(NamespaceError::NotFound(addr.to_string()));
        }
        Ok(children)
    }

    async fn child_datasets(&self, addr: &str) -> Result<Vec<DatasetRef>, NamespaceError> {
        let scope = parse_address(addr)?;
        let mut out = Vec::new();
        for r in self.list().await?.into_iter().filter(|r| in_scope(&scope, r)) {
            match self.request(PeerMessage::Dataset(r)).await? {
                PeerReply::Dataset(found) => out.push(found),
                other => return Err(unexpected(other)),
            }
        }
        if out.is_empty() {
            return Err(NamespaceError::NotFound(addr.to_string()));
        }
        Ok(out)
    }

    async fn dataset(&self, addr: &str) -> Result<DatasetRef, NamespaceError> {
        let r = parse_address(addr)?;
        match self.request(PeerMessage::Dataset(r)).await? {
            PeerReply::Dataset(found) => Ok(found),
            other => Err(unexpected(other)),
        }
    }

    async fn package(&self, addr: &str) -> Result<Package, NamespaceError> {
        let r = parse_address(addr)?;
        match self.request(PeerMessage::Package(r)).await? {
            PeerReply::Package(package) => {
                package
                    .verify()
                    .map_err(|e| NamespaceError::Remote(e.to_string()))?;
                Ok(package)
            }
            other => Err(unexpected(other)),
        }
    }

    async fn store(&self, _addr: &str) -> Result<StoreHandle, NamespaceError> {
        // network data only becomes a local store through materialization
        Err(NamespaceError::Unsupported("store"))
    }

    fn as_searchable(&self) -> Option<&dyn Searchable> {
        Some(self)
    }
}

#[async_trait]
impl Searchable for NetworkNamespace {
    async fn search(&self, params: &SearchParams) -> Result<Vec<DatasetRef>, NamespaceError> {
        match self
            .request(PeerMessage::Search {
                query: params.query.clone(),
                limit: params.limit,
            })
            .await?
        {
            PeerReply::SearchResults(results) => Ok(results),
            other => Err(unexpected(other)),
        }
    }
}
