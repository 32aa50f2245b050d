use std::sync::Arc;

use crate::crypto::ProfileId;
use crate::reference::DatasetRef;
use crate::repo::{RepoError, Repository};

use super::messages::{PeerMessage, PeerReply, ReplyErrorKind};

/// Answers peer requests from the local repository.
///
/// Only ever reads: a remote peer can look at what we have but never
///  change it.
#[derive(Debug, Clone)]
pub struct PeerService {
    repo: Arc<Repository>,
}

impl PeerService {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    pub fn local_id(&self) -> ProfileId {
        self.repo.profile().id
    }

    pub async fn handle(&self, from: ProfileId, message: PeerMessage) -> PeerReply {
        tracing::debug!("peer {} sent {}", from, message.name());
        match message {
            PeerMessage::Profile => PeerReply::Profile(self.repo.profile()),
            PeerMessage::ResolveRef(r) => match self.resolve(&r) {
                Ok(found) => PeerReply::Ref(found),
                Err(e) => reply_error(e),
            },
            PeerMessage::ListRefs { offset, limit } => {
                PeerReply::Refs(self.repo.refs_page(offset, limit))
            }
            PeerMessage::Dataset(r) => {
                let mut found = match self.resolve(&r) {
                    Ok(found) => found,
                    Err(e) => return reply_error(e),
                };
                let Some(path) = found.path else {
                    return PeerReply::not_found(&r);
                };
                match self.repo.load_dataset(&path).await {
                    Ok(dataset) => {
                        found.dataset = Some(dataset);
                        PeerReply::Dataset(found)
                    }
                    Err(e) => reply_error(e),
                }
            }
            PeerMessage::Package(r) => {
                let path = match self.resolve(&r).map(|found| found.path) {
                    Ok(Some(path)) => path,
                    Ok(None) => return PeerReply::not_found(&r),
                    Err(e) => return reply_error(e),
                };
                match self.repo.package(&path).await {
                    Ok(package) => PeerReply::Package(package),
                    Err(e) => reply_error(e),
                }
            }
            PeerMessage::Search { query, limit } => match self.repo.search(&query, limit).await {
                Ok(results) => PeerReply::SearchResults(results),
                Err(e) => reply_error(e),
            },
        }
    }

    /// Match against our own refs. A pinned path wins over the current
    ///  version, as long as we hold it.
    fn resolve(&self, r: &DatasetRef) -> Result<DatasetRef, RepoError> {
        let profile = self.repo.profile();
        let query = DatasetRef {
            peername: if r.peername == crate::reference::ME {
                profile.peername.clone()
            } else {
                r.peername.clone()
            },
            ..r.without_dataset()
        };
        let mut found = match self.repo.get_ref(&query) {
            Ok(found) => found,
            Err(RepoError::NotFound(_)) if query.path.is_some() && query.name.is_empty() => query,
            Err(e) => return Err(e),
        };
        if r.path.is_some() {
            found.path = r.path;
        }
        Ok(found)
    }
}

fn reply_error(err: RepoError) -> PeerReply {
    match err {
        RepoError::NotFound(what) => PeerReply::Error(ReplyErrorKind::NotFound, what),
        RepoError::InvalidRef(what) => PeerReply::Error(ReplyErrorKind::Invalid, what),
        other => PeerReply::internal(other),
    }
}
