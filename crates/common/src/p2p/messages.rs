use serde::{Deserialize, Serialize};

use crate::dataset::Package;
use crate::profile::Profile;
use crate::reference::DatasetRef;

/// Requests one node sends another. Each travels bincode-encoded over its
///  own bidirectional stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PeerMessage {
    /// Ask for the responder's profile
    Profile,
    /// Resolve a ref against the responder's own refs
    ResolveRef(DatasetRef),
    /// Page through the responder's refs
    ListRefs { offset: usize, limit: usize },
    /// Resolve a ref and include its manifest
    Dataset(DatasetRef),
    /// Bundle every blob behind a ref for transfer
    Package(DatasetRef),
    /// Search the responder's refs
    Search { query: String, limit: usize },
}

impl PeerMessage {
    pub fn name(&self) -> &'static str {
        match self {
            PeerMessage::Profile => "profile",
            PeerMessage::ResolveRef(_) => "resolve_ref",
            PeerMessage::ListRefs { .. } => "list_refs",
            PeerMessage::Dataset(_) => "dataset",
            PeerMessage::Package(_) => "package",
            PeerMessage::Search { .. } => "search",
        }
    }
}

/// Coarse classification of an error a responder reports in-band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyErrorKind {
    NotFound,
    Invalid,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PeerReply {
    Profile(Profile),
    Ref(DatasetRef),
    Refs(Vec<DatasetRef>),
    Dataset(DatasetRef),
    Package(Package),
    SearchResults(Vec<DatasetRef>),
    Error(ReplyErrorKind, String),
}

impl PeerReply {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        PeerReply::Error(ReplyErrorKind::NotFound, what.to_string())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        PeerReply::Error(ReplyErrorKind::Internal, err.to_string())
    }
}
