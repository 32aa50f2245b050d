use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use common::namespace::NamespaceError;
use common::node::NodeError;
use common::p2p::TransportError;
use common::reference::RefError;
use common::repo::RepoError;

/// Every failure a request can end in.
///
/// Serializes as `{"kind": ..., "message": ...}`. The RPC client decodes the
///  same shape, so a forwarded call fails with exactly the error the remote
///  node produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum RequestError {
    #[error("malformed reference: {0}")]
    MalformedReference(String),
    #[error("ambiguous reference: {0}")]
    AmbiguousReference(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("no namespaces: {0}")]
    NoNamespaces(String),
    #[error("not searchable: {0}")]
    NotSearchable(String),
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("rpc failed: {0}")]
    Rpc(String),
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::MalformedReference(_) | RequestError::InvalidParams(_) => {
                StatusCode::BAD_REQUEST
            }
            RequestError::AmbiguousReference(_) => StatusCode::CONFLICT,
            RequestError::NotFound(_) => StatusCode::NOT_FOUND,
            RequestError::NotSearchable(_) => StatusCode::NOT_IMPLEMENTED,
            RequestError::NetworkUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RequestError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RequestError::Rpc(_) => StatusCode::BAD_GATEWAY,
            RequestError::NoNamespaces(_)
            | RequestError::Configuration(_)
            | RequestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Process exit code for the command line
    pub fn exit_code(&self) -> i32 {
        match self {
            RequestError::MalformedReference(_)
            | RequestError::AmbiguousReference(_)
            | RequestError::InvalidParams(_) => 2,
            RequestError::NotFound(_) => 3,
            RequestError::NetworkUnavailable(_) | RequestError::Rpc(_) => 4,
            RequestError::Timeout(_) => 5,
            _ => 1,
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<RefError> for RequestError {
    fn from(err: RefError) -> Self {
        match err {
            RefError::Malformed { .. } => RequestError::MalformedReference(err.to_string()),
            RefError::Ambiguous { .. } => RequestError::AmbiguousReference(err.to_string()),
            RefError::NotFound(what) => RequestError::NotFound(what),
            RefError::NetworkUnavailable(what) => RequestError::NetworkUnavailable(what),
            RefError::Timeout(what) => RequestError::Timeout(what),
            RefError::Repo(e) => e.into(),
            RefError::Transport(e) => e.into(),
        }
    }
}

impl From<RepoError> for RequestError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(what) => RequestError::NotFound(what),
            RepoError::Exists(_) | RepoError::InvalidRef(_) => {
                RequestError::InvalidParams(err.to_string())
            }
            other => RequestError::Internal(other.to_string()),
        }
    }
}

impl From<TransportError> for RequestError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Offline => RequestError::NetworkUnavailable(err.to_string()),
            TransportError::Unreachable(..) => RequestError::NotFound(err.to_string()),
            TransportError::InvalidAddress(_) => RequestError::InvalidParams(err.to_string()),
            other => RequestError::Internal(other.to_string()),
        }
    }
}

impl From<NamespaceError> for RequestError {
    fn from(err: NamespaceError) -> Self {
        match err {
            NamespaceError::NotFound(what) => RequestError::NotFound(what),
            NamespaceError::Unreachable(what) => RequestError::NotFound(what),
            NamespaceError::Timeout(what) => RequestError::Timeout(what),
            NamespaceError::NoNamespaces => RequestError::NoNamespaces(err.to_string()),
            NamespaceError::NotSearchable => RequestError::NotSearchable(err.to_string()),
            NamespaceError::Ref(e) => e.into(),
            NamespaceError::Repo(e) => e.into(),
            NamespaceError::Transport(e) => e.into(),
            other => RequestError::Internal(other.to_string()),
        }
    }
}

impl From<NodeError> for RequestError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::NetworkUnavailable(what) => RequestError::NetworkUnavailable(what),
            NodeError::Stopped => RequestError::NetworkUnavailable(err.to_string()),
            NodeError::Timeout(what) => RequestError::Timeout(what),
            NodeError::Config(what) => RequestError::Configuration(what),
            NodeError::Transport(e) => e.into(),
            NodeError::Repo(e) => e.into(),
            NodeError::Ref(e) => e.into(),
            other => RequestError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let err = RequestError::NetworkUnavailable("start the daemon".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "network_unavailable", "message": "start the daemon"})
        );
        let back: RequestError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_ref_errors_keep_their_kind() {
        let err: RequestError = "a/b/c".parse::<common::reference::DatasetRef>().unwrap_err().into();
        assert!(matches!(err, RequestError::MalformedReference(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: RequestError = NamespaceError::NotSearchable.into();
        assert!(matches!(err, RequestError::NotSearchable(_)));
    }
}
