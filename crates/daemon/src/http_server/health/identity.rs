use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use common::crypto::ProfileId;
use common::node::NodeState;

use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub id: ProfileId,
    pub peername: String,
    pub online: bool,
    pub state: NodeState,
    pub addresses: Vec<String>,
}

#[tracing::instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> impl IntoResponse {
    let node = state.node();
    Json(IdentityResponse {
        id: node.id(),
        peername: node.profile().peername,
        online: node.is_online(),
        state: node.state(),
        addresses: node.addresses(),
    })
}
