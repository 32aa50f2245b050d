use axum::routing::post;
use axum::Router;

pub mod rpc;

use crate::ServiceState;

/// Absolute path the RPC endpoint is mounted at
pub const RPC_PATH: &str = "/api/v0/rpc";

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/rpc/:method", post(rpc::handler))
        .with_state(state)
}
