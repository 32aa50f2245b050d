use axum::extract::{Json, Path, State};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::requests::{rpc, RequestError};
use crate::ServiceState;

/// Run one request method against this daemon's node.
///
/// A missing body is treated as `null`, which is what parameterless methods
///  expect.
#[tracing::instrument(skip(state, body))]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(method): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Response, RequestError> {
    let params = body.map(|Json(v)| v).unwrap_or(Value::Null);
    let result = rpc::dispatch(state.node().clone(), &method, params).await;
    if let Err(e) = &result {
        tracing::debug!("{} failed: {}", method, e);
    }
    Ok((http::StatusCode::OK, Json(result?)).into_response())
}
