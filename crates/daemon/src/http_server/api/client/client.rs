use reqwest::{header::HeaderMap, header::HeaderValue, Client};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::error::ApiError;
use crate::http_server::api::v0::RPC_PATH;
use crate::requests::RequestError;

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    /// Call `method` on the remote node.
    ///
    /// Errors the remote returns come back as the same `RequestError` it
    ///  raised. Only failures to reach it at all become `Rpc`.
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, RequestError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self
            .remote
            .join(&format!("{}/{}", RPC_PATH, method))
            .map_err(|e| RequestError::Rpc(e.to_string()))?;
        let response = self
            .client
            .post(url)
            .json(params)
            .send()
            .await
            .map_err(|e| RequestError::Rpc(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<R>()
                .await
                .map_err(|e| RequestError::Rpc(e.to_string()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RequestError::Rpc(e.to_string()))?;
        match serde_json::from_str::<RequestError>(&body) {
            Ok(err) => Err(err),
            Err(_) => Err(RequestError::Rpc(format!("HTTP status {}: {}", status, body))),
        }
    }

    /// Whether the daemon answers its liveness probe
    pub async fn is_live(&self) -> bool {
        let Ok(url) = self.remote.join("/_status/livez") else {
            return false;
        };
        matches!(
            self.client.get(url).send().await,
            Ok(resp) if resp.status().is_success()
        )
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    /// Get the underlying HTTP client for custom requests
    pub fn http_client(&self) -> &Client {
        &self.client
    }
}
