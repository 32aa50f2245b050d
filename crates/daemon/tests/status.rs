//! Health and identity endpoints of a running API server
mod common;

use strata_daemon::http_server::api::client::ApiClient;

use self::common::{offline_node, TestServer};

fn status_url(client: &ApiClient, check: &str) -> String {
    format!(
        "{}/_status/{}",
        client.base_url().as_str().trim_end_matches('/'),
        check
    )
}

#[tokio::test]
async fn test_serving_node_is_ready() {
    let node = offline_node("b5").await;
    let server = TestServer::start(node.clone()).await;
    assert!(server.client.is_live().await);

    let http = server.client.http_client();
    let ready = http
        .get(status_url(&server.client, "readyz"))
        .send()
        .await
        .unwrap();
    assert!(ready.status().is_success());

    let identity: serde_json::Value = http
        .get(status_url(&server.client, "identity"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(identity["peername"], "b5");
    assert_eq!(identity["id"], node.id().to_string());
    assert_eq!(identity["online"], false);

    server.stop().await;
}

#[tokio::test]
async fn test_stopped_node_is_not_ready() {
    let node = offline_node("b5").await;
    let server = TestServer::start(node.clone()).await;
    node.stop().await.unwrap();

    let ready = server
        .client
        .http_client()
        .get(status_url(&server.client, "readyz"))
        .send()
        .await
        .unwrap();
    assert_eq!(ready.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let node = offline_node("b5").await;
    let server = TestServer::start(node).await;

    let resp = server
        .client
        .http_client()
        .get(status_url(&server.client, "nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

    server.stop().await;
}
