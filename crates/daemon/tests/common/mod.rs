//! Shared fixtures for daemon integration tests
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::watch;
use url::Url;

use common::dataset::{Dataset, Field, FieldType, Structure};
use common::node::Node;
use strata_daemon::http_server::api::client::ApiClient;
use strata_daemon::http_server::{self, serve_api};
use strata_daemon::requests::SaveParams;
use strata_daemon::{Dispatch, ProfileConfig, ServiceConfig, ServiceState};

/// An API server running on an ephemeral localhost port
pub struct TestServer {
    pub client: ApiClient,
    shutdown_tx: watch::Sender<()>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Serve `node` over HTTP
    pub async fn start(node: Arc<Node>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(());

        let state = ServiceState::from_node(node);
        let config = http_server::Config::new(addr);
        let handle = tokio::spawn(async move {
            serve_api(listener, config, state, shutdown_rx).await.unwrap();
        });

        let remote = Url::parse(&format!("http://{}", addr)).unwrap();
        Self {
            client: ApiClient::new(&remote).unwrap(),
            shutdown_tx,
            handle,
        }
    }

    pub fn dispatch(&self) -> Dispatch {
        Dispatch::new(None, Some(self.client.clone())).unwrap()
    }

    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
    }
}

/// An offline node with an in-memory repository
pub async fn offline_node(peername: &str) -> Arc<Node> {
    let config = ServiceConfig::ephemeral(ProfileConfig {
        peername: peername.to_string(),
        ..Default::default()
    });
    ServiceState::from_config(&config)
        .await
        .unwrap()
        .node()
        .clone()
}

pub fn local(node: &Arc<Node>) -> Dispatch {
    Dispatch::new(Some(node.clone()), None).unwrap()
}

/// Save params for a small movies dataset
pub fn movies(name: &str, title: &str) -> SaveParams {
    SaveParams {
        name: name.to_string(),
        dataset: Some(Dataset {
            title: title.to_string(),
            structure: Structure {
                format: "json".to_string(),
                schema: vec![
                    Field::new("title", FieldType::String),
                    Field::new("year", FieldType::Integer),
                ],
            },
            ..Default::default()
        }),
        body: Some(json!([["Alien", 1979], ["Heat", 1995]])),
    }
}
