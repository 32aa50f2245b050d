//! Shared fixtures for multi-node integration tests
#![allow(dead_code)]

use std::sync::Arc;

use common::dataset::{Dataset, Field, FieldType, Structure};
use common::node::Node;
use common::reference::DatasetRef;
use common::testkit::TestNetwork;
use serde_json::json;

/// A movies dataset with a small body
pub fn movies(title: &str) -> (Dataset, serde_json::Value) {
    let dataset = Dataset {
        title: title.to_string(),
        description: "films and the year they came out".to_string(),
        structure: Structure {
            format: "json".to_string(),
            schema: vec![
                Field::new("title", FieldType::String),
                Field::new("year", FieldType::Integer),
            ],
        },
        ..Default::default()
    };
    let body = json!([["Alien", 1979], ["Heat", 1995]]);
    (dataset, body)
}

/// Save a movies dataset named `name` on `node`
pub async fn save_movies(node: &Node, name: &str, title: &str) -> DatasetRef {
    let (dataset, body) = movies(title);
    node.repo()
        .save_dataset(name, dataset, Some(&body))
        .await
        .unwrap()
}

/// Two started nodes, `b5` knowing about `dustmop`, and `dustmop/movies`
///  saved on dustmop
pub async fn b5_and_dustmop() -> (TestNetwork, Arc<Node>, Arc<Node>, DatasetRef) {
    let net = TestNetwork::new();
    let b5 = net.add_node("b5").await.unwrap();
    let dustmop = net.add_node("dustmop").await.unwrap();
    let saved = save_movies(&dustmop, "movies", "Movies").await;
    net.introduce(&b5, &dustmop).await.unwrap();
    (net, b5, dustmop, saved)
}
