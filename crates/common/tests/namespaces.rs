//! Namespace lookups across in-process peers

mod common;

use std::sync::Arc;
use std::time::Duration;

use ::common::namespace::{LocalNamespace, NamespaceError, Namespaces, SearchParams};

#[tokio::test]
async fn test_dataset_from_peer() {
    let (net, b5, _dustmop, saved) = common::b5_and_dustmop().await;

    let found = b5.namespaces().dataset("dustmop/movies").await.unwrap();
    assert_eq!(found.path, saved.path);
    assert_eq!(found.dataset.unwrap().title, "Movies");

    net.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_peer_children() {
    let (net, b5, dustmop, _) = common::b5_and_dustmop().await;
    common::save_movies(&dustmop, "comics", "Comics").await;

    let mut children = b5.namespaces().child_addresses("dustmop").await.unwrap();
    children.sort();
    assert_eq!(children, vec!["dustmop/comics", "dustmop/movies"]);

    net.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_store_materializes_then_works_offline() {
    let (net, b5, dustmop, saved) = common::b5_and_dustmop().await;
    let root = saved.path.unwrap();

    let handle = b5.namespaces().store("dustmop/movies").await.unwrap();
    assert_eq!(handle.source, "dustmop");
    assert_eq!(handle.root, root);
    assert!(handle.store.has(&root).await.unwrap());
    assert_eq!(b5.repo().cached_package("dustmop/movies"), Some(root));

    // Second lookup is answered from the package cache
    let again = b5.namespaces().store("dustmop/movies").await.unwrap();
    assert_eq!(again.source, "local");

    dustmop.stop().await.unwrap();
    b5.stop().await.unwrap();
    assert_eq!(b5.namespaces().len(), 1);

    let offline = b5.namespaces().store("dustmop/movies").await.unwrap();
    assert_eq!(offline.source, "local");
    assert_eq!(offline.root, root);

    let dataset = b5.namespaces().dataset("dustmop/movies").await.unwrap();
    assert_eq!(dataset.dataset.unwrap().title, "Movies");

    net.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_peer_is_skipped() {
    let net = ::common::testkit::TestNetwork::new();
    let b5 = net.add_node("b5").await.unwrap();
    let chriswhong = net.add_node("chriswhong").await.unwrap();
    let dustmop = net.add_node("dustmop").await.unwrap();
    common::save_movies(&dustmop, "movies", "Movies").await;

    net.introduce(&b5, &chriswhong).await.unwrap();
    net.introduce(&b5, &dustmop).await.unwrap();
    net.network().set_reachable(chriswhong.id(), false);

    let found = b5.namespaces().dataset("dustmop/movies").await.unwrap();
    assert_eq!(found.peername, "dustmop");

    let missing = b5.namespaces().dataset("dustmop/nope").await;
    assert!(matches!(missing, Err(NamespaceError::NotFound(_))));

    net.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_stalled_peer_is_skipped_at_deadline() {
    let net = ::common::testkit::TestNetwork::new().with_request_timeout(Duration::from_millis(200));
    let b5 = net.add_node("b5").await.unwrap();
    let chriswhong = net.add_node("chriswhong").await.unwrap();
    let dustmop = net.add_node("dustmop").await.unwrap();
    common::save_movies(&dustmop, "movies", "Movies").await;

    net.introduce(&b5, &chriswhong).await.unwrap();
    net.introduce(&b5, &dustmop).await.unwrap();
    net.network().set_stalled(chriswhong.id(), true);

    let found = tokio::time::timeout(
        Duration::from_secs(5),
        b5.namespaces().dataset("dustmop/movies"),
    )
    .await
    .expect("a stalled peer should not hold up the lookup")
    .unwrap();
    assert_eq!(found.peername, "dustmop");
    assert_eq!(found.dataset.unwrap().title, "Movies");

    let handle = b5.namespaces().store("dustmop/movies").await.unwrap();
    assert_eq!(handle.source, "dustmop");

    net.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_search_across_peers() {
    let net = ::common::testkit::TestNetwork::new();
    let b5 = net.add_node("b5").await.unwrap();
    let dustmop = net.add_node("dustmop").await.unwrap();
    let ramfox = net.add_node("ramfox").await.unwrap();
    common::save_movies(&dustmop, "movies", "Movies").await;
    common::save_movies(&ramfox, "films", "Favourite movies").await;
    net.introduce(&b5, &dustmop).await.unwrap();
    net.introduce(&b5, &ramfox).await.unwrap();

    let params = SearchParams {
        query: "movies".into(),
        ..Default::default()
    };
    let mut results: Vec<String> = b5
        .namespaces()
        .search(&params)
        .await
        .unwrap()
        .iter()
        .map(|r| r.address())
        .collect();
    results.sort();
    assert_eq!(results, vec!["dustmop/movies", "ramfox/films"]);

    net.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_offline_search_not_searchable() {
    let (net, b5, _, _) = common::b5_and_dustmop().await;

    let local = Namespaces::new(b5.repo().clone())
        .with(Arc::new(LocalNamespace::new("local", b5.repo().clone())));
    let result = local.search(&SearchParams::default()).await;
    assert!(matches!(result, Err(NamespaceError::NotSearchable)));

    let empty = Namespaces::new(b5.repo().clone());
    assert!(matches!(
        empty.search(&SearchParams::default()).await,
        Err(NamespaceError::NoNamespaces)
    ));

    net.shutdown().await.unwrap();
}
