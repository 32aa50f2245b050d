//! Reference resolution with and without the network

mod common;

use std::str::FromStr;
use std::time::Duration;

use ::common::linked_data::ContentAddress;
use ::common::reference::{DatasetRef, RefError};
use ::common::testkit::TestNetwork;

#[tokio::test]
async fn test_resolve_ref_from_peer() {
    let (net, b5, dustmop, saved) = common::b5_and_dustmop().await;

    let mut r = DatasetRef::parse("dustmop/movies").unwrap();
    b5.canonicalize(&mut r).unwrap();
    assert_eq!(r.profile_id, Some(dustmop.id()));
    assert!(r.path.is_none());

    b5.resolve_ref_online(&mut r).await.unwrap();
    assert_eq!(r.path, saved.path);
    assert!(r.is_canonical());

    net.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_resolve_profile_of_connected_stranger() {
    let net = TestNetwork::new();
    let b5 = net.add_node("b5").await.unwrap();
    let dustmop = net.add_node("dustmop").await.unwrap();

    // Connected but never recorded in the address book
    b5.transport()
        .unwrap()
        .request(dustmop.id(), ::common::p2p::PeerMessage::Profile)
        .await
        .unwrap();
    assert!(b5.repo().peers_by_name("dustmop").is_empty());

    let mut r = DatasetRef::parse("dustmop").unwrap();
    b5.canonicalize_profile(&mut r).await.unwrap();
    assert_eq!(r.profile_id, Some(dustmop.id()));
    assert_eq!(b5.repo().peers_by_name("dustmop").len(), 1);

    net.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unknown_ref_not_found_online() {
    let (net, b5, _, _) = common::b5_and_dustmop().await;

    let mut r = DatasetRef::parse("dustmop/comics").unwrap();
    let err = b5.resolve_ref_online(&mut r).await.unwrap_err();
    assert!(matches!(err, RefError::NotFound(_)));

    net.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_offline_unknown_ref_needs_network() {
    let net = TestNetwork::new();
    let b5 = net.build_node("b5").await.unwrap();

    let mut r = DatasetRef::parse("b5/comics").unwrap();
    b5.canonicalize(&mut r).unwrap();
    assert!(r.needs_network());

    let err = b5.resolve_ref_online(&mut r).await.unwrap_err();
    assert!(matches!(err, RefError::NetworkUnavailable(_)));
}

#[tokio::test]
async fn test_bare_hash_resolves_offline() {
    let net = TestNetwork::new();
    let b5 = net.build_node("b5").await.unwrap();

    let hash = "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn";
    let mut r = DatasetRef::parse(hash).unwrap();
    b5.resolve_ref_online(&mut r).await.unwrap();
    assert_eq!(r.path, Some(ContentAddress::from_str(hash).unwrap()));
    assert!(r.name.is_empty());
}

#[tokio::test]
async fn test_stalled_peer_times_out() {
    let net = TestNetwork::new().with_request_timeout(Duration::from_millis(200));
    let b5 = net.add_node("b5").await.unwrap();
    let dustmop = net.add_node("dustmop").await.unwrap();
    common::save_movies(&dustmop, "movies", "Movies").await;
    net.introduce(&b5, &dustmop).await.unwrap();
    net.network().set_stalled(dustmop.id(), true);

    let mut r = DatasetRef::parse("dustmop/movies").unwrap();
    let err = tokio::time::timeout(Duration::from_secs(5), b5.resolve_ref_online(&mut r))
        .await
        .expect("resolution should give up at its deadline")
        .unwrap_err();
    assert!(matches!(err, RefError::Timeout(_)));
    assert!(r.path.is_none());

    net.network().set_stalled(dustmop.id(), false);
    b5.resolve_ref_online(&mut r).await.unwrap();
    assert!(r.is_canonical());

    net.shutdown().await.unwrap();
}
