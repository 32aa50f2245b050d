//! Turning partially specified refs into canonical ones.
//!
//! Local canonicalization never touches the network and never fails just
//!  because something is unknown: an unresolved dataset ref comes back with
//!  `path` still empty, which is how callers decide an operation has to run
//!  online. Only a name that matches several known profiles is an error.

use std::time::Duration;

use crate::crypto::ProfileId;
use crate::p2p::{PeerMessage, PeerReply, PeerTransport, ReplyErrorKind, TransportError};
use crate::reference::{DatasetRef, RefError, ME};
use crate::repo::Repository;

/// Profile ids known locally for a peername, own profile first
fn local_profile_ids(repo: &Repository, peername: &str) -> Vec<ProfileId> {
    let own = repo.profile();
    let mut ids = Vec::new();
    if own.peername == peername {
        ids.push(own.id);
    }
    for peer in repo.peers_by_name(peername) {
        if !ids.contains(&peer.profile.id) {
            ids.push(peer.profile.id);
        }
    }
    ids
}

fn resolve_alias(repo: &Repository, r: &mut DatasetRef) {
    if r.peername == ME {
        let own = repo.profile();
        r.peername = own.peername;
        r.profile_id = Some(own.id);
    }
}

/// Fill `profile_id` from the local address book when exactly one profile
///  carries the ref's peername
fn fill_profile_id(repo: &Repository, r: &mut DatasetRef) -> Result<(), RefError> {
    if r.profile_id.is_some() || r.peername.is_empty() {
        return Ok(());
    }
    let ids = local_profile_ids(repo, &r.peername);
    match ids.as_slice() {
        [] => Ok(()),
        [id] => {
            r.profile_id = Some(*id);
            Ok(())
        }
        _ => Err(RefError::Ambiguous {
            reference: r.to_string(),
            candidates: ids.len(),
        }),
    }
}

/// Resolve a ref using only local data
pub fn canonicalize_dataset_ref(repo: &Repository, r: &mut DatasetRef) -> Result<(), RefError> {
    resolve_alias(repo, r);

    if r.path.is_some() {
        if r.peername.is_empty() && r.name.is_empty() {
            // best effort: name a bare address after a local ref holding it
            if let Ok(found) = repo.get_ref(r) {
                r.peername = found.peername;
                r.name = found.name;
                r.profile_id = found.profile_id;
            }
            return Ok(());
        }
        return fill_profile_id(repo, r);
    }

    if r.is_peer_ref() {
        return fill_profile_id(repo, r);
    }

    let mut matches = repo.refs_named(&r.peername, &r.name);
    if let Some(id) = r.profile_id {
        matches.retain(|m| m.profile_id == Some(id));
    }
    match matches.as_slice() {
        [] => {
            fill_profile_id(repo, r)?;
            match repo.cached_package(&r.address()) {
                Some(root) => {
                    tracing::debug!("{} answered from the package cache", r);
                    r.path = Some(root);
                }
                None => {
                    tracing::debug!("{} not found locally, network resolution required", r);
                }
            }
            Ok(())
        }
        [found] => {
            r.path = found.path;
            r.profile_id = found.profile_id;
            Ok(())
        }
        _ => Err(RefError::Ambiguous {
            reference: r.to_string(),
            candidates: matches.len(),
        }),
    }
}

/// Canonicalize every ref locally and report whether any of them still
///  needs the network. One unresolved ref makes the whole operation online.
pub fn requires_network(repo: &Repository, refs: &mut [DatasetRef]) -> Result<bool, RefError> {
    let mut online = false;
    for r in refs.iter_mut() {
        canonicalize_dataset_ref(repo, r)?;
        online |= r.needs_network();
    }
    Ok(online)
}

/// Peers worth asking about `r`: the owner if known, then peers sharing its
///  peername, then everyone else we know of, in address-book order
fn candidate_peers(
    repo: &Repository,
    transport: &dyn PeerTransport,
    r: &DatasetRef,
) -> Vec<ProfileId> {
    let own = repo.profile().id;
    let mut ordered: Vec<ProfileId> = Vec::new();
    let mut push = |id: ProfileId| {
        if id != own && !ordered.contains(&id) {
            ordered.push(id);
        }
    };
    if let Some(id) = r.profile_id {
        push(id);
    }
    for peer in repo.peers_by_name(&r.peername) {
        push(peer.profile.id);
    }
    if r.profile_id.is_none() {
        for peer in repo.peers() {
            push(peer.profile.id);
        }
        for id in transport.connected_peers() {
            push(id);
        }
    }
    ordered
}

/// Resolve `profile_id` from `peername`, asking the network when the
///  address book does not know the name
pub async fn canonicalize_profile(
    repo: &Repository,
    transport: Option<&dyn PeerTransport>,
    r: &mut DatasetRef,
    timeout: Duration,
) -> Result<(), RefError> {
    resolve_alias(repo, r);
    fill_profile_id(repo, r)?;
    if r.profile_id.is_some() || r.peername.is_empty() {
        return Ok(());
    }
    let transport = transport.ok_or_else(|| {
        RefError::NetworkUnavailable(format!("resolving peer {} requires the network", r))
    })?;

    let lookup = async {
        for peer in candidate_peers(repo, transport, r) {
            match transport.request(peer, PeerMessage::Profile).await {
                Ok(PeerReply::Profile(profile)) => {
                    let addresses = repo.peer(&peer).map(|p| p.addresses).unwrap_or_default();
                    repo.put_peer(profile.clone(), addresses)?;
                    if profile.peername == r.peername {
                        return Ok(Some(profile.id));
                    }
                }
                Ok(other) => tracing::warn!("unexpected reply from {}: {:?}", peer, other),
                Err(TransportError::Unreachable(..)) => continue,
                Err(e) => return Err(RefError::from(e)),
            }
        }
        Ok::<_, RefError>(None)
    };

    match tokio::time::timeout(timeout, lookup).await {
        Ok(Ok(Some(id))) => {
            r.profile_id = Some(id);
            Ok(())
        }
        Ok(Ok(None)) => Err(RefError::NotFound(format!("peer {}", r.peername))),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(RefError::Timeout(r.to_string())),
    }
}

/// Resolve a dataset ref locally, then ask peers for whatever is still
///  missing
pub async fn resolve_ref_online(
    repo: &Repository,
    transport: Option<&dyn PeerTransport>,
    r: &mut DatasetRef,
    timeout: Duration,
) -> Result<(), RefError> {
    canonicalize_dataset_ref(repo, r)?;
    if !r.needs_network() {
        return Ok(());
    }
    if r.is_peer_ref() {
        return canonicalize_profile(repo, transport, r, timeout).await;
    }
    let transport = transport.ok_or_else(|| {
        RefError::NetworkUnavailable(format!("resolving {} requires the network", r))
    })?;

    let query = r.without_dataset();
    let lookup = async {
        for peer in candidate_peers(repo, transport, &query) {
            match transport
                .request(peer, PeerMessage::ResolveRef(query.clone()))
                .await
            {
                Ok(PeerReply::Ref(found)) => return Ok(Some(found)),
                Ok(PeerReply::Error(ReplyErrorKind::NotFound, _)) => continue,
                Ok(other) => tracing::warn!("unexpected reply from {}: {:?}", peer, other),
                Err(TransportError::Unreachable(..)) => continue,
                Err(e) => return Err(RefError::from(e)),
            }
        }
        Ok::<_, RefError>(None)
    };

    match tokio::time::timeout(timeout, lookup).await {
        Ok(Ok(Some(found))) => {
            tracing::debug!("resolved {} over the network to {}", r, found);
            r.path = found.path;
            r.profile_id = found.profile_id;
            Ok(())
        }
        Ok(Ok(None)) => Err(RefError::NotFound(r.to_string())),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(RefError::Timeout(r.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blobs_store::BlobsStore;
    use crate::crypto::SecretKey;
    use crate::profile::Profile;

    async fn repo() -> Repository {
        let store = BlobsStore::memory().await.unwrap();
        Repository::memory(store, Profile::new(SecretKey::generate().public(), "b5"))
    }

    async fn add_ref(repo: &Repository, peername: &str, id: ProfileId, name: &str) -> DatasetRef {
        let path = repo.store().put(format!("{}/{}", peername, name)).await.unwrap();
        let r = DatasetRef {
            peername: peername.into(),
            profile_id: Some(id),
            name: name.into(),
            path: Some(path),
            dataset: None,
        };
        repo.put_ref(&r).unwrap();
        r
    }

    #[tokio::test]
    async fn test_local_match_is_offline() {
        let repo = repo().await;
        let own = repo.profile().id;
        let stored = add_ref(&repo, "b5", own, "comics").await;

        let mut r = DatasetRef::parse("b5/comics").unwrap();
        canonicalize_dataset_ref(&repo, &mut r).unwrap();
        assert!(r.is_canonical());
        assert_eq!(r, stored);

        let mut aliased = DatasetRef::parse("me/comics").unwrap();
        canonicalize_dataset_ref(&repo, &mut aliased).unwrap();
        assert_eq!(aliased, stored);
    }

    #[tokio::test]
    async fn test_canonical_ref_is_idempotent() {
        let repo = repo().await;
        let own = repo.profile().id;
        add_ref(&repo, "b5", own, "comics").await;

        let mut once = DatasetRef::parse("b5/comics").unwrap();
        canonicalize_dataset_ref(&repo, &mut once).unwrap();
        let mut twice = once.clone();
        canonicalize_dataset_ref(&repo, &mut twice).unwrap();
        assert_eq!(
            serde_json::to_vec(&once).unwrap(),
            serde_json::to_vec(&twice).unwrap()
        );
    }

    #[tokio::test]
    async fn test_unknown_ref_flags_network() {
        let repo = repo().await;
        let mut r = DatasetRef::parse("dustmop/comics").unwrap();
        canonicalize_dataset_ref(&repo, &mut r).unwrap();
        assert!(r.path.is_none());
        assert!(r.needs_network());

        let err = resolve_ref_online(&repo, None, &mut r, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, RefError::NetworkUnavailable(_)));
    }

    #[tokio::test]
    async fn test_cached_package_resolves_offline() {
        let repo = repo().await;
        let dustmop = Profile::new(SecretKey::generate().public(), "dustmop");
        repo.put_peer(dustmop.clone(), vec![]).unwrap();
        let root = repo.store().put("dustmop/movies").await.unwrap();
        repo.cache_package("dustmop/movies", root).unwrap();

        let mut r = DatasetRef::parse("dustmop/movies").unwrap();
        canonicalize_dataset_ref(&repo, &mut r).unwrap();
        assert_eq!(r.path, Some(root));
        assert_eq!(r.profile_id, Some(dustmop.id));
        assert!(!r.needs_network());

        let mut other = DatasetRef::parse("dustmop/comics").unwrap();
        canonicalize_dataset_ref(&repo, &mut other).unwrap();
        assert!(other.needs_network());
    }

    #[tokio::test]
    async fn test_requires_network_any_unresolved() {
        let repo = repo().await;
        let own = repo.profile().id;
        add_ref(&repo, "b5", own, "comics").await;

        let mut offline = vec![
            DatasetRef::parse("b5/comics").unwrap(),
            DatasetRef::parse("QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn").unwrap(),
        ];
        assert!(!requires_network(&repo, &mut offline).unwrap());

        offline.push(DatasetRef::parse("dustmop/movies").unwrap());
        assert!(requires_network(&repo, &mut offline).unwrap());
    }

    #[tokio::test]
    async fn test_bare_hash_fills_names_best_effort() {
        let repo = repo().await;
        let own = repo.profile().id;
        let stored = add_ref(&repo, "b5", own, "comics").await;

        let mut r = DatasetRef::from_path(stored.path.unwrap());
        canonicalize_dataset_ref(&repo, &mut r).unwrap();
        assert_eq!(r.address(), "b5/comics");

        let foreign = "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn";
        let mut r = DatasetRef::parse(foreign).unwrap();
        canonicalize_dataset_ref(&repo, &mut r).unwrap();
        assert!(r.peername.is_empty());
        assert!(!r.needs_network());
    }

    #[tokio::test]
    async fn test_ambiguous_peername() {
        let repo = repo().await;
        let a = Profile::new(SecretKey::generate().public(), "dustmop");
        let b = Profile::new(SecretKey::generate().public(), "dustmop");
        repo.put_peer(a.clone(), vec![]).unwrap();
        repo.put_peer(b.clone(), vec![]).unwrap();

        let mut peer = DatasetRef::parse("dustmop").unwrap();
        assert!(matches!(
            canonicalize_dataset_ref(&repo, &mut peer),
            Err(RefError::Ambiguous { candidates: 2, .. })
        ));

        add_ref(&repo, "dustmop", a.id, "movies").await;
        add_ref(&repo, "dustmop", b.id, "movies").await;
        let mut r = DatasetRef::parse("dustmop/movies").unwrap();
        assert!(matches!(
            canonicalize_dataset_ref(&repo, &mut r),
            Err(RefError::Ambiguous { .. })
        ));

        // pinning the owner disambiguates
        let mut pinned = DatasetRef {
            profile_id: Some(b.id),
            ..DatasetRef::parse("dustmop/movies").unwrap()
        };
        canonicalize_dataset_ref(&repo, &mut pinned).unwrap();
        assert!(pinned.is_canonical());
    }
}
