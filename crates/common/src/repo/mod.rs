//! The local repository: everything this node has without asking the network.
//!
//! Holds the blob store handle, the ordered set of known dataset refs, the
//!  peer address book, the package cache index and the owning profile. All
//!  mutation happens under one write lock; disk-backed repositories flush a
//!  JSON snapshot of the touched table before the lock is released.

mod snapshot;

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::blobs_store::{BlobsStore, BlobsStoreError};
use crate::crypto::ProfileId;
use crate::dataset::{Block, Dataset, Package, PackageError};
use crate::linked_data::ContentAddress;
use crate::profile::Profile;
use crate::reference::{is_valid_name, DatasetRef};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    Exists(String),
    #[error("invalid ref: {0}")]
    InvalidRef(String),
    #[error("blob store error: {0}")]
    Store(#[from] BlobsStoreError),
    #[error("package error: {0}")]
    Package(#[from] PackageError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Address book entry for a known peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub profile: Profile,
    /// Transport addresses the peer was last reachable at
    pub addresses: Vec<String>,
}

#[derive(Debug)]
struct RepoInner {
    profile: Profile,
    refs: Vec<DatasetRef>,
    peers: Vec<PeerInfo>,
    packages: BTreeMap<String, ContentAddress>,
}

#[derive(Debug)]
pub struct Repository {
    store: BlobsStore,
    inner: RwLock<RepoInner>,
    path: Option<PathBuf>,
}

impl Repository {
    /// A repository that lives only as long as the process
    pub fn memory(store: BlobsStore, profile: Profile) -> Self {
        Self {
            store,
            inner: RwLock::new(RepoInner {
                profile,
                refs: Vec::new(),
                peers: Vec::new(),
                packages: BTreeMap::new(),
            }),
            path: None,
        }
    }

    /// Open a repository whose tables are snapshotted under `dir`
    pub fn load(dir: &Path, store: BlobsStore, profile: Profile) -> Result<Self, RepoError> {
        std::fs::create_dir_all(dir)?;
        let refs = snapshot::read(dir, snapshot::REFS_FILE)?;
        let peers = snapshot::read(dir, snapshot::PEERS_FILE)?;
        let packages = snapshot::read(dir, snapshot::PACKAGES_FILE)?;
        tracing::debug!("loaded repository from {:?}", dir);
        Ok(Self {
            store,
            inner: RwLock::new(RepoInner {
                profile,
                refs,
                peers,
                packages,
            }),
            path: Some(dir.to_path_buf()),
        })
    }

    pub fn store(&self) -> &BlobsStore {
        &self.store
    }

    pub fn profile(&self) -> Profile {
        self.inner.read().profile.clone()
    }

    /// Edit the owning profile in place. The profile id never changes; a
    ///  new peername carries every owned ref along under the same lock.
    pub fn update_profile(
        &self,
        edit: impl FnOnce(&mut Profile),
    ) -> Result<Profile, RepoError> {
        let mut inner = self.inner.write();
        let id = inner.profile.id;
        let before = inner.profile.peername.clone();
        edit(&mut inner.profile);
        inner.profile.id = id;
        let profile = inner.profile.clone();
        if profile.peername != before {
            let moved = retag(&mut inner.refs, &id, &profile.peername);
            tracing::info!("peername {} -> {}, {} refs moved", before, profile.peername, moved);
            self.flush(snapshot::REFS_FILE, &inner.refs)?;
        }
        Ok(profile)
    }

    /* Refs */

    /// Record a ref, replacing any existing ref with the same owner and name
    pub fn put_ref(&self, r: &DatasetRef) -> Result<(), RepoError> {
        if r.peername.is_empty() || r.name.is_empty() || r.path.is_none() {
            return Err(RepoError::InvalidRef(format!(
                "{} needs a peername, name and path",
                r
            )));
        }
        let stored = r.without_dataset();
        let mut inner = self.inner.write();
        match inner
            .refs
            .iter_mut()
            .find(|e| e.same_name(&stored) && e.profile_id == stored.profile_id)
        {
            Some(existing) => *existing = stored,
            None => inner.refs.push(stored),
        }
        self.flush(snapshot::REFS_FILE, &inner.refs)
    }

    /// Find a ref by path alone, or by peername and name (and profile id
    ///  when the query carries one)
    pub fn get_ref(&self, query: &DatasetRef) -> Result<DatasetRef, RepoError> {
        let inner = self.inner.read();
        let found = if query.peername.is_empty() && query.name.is_empty() {
            query
                .path
                .and_then(|p| inner.refs.iter().find(|r| r.path == Some(p)))
        } else {
            inner.refs.iter().find(|r| {
                r.same_name(query)
                    && (query.profile_id.is_none() || r.profile_id == query.profile_id)
            })
        };
        found
            .cloned()
            .ok_or_else(|| RepoError::NotFound(query.to_string()))
    }

    /// Every ref matching peername and name, across all owners
    pub fn refs_named(&self, peername: &str, name: &str) -> Vec<DatasetRef> {
        self.inner
            .read()
            .refs
            .iter()
            .filter(|r| r.peername == peername && r.name == name)
            .cloned()
            .collect()
    }

    pub fn refs(&self) -> Vec<DatasetRef> {
        self.inner.read().refs.clone()
    }

    pub fn refs_page(&self, offset: usize, limit: usize) -> Vec<DatasetRef> {
        self.inner
            .read()
            .refs
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Give a ref a new name, keeping its content and owner
    pub fn rename_ref(&self, from: &DatasetRef, new_name: &str) -> Result<DatasetRef, RepoError> {
        let mut inner = self.inner.write();
        if inner
            .refs
            .iter()
            .any(|r| r.peername == from.peername && r.name == new_name)
        {
            return Err(RepoError::Exists(format!("{}/{}", from.peername, new_name)));
        }
        let existing = inner
            .refs
            .iter_mut()
            .find(|r| {
                r.same_name(from) && (from.profile_id.is_none() || r.profile_id == from.profile_id)
            })
            .ok_or_else(|| RepoError::NotFound(from.to_string()))?;
        existing.name = new_name.to_string();
        let renamed = existing.clone();
        self.flush(snapshot::REFS_FILE, &inner.refs)?;
        Ok(renamed)
    }

    pub fn delete_ref(&self, r: &DatasetRef) -> Result<DatasetRef, RepoError> {
        let mut inner = self.inner.write();
        let pos = inner
            .refs
            .iter()
            .position(|e| {
                e.same_name(r) && (r.profile_id.is_none() || e.profile_id == r.profile_id)
            })
            .ok_or_else(|| RepoError::NotFound(r.to_string()))?;
        let removed = inner.refs.remove(pos);
        self.flush(snapshot::REFS_FILE, &inner.refs)?;
        Ok(removed)
    }

    /* Peers */

    /// Add or refresh a peer in the address book
    pub fn put_peer(&self, profile: Profile, addresses: Vec<String>) -> Result<(), RepoError> {
        let mut inner = self.inner.write();
        match inner.peers.iter_mut().find(|p| p.profile.id == profile.id) {
            Some(existing) => {
                existing.profile = profile;
                if !addresses.is_empty() {
                    existing.addresses = addresses;
                }
            }
            None => inner.peers.push(PeerInfo { profile, addresses }),
        }
        self.flush(snapshot::PEERS_FILE, &inner.peers)
    }

    pub fn peers(&self) -> Vec<PeerInfo> {
        self.inner.read().peers.clone()
    }

    pub fn peers_by_name(&self, peername: &str) -> Vec<PeerInfo> {
        self.inner
            .read()
            .peers
            .iter()
            .filter(|p| p.profile.peername == peername)
            .cloned()
            .collect()
    }

    pub fn peer(&self, id: &ProfileId) -> Option<PeerInfo> {
        self.inner
            .read()
            .peers
            .iter()
            .find(|p| p.profile.id == *id)
            .cloned()
    }

    /* Package cache */

    /// Remember that a namespace address was materialized at `root`.
    /// Last writer wins: content behind a root never changes.
    pub fn cache_package(&self, address: &str, root: ContentAddress) -> Result<(), RepoError> {
        let mut inner = self.inner.write();
        inner.packages.insert(address.to_string(), root);
        self.flush(snapshot::PACKAGES_FILE, &inner.packages)
    }

    pub fn cached_package(&self, address: &str) -> Option<ContentAddress> {
        self.inner.read().packages.get(address).copied()
    }

    pub fn cached_packages(&self) -> Vec<(String, ContentAddress)> {
        self.inner
            .read()
            .packages
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    /* Datasets */

    /// Store a JSON body blob
    pub async fn put_body(&self, body: &Value) -> Result<ContentAddress, RepoError> {
        let bytes = serde_json::to_vec(body)?;
        Ok(self.store.put(bytes).await?)
    }

    pub async fn load_body(&self, path: &ContentAddress) -> Result<Value, RepoError> {
        let bytes = self.store.get(path).await.map_err(not_found)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Store a dataset manifest, returning its address
    pub async fn put_dataset(&self, dataset: &Dataset) -> Result<ContentAddress, RepoError> {
        Ok(self.store.put_cbor(dataset).await?)
    }

    pub async fn load_dataset(&self, path: &ContentAddress) -> Result<Dataset, RepoError> {
        self.store.get_cbor(path).await.map_err(not_found)
    }

    /// Write a new version of `name` owned by this repository's profile.
    ///
    /// The new manifest links the current version as `previous`. Without a
    ///  new body the previous version's body is carried forward.
    pub async fn save_dataset(
        &self,
        name: &str,
        mut dataset: Dataset,
        body: Option<&Value>,
    ) -> Result<DatasetRef, RepoError> {
        if !is_valid_name(name) {
            return Err(RepoError::InvalidRef(format!("invalid dataset name '{}'", name)));
        }
        let profile = self.profile();
        let mut r = DatasetRef {
            peername: profile.peername,
            profile_id: Some(profile.id),
            name: name.to_string(),
            path: None,
            dataset: None,
        };
        let current = self.get_ref(&r).ok().and_then(|c| c.path);

        if let Some(body) = body {
            dataset.body_path = Some(self.put_body(body).await?);
        } else if dataset.body_path.is_none() {
            if let Some(path) = current {
                dataset.body_path = self.load_dataset(&path).await?.body_path;
            }
        }
        dataset.previous = current;
        dataset.timestamp = Utc::now();

        let path = self.put_dataset(&dataset).await?;
        r.path = Some(path);
        self.put_ref(&r)?;
        tracing::info!("saved {} at {}", r.address(), path);

        r.dataset = Some(dataset);
        Ok(r)
    }

    /// Collect the manifest at `root`, its body and every previous version
    pub async fn package(&self, root: &ContentAddress) -> Result<Package, RepoError> {
        let mut blocks = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(*root);

        while let Some(addr) = next.take() {
            if !seen.insert(addr) {
                break;
            }
            let data = self.store.get(&addr).await.map_err(not_found)?;
            let dataset: Dataset = crate::linked_data::decode_cbor(&data)
                .map_err(|e| RepoError::Store(e.into()))?;
            blocks.push(Block {
                address: addr,
                data: data.to_vec(),
            });
            if let Some(body) = dataset.body_path {
                if seen.insert(body) {
                    let body_data = self.store.get(&body).await.map_err(not_found)?;
                    blocks.push(Block {
                        address: body,
                        data: body_data.to_vec(),
                    });
                }
            }
            next = dataset.previous;
        }

        Ok(Package {
            root: *root,
            blocks,
        })
    }

    /// Write every block of a verified package into the local store
    pub async fn import_package(&self, package: &Package) -> Result<ContentAddress, RepoError> {
        package.verify()?;
        for block in &package.blocks {
            let addr = self.store.put(block.data.clone()).await?;
            if addr != block.address {
                return Err(PackageError::Corrupt(block.address).into());
            }
        }
        tracing::debug!(
            "imported package {} ({} blocks, {} bytes)",
            package.root,
            package.blocks.len(),
            package.size()
        );
        Ok(package.root)
    }

    /// Local refs whose name, title or description match `term`
    pub async fn search(&self, term: &str, limit: usize) -> Result<Vec<DatasetRef>, RepoError> {
        let needle = term.to_lowercase();
        let mut results = Vec::new();
        for r in self.refs() {
            if results.len() >= limit {
                break;
            }
            let Some(path) = r.path else { continue };
            let name_hit = r.name.to_lowercase().contains(&needle);
            let dataset = self.load_dataset(&path).await.ok();
            let body_hit = dataset.as_ref().is_some_and(|d| d.matches(term));
            if name_hit || body_hit {
                results.push(DatasetRef { dataset, ..r });
            }
        }
        Ok(results)
    }

    fn flush<T: Serialize>(&self, file: &str, value: &T) -> Result<(), RepoError> {
        match &self.path {
            Some(dir) => snapshot::write(dir, file, value),
            None => Ok(()),
        }
    }
}

/// Rewrite owned refs in place, dropping any that collapse onto an entry
///  already carrying the new name
fn retag(refs: &mut Vec<DatasetRef>, id: &ProfileId, peername: &str) -> usize {
    let mut moved = 0;
    for r in refs.iter_mut() {
        if r.profile_id.as_ref() == Some(id) && r.peername != peername {
            r.peername = peername.to_string();
            moved += 1;
        }
    }
    let mut seen = HashSet::new();
    refs.retain(|r| seen.insert((r.profile_id, r.peername.clone(), r.name.clone())));
    moved
}

fn not_found(err: BlobsStoreError) -> RepoError {
    match err {
        BlobsStoreError::NotFound(addr) => RepoError::NotFound(addr.to_string()),
        other => RepoError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SecretKey;
    use serde_json::json;
    use std::sync::Arc;

    async fn repo(peername: &str) -> Repository {
        let store = BlobsStore::memory().await.unwrap();
        Repository::memory(store, Profile::new(SecretKey::generate().public(), peername))
    }

    async fn save(repo: &Repository, name: &str, previous: Option<ContentAddress>) -> DatasetRef {
        let body_path = repo.put_body(&json!([[1, "a"]])).await.unwrap();
        let dataset = Dataset {
            title: name.to_string(),
            body_path: Some(body_path),
            previous,
            ..Default::default()
        };
        let path = repo.put_dataset(&dataset).await.unwrap();
        let profile = repo.profile();
        let r = DatasetRef {
            peername: profile.peername,
            profile_id: Some(profile.id),
            name: name.to_string(),
            path: Some(path),
            dataset: None,
        };
        repo.put_ref(&r).unwrap();
        r
    }

    #[tokio::test]
    async fn test_ref_lifecycle() {
        let repo = repo("b5").await;
        let r = save(&repo, "comics", None).await;

        let found = repo.get_ref(&DatasetRef::new("b5", "comics")).unwrap();
        assert_eq!(found, r);
        let by_path = repo.get_ref(&DatasetRef::from_path(r.path.unwrap())).unwrap();
        assert_eq!(by_path.name, "comics");

        let renamed = repo.rename_ref(&r, "graphic_novels").unwrap();
        assert_eq!(renamed.name, "graphic_novels");
        assert!(repo.get_ref(&DatasetRef::new("b5", "comics")).is_err());

        save(&repo, "movies", None).await;
        assert!(matches!(
            repo.rename_ref(&renamed, "movies"),
            Err(RepoError::Exists(_))
        ));

        repo.delete_ref(&renamed).unwrap();
        assert_eq!(repo.refs().len(), 1);
        assert_eq!(repo.refs_page(1, 10).len(), 0);
    }

    #[tokio::test]
    async fn test_save_dataset_links_versions() {
        let repo = repo("b5").await;
        let v1 = repo
            .save_dataset("comics", Dataset::default(), Some(&json!([["a"]])))
            .await
            .unwrap();
        let v2 = repo
            .save_dataset("comics", Dataset::default(), None)
            .await
            .unwrap();

        let d1 = v1.dataset.unwrap();
        let d2 = v2.dataset.unwrap();
        assert_eq!(d2.previous, v1.path);
        assert_eq!(d2.body_path, d1.body_path);
        assert_eq!(repo.refs().len(), 1);
        assert_eq!(repo.get_ref(&DatasetRef::new("b5", "comics")).unwrap().path, v2.path);

        assert!(matches!(
            repo.save_dataset("no good", Dataset::default(), None).await,
            Err(RepoError::InvalidRef(_))
        ));
    }

    #[tokio::test]
    async fn test_peername_change_moves_refs_in_place() {
        let repo = repo("b5").await;
        let own = repo.profile().id;
        save(&repo, "movies", None).await;
        save(&repo, "comics", None).await;
        let other = Profile::new(SecretKey::generate().public(), "dustmop");
        let path = repo.store().put("dustmop/films").await.unwrap();
        repo.put_ref(&DatasetRef {
            peername: other.peername.clone(),
            profile_id: Some(other.id),
            name: "films".into(),
            path: Some(path),
            dataset: None,
        })
        .unwrap();

        let profile = repo
            .update_profile(|p| {
                p.peername = "brendan".into();
                p.id = other.id;
            })
            .unwrap();
        assert_eq!(profile.id, own);

        let refs = repo.refs();
        assert_eq!(refs.len(), 3);
        assert_eq!(refs.iter().filter(|r| r.peername == "brendan").count(), 2);
        assert!(repo.refs_named("b5", "movies").is_empty());
        assert_eq!(repo.refs_named("dustmop", "films").len(), 1);

        let same = repo.update_profile(|p| p.name = "Brendan".into()).unwrap();
        assert_eq!(same.peername, "brendan");
        assert_eq!(repo.refs().len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_profile_edits_both_land() {
        let repo = Arc::new(repo("b5").await);
        let barrier = Arc::new(std::sync::Barrier::new(2));

        let edits = [("name", "Brendan"), ("email", "b5@example.com")].map(|(field, value)| {
            let repo = repo.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                repo.update_profile(|p| match field {
                    "name" => p.name = value.to_string(),
                    _ => p.email = value.to_string(),
                })
                .unwrap();
            })
        });
        for edit in edits {
            edit.join().unwrap();
        }

        let profile = repo.profile();
        assert_eq!(profile.name, "Brendan");
        assert_eq!(profile.email, "b5@example.com");
    }

    #[tokio::test]
    async fn test_put_ref_requires_path() {
        let repo = repo("b5").await;
        assert!(matches!(
            repo.put_ref(&DatasetRef::new("b5", "comics")),
            Err(RepoError::InvalidRef(_))
        ));
    }

    #[tokio::test]
    async fn test_package_walks_history_and_imports() {
        let source = repo("b5").await;
        let v1 = save(&source, "comics", None).await;
        let v2 = save(&source, "comics", v1.path).await;

        let package = source.package(&v2.path.unwrap()).await.unwrap();
        // two manifests sharing one body blob
        assert_eq!(package.blocks.len(), 3);

        let sink = repo("dustmop").await;
        let root = sink.import_package(&package).await.unwrap();
        assert_eq!(root, v2.path.unwrap());
        let dataset = sink.load_dataset(&root).await.unwrap();
        assert_eq!(dataset.previous, v1.path);
    }

    #[tokio::test]
    async fn test_snapshots_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobsStore::memory().await.unwrap();
        let profile = Profile::new(SecretKey::generate().public(), "b5");
        let peer = Profile::new(SecretKey::generate().public(), "dustmop");

        let path = {
            let repo = Repository::load(dir.path(), store.clone(), profile.clone()).unwrap();
            let r = save(&repo, "comics", None).await;
            repo.put_peer(peer.clone(), vec!["127.0.0.1:4000".into()])
                .unwrap();
            repo.cache_package("dustmop/movies", r.path.unwrap()).unwrap();
            r.path
        };

        let repo = Repository::load(dir.path(), store, profile).unwrap();
        assert_eq!(repo.refs().len(), 1);
        assert_eq!(repo.peers_by_name("dustmop").len(), 1);
        assert_eq!(repo.peer(&peer.id).unwrap().addresses.len(), 1);
        assert_eq!(repo.cached_package("dustmop/movies"), path);
    }
}
