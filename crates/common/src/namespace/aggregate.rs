use std::sync::Arc;

use crate::dataset::Package;
use crate::reference::DatasetRef;
use crate::repo::Repository;

use super::{
    parse_address, Namespace, NamespaceError, NamespaceKind, SearchParams, StoreHandle,
};

/// Walk the sources in registration order and return the first success.
/// Soft failures move on to the next source, hard failures stop the walk.
macro_rules! first_match {
    ($self:ident, $op:literal, $addr:expr, |$ns:ident| $call:expr) => {{
        for $ns in &$self.sources {
            match $call.await {
                Ok(found) => {
                    tracing::debug!("{} {} answered by {}", $op, $addr, $ns.name());
                    return Ok(found);
                }
                Err(e) if e.is_soft() => {
                    tracing::debug!("{} {} skipped {}: {}", $op, $addr, $ns.name(), e);
                }
                Err(e) => {
                    tracing::warn!("{} {} failed on {}: {}", $op, $addr, $ns.name(), e);
                    return Err(e);
                }
            }
        }
        Err(NamespaceError::NotFound(format!(
            "{} in any of {} namespaces",
            $addr,
            $self.sources.len()
        )))
    }};
}

/// Ordered composite of namespaces.
///
/// Lookups are first-match in registration order, so earlier sources shadow
///  later ones. `search` is the exception and unions every searchable
///  source. `store` materializes network results into `local`, the only
///  place network data is ever written.
#[derive(Debug, Clone)]
pub struct Namespaces {
    local: Arc<Repository>,
    sources: Vec<Arc<dyn Namespace>>,
}

impl Namespaces {
    /// An empty aggregate that materializes into `local`
    pub fn new(local: Arc<Repository>) -> Self {
        Self {
            local,
            sources: Vec::new(),
        }
    }

    pub fn register(&mut self, ns: Arc<dyn Namespace>) {
        self.sources.push(ns);
    }

    pub fn with(mut self, ns: Arc<dyn Namespace>) -> Self {
        self.register(ns);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Name and kind of every source, in order
    pub fn describe(&self) -> Vec<(String, NamespaceKind)> {
        self.sources
            .iter()
            .map(|ns| (ns.name().to_string(), ns.kind()))
            .collect()
    }

    pub async fn child_addresses(&self, addr: &str) -> Result<Vec<String>, NamespaceError> {
        first_match!(self, "child_addresses", addr, |ns| ns.child_addresses(addr))
    }

    pub async fn child_datasets(&self, addr: &str) -> Result<Vec<DatasetRef>, NamespaceError> {
        first_match!(self, "child_datasets", addr, |ns| ns.child_datasets(addr))
    }

    pub async fn dataset(&self, addr: &str) -> Result<DatasetRef, NamespaceError> {
        first_match!(self, "dataset", addr, |ns| ns.dataset(addr))
    }

    pub async fn package(&self, addr: &str) -> Result<Package, NamespaceError> {
        first_match!(self, "package", addr, |ns| ns.package(addr))
    }

    /// A local store holding the dataset at `addr`.
    ///
    /// Local sources hand back their own store. A network source's package
    ///  is downloaded into the local repository first and the address is
    ///  recorded in the package cache, so later calls are answered offline.
    pub async fn store(&self, addr: &str) -> Result<StoreHandle, NamespaceError> {
        first_match!(self, "store", addr, |ns| async {
            match ns.kind() {
                NamespaceKind::Local => ns.store(addr).await,
                NamespaceKind::Network => {
                    let package = ns.package(addr).await?;
                    self.materialize(&**ns, addr, package).await
                }
            }
        })
    }

    async fn materialize(
        &self,
        source: &dyn Namespace,
        addr: &str,
        package: Package,
    ) -> Result<StoreHandle, NamespaceError> {
        let root = self.local.import_package(&package).await?;
        let key = parse_address(addr)?.address();
        if !key.is_empty() {
            self.local.cache_package(&key, root)?;
        }
        tracing::info!(
            "materialized {} from {} at {} ({} blocks)",
            addr,
            source.name(),
            root,
            package.blocks.len()
        );
        Ok(StoreHandle {
            store: self.local.store().clone(),
            root,
            source: source.name().to_string(),
        })
    }

    /// Union of results from every searchable source. Sources without the
    ///  capability are skipped; an error from any searched source is
    ///  returned as is.
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<DatasetRef>, NamespaceError> {
        if self.sources.is_empty() {
            return Err(NamespaceError::NoNamespaces);
        }
        let mut searched = false;
        let mut results = Vec::new();
        for ns in &self.sources {
            let Some(searchable) = ns.as_searchable() else {
                continue;
            };
            searched = true;
            results.extend(searchable.search(params).await?);
        }
        if !searched {
            return Err(NamespaceError::NotSearchable);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blobs_store::BlobsStore;
    use crate::crypto::SecretKey;
    use crate::dataset::Dataset;
    use crate::namespace::{LocalNamespace, Searchable};
    use crate::profile::Profile;
    use async_trait::async_trait;

    async fn repo_with(peername: &str, name: &str, title: &str) -> Arc<Repository> {
        let store = BlobsStore::memory().await.unwrap();
        let profile = Profile::new(SecretKey::generate().public(), peername);
        let repo = Repository::memory(store, profile.clone());
        let dataset = Dataset {
            title: title.to_string(),
            ..Default::default()
        };
        let path = repo.put_dataset(&dataset).await.unwrap();
        repo.put_ref(&DatasetRef {
            peername: peername.into(),
            profile_id: Some(profile.id),
            name: name.into(),
            path: Some(path),
            dataset: None,
        })
        .unwrap();
        Arc::new(repo)
    }

    /// Searchable source that returns a fixed result set
    #[derive(Debug)]
    struct Index(Vec<DatasetRef>);

    #[async_trait]
    impl Namespace for Index {
        fn name(&self) -> &str {
            "index"
        }
        fn kind(&self) -> NamespaceKind {
            NamespaceKind::Network
        }
        async fn child_addresses(&self, a: &str) -> Result<Vec<String>, NamespaceError> {
            Err(NamespaceError::NotFound(a.into()))
        }
        async fn child_datasets(&self, a: &str) -> Result<Vec<DatasetRef>, NamespaceError> {
            Err(NamespaceError::NotFound(a.into()))
        }
        async fn dataset(&self, a: &str) -> Result<DatasetRef, NamespaceError> {
            Err(NamespaceError::NotFound(a.into()))
        }
        async fn package(&self, a: &str) -> Result<Package, NamespaceError> {
            Err(NamespaceError::NotFound(a.into()))
        }
        async fn store(&self, _: &str) -> Result<StoreHandle, NamespaceError> {
            Err(NamespaceError::Unsupported("store"))
        }
        fn as_searchable(&self) -> Option<&dyn Searchable> {
            Some(self)
        }
    }

    #[async_trait]
    impl Searchable for Index {
        async fn search(&self, _: &SearchParams) -> Result<Vec<DatasetRef>, NamespaceError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_first_registered_wins() {
        let a = repo_with("b5", "comics", "from a").await;
        let b = repo_with("b5", "comics", "from b").await;
        let ns_a: Arc<dyn Namespace> = Arc::new(LocalNamespace::new("a", a.clone()));
        let ns_b: Arc<dyn Namespace> = Arc::new(LocalNamespace::new("b", b));

        let ab = Namespaces::new(a.clone())
            .with(ns_a.clone())
            .with(ns_b.clone());
        let ba = Namespaces::new(a).with(ns_b).with(ns_a);

        for _ in 0..100 {
            let found = ab.dataset("b5/comics").await.unwrap();
            assert_eq!(found.dataset.unwrap().title, "from a");
        }
        let children = ab.child_datasets("b5").await.unwrap();
        assert_eq!(children[0].dataset.as_ref().unwrap().title, "from a");
        let children = ba.child_datasets("b5").await.unwrap();
        assert_eq!(children[0].dataset.as_ref().unwrap().title, "from b");
    }

    #[tokio::test]
    async fn test_falls_through_and_exhausts() {
        let a = repo_with("b5", "comics", "comics").await;
        let b = repo_with("dustmop", "movies", "movies").await;
        let all = Namespaces::new(a.clone())
            .with(Arc::new(LocalNamespace::new("a", a)))
            .with(Arc::new(LocalNamespace::new("b", b)));

        let found = all.dataset("dustmop/movies").await.unwrap();
        assert_eq!(found.dataset.unwrap().title, "movies");
        assert_eq!(all.child_addresses("").await.unwrap(), vec!["b5"]);

        assert!(matches!(
            all.dataset("nobody/nothing").await,
            Err(NamespaceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_search_union_and_capability() {
        let a = repo_with("b5", "comics", "comics").await;
        let local: Arc<dyn Namespace> = Arc::new(LocalNamespace::new("local", a.clone()));
        let hit = DatasetRef::new("dustmop", "movies");
        let index: Arc<dyn Namespace> = Arc::new(Index(vec![hit.clone()]));

        let params = SearchParams {
            query: "movies".into(),
            ..Default::default()
        };

        let empty = Namespaces::new(a.clone());
        assert!(matches!(
            empty.search(&params).await,
            Err(NamespaceError::NoNamespaces)
        ));

        let unsearchable = Namespaces::new(a.clone()).with(local.clone());
        assert!(matches!(
            unsearchable.search(&params).await,
            Err(NamespaceError::NotSearchable)
        ));

        let only_b = Namespaces::new(a.clone()).with(index.clone());
        let mixed = Namespaces::new(a).with(local).with(index);
        assert_eq!(mixed.search(&params).await.unwrap(), vec![hit]);
        assert_eq!(
            mixed.search(&params).await.unwrap(),
            only_b.search(&params).await.unwrap()
        );
    }
}
