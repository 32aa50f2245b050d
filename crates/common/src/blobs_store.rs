use std::future::IntoFuture;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use bytes::Bytes;
use iroh_blobs::{
    api::{
        blobs::{BlobStatus, Blobs},
        ExportBaoError, RequestError,
    },
    store::{fs::FsStore, mem::MemStore},
    BlobsProtocol,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::linked_data::{decode_cbor, encode_cbor, CodecError, ContentAddress};

/// Client over a local iroh-blob store.
///  This is the content-addressed store every Repository
///  writes dataset manifests, bodies and profile images into.
/// Every add is tagged by the store, so everything we put is pinned
///  until the repository drops it.
#[derive(Clone, Debug)]
pub struct BlobsStore {
    pub inner: Arc<BlobsProtocol>,
}

impl Deref for BlobsStore {
    type Target = Arc<BlobsProtocol>;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BlobsStoreError {
    #[error("blobs store error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("blob not found: {0}")]
    NotFound(ContentAddress),
    #[error("blob store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("export bao error: {0}")]
    ExportBao(#[from] ExportBaoError),
    #[error("request error: {0}")]
    Request(#[from] RequestError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl BlobsStore {
    /// Load a blob store from the given path on disk
    pub async fn fs(path: &Path) -> Result<Self, BlobsStoreError> {
        tracing::debug!("BlobsStore::fs loading store at {:?}", path);
        let store = FsStore::load(path).await?;
        let blobs = BlobsProtocol::new(&store, None);
        Ok(Self {
            inner: Arc::new(blobs),
        })
    }

    /// Load a memory blobs store
    pub async fn memory() -> Result<Self, BlobsStoreError> {
        let store = MemStore::new();
        let blobs = BlobsProtocol::new(&store, None);
        Ok(Self {
            inner: Arc::new(blobs),
        })
    }

    /// Get a handle to the underlying blobs client against
    ///  the store
    pub fn blobs(&self) -> &Blobs {
        self.inner.store().blobs()
    }

    /// Whether the store holds the complete blob for this address
    pub async fn has(&self, addr: &ContentAddress) -> Result<bool, BlobsStoreError> {
        let Some(hash) = addr.to_hash() else {
            return Ok(false);
        };
        let stat = self
            .blobs()
            .status(hash)
            .await
            .map_err(|err| BlobsStoreError::Default(anyhow!(err)))?;
        Ok(matches!(stat, BlobStatus::Complete { .. }))
    }

    /// Get a blob as bytes
    pub async fn get(&self, addr: &ContentAddress) -> Result<Bytes, BlobsStoreError> {
        if !self.has(addr).await? {
            return Err(BlobsStoreError::NotFound(*addr));
        }
        let hash = addr.to_hash().ok_or(BlobsStoreError::NotFound(*addr))?;
        let bytes = self.blobs().get_bytes(hash).await?;
        Ok(bytes)
    }

    /// Store a vec of bytes as a blob
    pub async fn put(&self, data: impl Into<Bytes>) -> Result<ContentAddress, BlobsStoreError> {
        let data: Bytes = data.into();
        let hash = self.blobs().add_bytes(data).into_future().await?.hash;
        Ok(ContentAddress::from_hash(hash))
    }

    /// Encode a value as DAG-CBOR and store it
    pub async fn put_cbor<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<ContentAddress, BlobsStoreError> {
        let bytes = encode_cbor(value)?;
        self.put(bytes).await
    }

    /// Get a blob and decode it from DAG-CBOR
    pub async fn get_cbor<T: DeserializeOwned>(
        &self,
        addr: &ContentAddress,
    ) -> Result<T, BlobsStoreError> {
        let bytes = self.get(addr).await?;
        Ok(decode_cbor(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_same_bytes_same_address() {
        let store = BlobsStore::memory().await.unwrap();

        let a = store.put(b"hello".to_vec()).await.unwrap();
        let b = store.put(b"hello".to_vec()).await.unwrap();
        let c = store.put(b"world".to_vec()).await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);

        assert!(store.has(&a).await.unwrap());
        assert_eq!(store.get(&a).await.unwrap().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let store = BlobsStore::memory().await.unwrap();
        let foreign: ContentAddress = "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn"
            .parse()
            .unwrap();
        assert!(!store.has(&foreign).await.unwrap());
        assert!(matches!(
            store.get(&foreign).await,
            Err(BlobsStoreError::NotFound(_))
        ));
    }
}
