use std::fmt;
use std::str::FromStr;

use iroh_blobs::Hash;
use multihash::Multihash;
use serde::{de::DeserializeOwned, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};

pub use cid::Cid;

/// Multicodec for raw bytes
pub const RAW_CODEC: u64 = 0x55;
/// Multihash code for BLAKE3-256, the digest iroh-blobs addresses by
pub const BLAKE3_CODE: u64 = 0x1e;
/// Optional path prefix accepted in front of a content address
pub const IPFS_PREFIX: &str = "/ipfs/";

#[derive(Debug, thiserror::Error)]
pub enum CidError {
    #[error("invalid content address '{0}': {1}")]
    Invalid(String, cid::Error),
    #[error("multihash error: {0}")]
    Multihash(#[from] multihash::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("dag-cbor encode error: {0}")]
    Encode(String),
    #[error("dag-cbor decode error: {0}")]
    Decode(String),
}

/// Hash-derived identifier for an immutable blob.
///
/// Anything we write locally is addressed as a CIDv1 over the BLAKE3 digest
///  the blob store computes, but any well formed CID (including legacy
///  `Qm...` CIDv0 strings) is accepted so references minted elsewhere
///  still parse. Only BLAKE3 addresses can be looked up in the local store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct ContentAddress(Cid);

impl ContentAddress {
    pub fn new(cid: Cid) -> Self {
        Self(cid)
    }

    /// Address of a blob held by the local store
    pub fn from_hash(hash: Hash) -> Self {
        // a 32 byte digest always fits the 64 byte multihash
        let mh = Multihash::<64>::wrap(BLAKE3_CODE, hash.as_bytes())
            .unwrap_or_else(|_| unreachable!("blake3 digest exceeds multihash size"));
        Self(Cid::new_v1(RAW_CODEC, mh))
    }

    /// The blob store hash this address names, if it is a BLAKE3 address
    pub fn to_hash(&self) -> Option<Hash> {
        let mh = self.0.hash();
        if mh.code() != BLAKE3_CODE {
            return None;
        }
        let digest: [u8; 32] = mh.digest().try_into().ok()?;
        Some(Hash::from_bytes(digest))
    }

    pub fn cid(&self) -> &Cid {
        &self.0
    }

    /// Render with the `/ipfs/` path prefix
    pub fn to_path(&self) -> String {
        format!("{}{}", IPFS_PREFIX, self.0)
    }
}

impl From<Hash> for ContentAddress {
    fn from(hash: Hash) -> Self {
        Self::from_hash(hash)
    }
}

impl From<Cid> for ContentAddress {
    fn from(cid: Cid) -> Self {
        Self(cid)
    }
}

impl FromStr for ContentAddress {
    type Err = CidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(IPFS_PREFIX).unwrap_or(s);
        let cid = Cid::try_from(raw).map_err(|e| CidError::Invalid(s.to_string(), e))?;
        Ok(Self(cid))
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentAddress({})", self.0)
    }
}

/// Encode a value as DAG-CBOR
pub fn encode_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_ipld_dagcbor::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode a DAG-CBOR encoded value
pub fn decode_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_ipld_dagcbor::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CIDV0: &str = "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn";

    #[test]
    fn test_parse_cidv0_with_and_without_prefix() {
        let bare: ContentAddress = CIDV0.parse().unwrap();
        let prefixed: ContentAddress = format!("/ipfs/{}", CIDV0).parse().unwrap();
        assert_eq!(bare, prefixed);
        assert_eq!(bare.to_string(), CIDV0);
        // sha2-256 addresses never name a local blob
        assert!(bare.to_hash().is_none());
    }

    #[test]
    fn test_hash_address_maps_back() {
        let hash = Hash::new(b"comics");
        let addr = ContentAddress::from_hash(hash);
        assert_eq!(addr.to_hash(), Some(hash));

        let reparsed: ContentAddress = addr.to_path().parse().unwrap();
        assert_eq!(reparsed, addr);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("b5".parse::<ContentAddress>().is_err());
        assert!("/ipfs/".parse::<ContentAddress>().is_err());
    }
}
