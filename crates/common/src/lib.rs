/**
 * Content-addressed blob storage.
 *  A light wrapper around an iroh-blobs store,
 *  keyed by content address.
 */
pub mod blobs_store;
/**
 * Reference canonicalization.
 *  Resolves partial dataset refs locally first,
 *  then over the network.
 */
pub mod canonicalize;
/**
 * Peer identity keys.
 */
pub mod crypto;
/**
 * Dataset manifests, schemas, validation
 *  and transfer packages.
 */
pub mod dataset;
/**
 * Content addresses (CIDs) and the DAG-CBOR
 *  codec manifests are stored with.
 */
pub mod linked_data;
/**
 * Dataset sources behind one read contract,
 *  and the ordered aggregate over them.
 */
pub mod namespace;
/**
 * Node lifecycle: owns the repository and
 *  the network session.
 */
pub mod node;
/**
 * Node-to-node wire protocol and transports.
 */
pub mod p2p;
/**
 * Peer profiles.
 */
pub mod profile;
/**
 * Dataset references and their string grammar.
 */
pub mod reference;
/**
 * The local repository of refs, peers
 *  and cached packages.
 */
pub mod repo;
/**
 * In-process multi-node test harness.
 */
pub mod testkit;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::blobs_store::{BlobsStore, BlobsStoreError};
    pub use crate::crypto::{ProfileId, PublicKey, SecretKey};
    pub use crate::dataset::{Dataset, Field, FieldType, Package, Structure, ValidationError};
    pub use crate::linked_data::ContentAddress;
    pub use crate::namespace::{Namespace, NamespaceError, Namespaces, SearchParams};
    pub use crate::node::{Node, NodeConfig, NodeError, NodeState};
    pub use crate::profile::{Profile, ProfileEdit, ProfileType};
    pub use crate::reference::{DatasetRef, RefError};
    pub use crate::repo::{PeerInfo, RepoError, Repository};
    pub use crate::version::build_info;
}
