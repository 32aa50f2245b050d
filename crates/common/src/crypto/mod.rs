//! Peer identity primitives
//!
//! Every node owns an Ed25519 keypair. The public half is the node's
//! stable peer identifier: it names the node on the transport and doubles
//! as the `ProfileId` that owns datasets in the repository.

mod keys;

pub use keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};

/// Stable identifier of a profile. A profile is owned by exactly one
///  node, so the node's public key is reused as the profile id.
pub type ProfileId = PublicKey;
