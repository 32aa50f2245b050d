//! Node-to-node protocol: wire messages, the transport abstraction, its iroh
//!  implementation and the responder that answers from a repository.

mod iroh_transport;
mod messages;
mod service;
mod transport;

pub use iroh_transport::IrohTransport;
pub use messages::{PeerMessage, PeerReply, ReplyErrorKind};
pub use service::PeerService;
pub use transport::{PeerTransport, TransportError};

/// ALPN identifier for the strata peer protocol
pub const ALPN: &[u8] = b"/strata/1";

/// Largest single message either side will read. Packages travel in-band,
///  so this caps the size of a dataset history we can fetch.
pub const MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;
