pub mod daemon;
pub mod dataset;
pub mod health;
pub mod init;
pub mod peers;
pub mod profile;
pub mod query;
pub mod version;

pub use daemon::Daemon;
pub use dataset::Dataset;
pub use health::Health;
pub use init::Init;
pub use peers::Peers;
pub use profile::Profile;
pub use query::Query;
pub use version::Version;
