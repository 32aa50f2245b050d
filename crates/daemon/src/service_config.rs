use std::net::SocketAddrV4;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use common::node::{ConfigStore, DEFAULT_REQUEST_TIMEOUT};
use common::prelude::SecretKey;

use crate::state::{AppState, ProfileConfig, StateError};

#[derive(Debug, Clone)]
pub struct Config {
    // peer configuration
    /// address for our peer to listen on,
    ///  if not set then an ephemeral port will be used
    pub node_listen_addr: Option<SocketAddrV4>,
    /// our node secret,
    ///  if not set then a new secret will be generated
    pub node_secret: Option<SecretKey>,
    /// start network services at all
    pub online: bool,
    /// publish and look up peers over the mainline DHT
    pub discovery: bool,
    pub request_timeout: Duration,

    // data store configuration
    /// directory for repository snapshots,
    ///  if not set the repository lives in memory
    pub repo_path: Option<PathBuf>,
    /// directory for the blobs store,
    ///  if not set an in-memory store is used
    pub blobs_path: Option<PathBuf>,

    // profile
    pub profile: ProfileConfig,
    /// where profile edits are persisted
    pub config_store: Option<Arc<dyn ConfigStore>>,

    // http server configuration
    /// Port for the API HTTP server
    pub api_port: u16,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Everything in memory, offline. Handy for tests and one-off tools.
    pub fn ephemeral(profile: ProfileConfig) -> Self {
        Self {
            node_listen_addr: None,
            node_secret: None,
            online: false,
            discovery: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            repo_path: None,
            blobs_path: None,
            profile,
            config_store: None,
            api_port: 0,
            log_level: tracing::Level::INFO,
            log_dir: None,
        }
    }

    /// Service config for the on-disk state in `state`
    pub fn from_app_state(state: &AppState) -> Result<Self, StateError> {
        let secret_key = state.load_key()?;
        let node_listen_addr = state
            .config
            .peer_port
            .map(|port| SocketAddrV4::new(std::net::Ipv4Addr::UNSPECIFIED, port));

        Ok(Self {
            node_listen_addr,
            node_secret: Some(secret_key),
            online: state.config.online,
            discovery: state.config.discovery,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            repo_path: Some(state.repo_path.clone()),
            blobs_path: Some(state.blobs_path.clone()),
            profile: state.config.profile.clone(),
            config_store: Some(Arc::new(state.clone())),
            api_port: state.config.api_port,
            log_level: tracing::Level::INFO,
            log_dir: None,
        })
    }
}
