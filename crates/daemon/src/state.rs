use std::{fs, path::PathBuf};

use common::crypto::ProfileId;
use common::linked_data::ContentAddress;
use common::node::ConfigStore;
use common::prelude::SecretKey;
use common::profile::{Profile, ProfileType};
use common::reference::is_valid_name;
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "strata";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";
pub const REPO_DIR_NAME: &str = "repo";
pub const BLOBS_DIR_NAME: &str = "blobs";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the API server
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Listen port for the peer (P2P) node (optional, defaults to ephemeral)
    #[serde(default)]
    pub peer_port: Option<u16>,
    /// Start network services when the daemon comes up
    #[serde(default = "default_online")]
    pub online: bool,
    /// Publish and resolve peers over the mainline DHT
    #[serde(default)]
    pub discovery: bool,
    #[serde(default)]
    pub profile: ProfileConfig,
}

fn default_api_port() -> u16 {
    5001
}

fn default_online() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            peer_port: None,
            online: default_online(),
            discovery: false,
            profile: ProfileConfig::default(),
        }
    }
}

/// The editable profile, as written to config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub peername: String,
    #[serde(rename = "type")]
    pub profile_type: ProfileType,
    pub created: Option<chrono::DateTime<chrono::Utc>>,
    pub email: String,
    pub name: String,
    pub description: String,
    pub home_url: String,
    pub color: String,
    pub twitter: String,
    pub photo: Option<ContentAddress>,
    pub thumb: Option<ContentAddress>,
    pub poster: Option<ContentAddress>,
}

impl ProfileConfig {
    /// Build the profile for the node identified by `id`
    pub fn to_profile(&self, id: ProfileId) -> Profile {
        let mut profile = Profile::new(id, self.peername.clone());
        if let Some(created) = self.created {
            profile.created = created;
        }
        profile.profile_type = self.profile_type;
        profile.email = self.email.clone();
        profile.name = self.name.clone();
        profile.description = self.description.clone();
        profile.home_url = self.home_url.clone();
        profile.color = self.color.clone();
        profile.twitter = self.twitter.clone();
        profile.photo = self.photo;
        profile.thumb = self.thumb;
        profile.poster = self.poster;
        profile
    }
}

impl From<&Profile> for ProfileConfig {
    fn from(profile: &Profile) -> Self {
        Self {
            peername: profile.peername.clone(),
            profile_type: profile.profile_type,
            created: Some(profile.created),
            email: profile.email.clone(),
            name: profile.name.clone(),
            description: profile.description.clone(),
            home_url: profile.home_url.clone(),
            color: profile.color.clone(),
            twitter: profile.twitter.clone(),
            photo: profile.photo,
            thumb: profile.thumb,
            poster: profile.poster,
        }
    }
}

/// Default peername for a fresh key
pub fn default_peername(id: &ProfileId) -> String {
    let hex = id.to_hex();
    format!("peer_{}", &hex[..8.min(hex.len())])
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the strata directory (~/.strata)
    pub strata_dir: PathBuf,
    /// Path to the node key PEM file
    pub key_path: PathBuf,
    /// Path to the repository snapshots
    pub repo_path: PathBuf,
    /// Path to the blobs directory
    pub blobs_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the strata directory path (custom or default ~/.strata)
    pub fn strata_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new strata state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let strata_dir = Self::strata_dir(custom_path)?;

        if strata_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&strata_dir)?;

        let blobs_path = strata_dir.join(BLOBS_DIR_NAME);
        fs::create_dir_all(&blobs_path)?;
        let repo_path = strata_dir.join(REPO_DIR_NAME);
        fs::create_dir_all(&repo_path)?;

        // Generate and save key
        let key = SecretKey::generate();
        let key_path = strata_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_pem())?;

        let mut config = config.unwrap_or_default();
        if config.profile.peername.is_empty() {
            config.profile.peername = default_peername(&key.public());
        }
        if !is_valid_name(&config.profile.peername) {
            return Err(StateError::InvalidPeername(config.profile.peername));
        }
        config.profile.created = Some(chrono::Utc::now());

        let config_path = strata_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            strata_dir,
            key_path,
            repo_path,
            blobs_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the strata directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let strata_dir = Self::strata_dir(custom_path)?;

        if !strata_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let key_path = strata_dir.join(KEY_FILE_NAME);
        let repo_path = strata_dir.join(REPO_DIR_NAME);
        let blobs_path = strata_dir.join(BLOBS_DIR_NAME);
        let config_path = strata_dir.join(CONFIG_FILE_NAME);

        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !repo_path.exists() {
            return Err(StateError::MissingFile(format!("{}/", REPO_DIR_NAME)));
        }
        if !blobs_path.exists() {
            return Err(StateError::MissingFile(format!("{}/", BLOBS_DIR_NAME)));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            strata_dir,
            key_path,
            repo_path,
            blobs_path,
            config_path,
            config,
        })
    }

    /// Load the secret key from the key file
    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = SecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }

    /// Write `config` over the config file
    pub fn write_config(&self, config: &AppConfig) -> Result<(), StateError> {
        let config_toml = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, config_toml)?;
        Ok(())
    }
}

/// Profile edits land in the `[profile]` table of config.toml
impl ConfigStore for AppState {
    fn save_profile(&self, profile: &Profile) -> anyhow::Result<()> {
        let config_toml = fs::read_to_string(&self.config_path)?;
        let mut config: AppConfig = toml::from_str(&config_toml)?;
        config.profile = ProfileConfig::from(profile);
        self.write_config(&config)?;
        tracing::debug!("saved profile {} to {:?}", profile.peername, self.config_path);
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("strata directory not initialized. Run 'strata init' first")]
    NotInitialized,

    #[error("strata directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid peername: {0}")]
    InvalidPeername(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strata");

        let state = AppState::init(Some(path.clone()), None).unwrap();
        assert!(state.config.profile.peername.starts_with("peer_"));
        assert!(matches!(
            AppState::init(Some(path.clone()), None),
            Err(StateError::AlreadyInitialized)
        ));

        let loaded = AppState::load(Some(path)).unwrap();
        assert_eq!(loaded.config.api_port, 5001);
        assert_eq!(loaded.config.profile, state.config.profile);
        assert_eq!(loaded.load_key().unwrap().public(), state.load_key().unwrap().public());
    }

    #[test]
    fn test_load_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppState::load(Some(dir.path().join("missing")));
        assert!(matches!(result, Err(StateError::NotInitialized)));
    }

    #[test]
    fn test_save_profile_rewrites_profile_table() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::init(Some(dir.path().join("strata")), None).unwrap();
        let key = state.load_key().unwrap();

        let mut profile = state.config.profile.to_profile(key.public());
        profile.name = "Brendan".into();
        state.save_profile(&profile).unwrap();

        let reloaded = AppState::load(Some(state.strata_dir.clone())).unwrap();
        assert_eq!(reloaded.config.profile.name, "Brendan");
        assert_eq!(reloaded.config.api_port, state.config.api_port);
    }
}
