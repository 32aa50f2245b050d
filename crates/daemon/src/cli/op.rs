use std::error::Error;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use url::Url;

use strata_daemon::http_server::api::client::{ApiClient, ApiError};
use strata_daemon::state::AppState;
use strata_daemon::{
    Dispatch, RequestError, ServiceConfig, ServiceState, StateError, StateSetupError,
};

const DEFAULT_REMOTE: &str = "http://localhost:5001";

/// Resolve the remote URL for the API client.
///
/// Priority: explicit `--remote` flag > config file `api_port` > hardcoded 5001.
pub fn resolve_remote(explicit: Option<Url>, config_path: Option<PathBuf>) -> Url {
    if let Some(url) = explicit {
        return url;
    }
    if let Ok(state) = AppState::load(config_path) {
        if let Ok(url) = Url::parse(&format!("http://localhost:{}", state.config.api_port)) {
            return url;
        }
    }
    Url::parse(DEFAULT_REMOTE).expect("hardcoded URL must parse")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_remote_explicit_wins() {
        let explicit = Url::parse("http://example.com:9999").unwrap();
        let result = resolve_remote(Some(explicit.clone()), None);
        assert_eq!(result, explicit);
    }

    #[test]
    fn test_resolve_remote_falls_back_to_default() {
        // No explicit URL, no valid config path → hardcoded 5001
        let result = resolve_remote(None, Some(PathBuf::from("/nonexistent")));
        assert_eq!(result.as_str(), "http://localhost:5001/");
    }

    #[test]
    fn test_resolve_remote_reads_config_port() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strata");
        let config = strata_daemon::AppConfig {
            api_port: 6123,
            ..Default::default()
        };
        AppState::init(Some(path.clone()), Some(config)).unwrap();

        let result = resolve_remote(None, Some(path));
        assert_eq!(result.port().unwrap(), 6123);
    }

    #[test]
    fn test_cli_error_exit_codes() {
        let not_found = CliError::from(RequestError::NotFound("b5/comics".into()));
        assert_eq!(
            not_found.exit_code(),
            RequestError::NotFound(String::new()).exit_code()
        );
        assert_eq!(CliError::Invalid("x".into()).exit_code(), 1);
    }
}

#[derive(Clone)]
pub struct OpContext {
    /// API client (always initialized with default or custom URL)
    pub client: ApiClient,
    /// Optional custom config path (defaults to ~/.strata)
    pub config_path: Option<PathBuf>,
}

impl OpContext {
    /// Create context with custom remote URL and optional config path
    pub fn new(remote: Url, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        Ok(Self {
            client: ApiClient::new(&remote)?,
            config_path,
        })
    }

    /// Where requests should run.
    ///
    /// A live daemon owns the blobs store, so everything goes through it.
    ///  Without one the command opens the repository itself, offline.
    pub async fn dispatch(&self) -> Result<Dispatch, CliError> {
        if self.client.is_live().await {
            tracing::debug!("forwarding to daemon at {}", self.client.base_url());
            return Ok(Dispatch::new(None, Some(self.client.clone()))?);
        }

        let state = AppState::load(self.config_path.clone())?;
        let mut config = ServiceConfig::from_app_state(&state)?;
        config.online = false;
        let service = ServiceState::from_config(&config).await?;
        Ok(Dispatch::new(Some(service.node().clone()), None)?)
    }
}

/// Read and parse a JSON file named on the command line
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let data = std::fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

/// Failure shared by every command
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Setup(#[from] StateSetupError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),
}

/// Process exit code for a failed command
pub trait ExitStatus {
    fn exit_code(&self) -> i32;
}

impl ExitStatus for CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Request(e) => e.exit_code(),
            _ => 1,
        }
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + ExitStatus + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        impl $crate::cli::op::ExitStatus for OpError {
            fn exit_code(&self) -> i32 {
                match self {
                    $(
                        OpError::$variant(e) => $crate::cli::op::ExitStatus::exit_code(e),
                    )*
                }
            }
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
