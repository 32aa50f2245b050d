use clap::Args;

use strata_daemon::state::{AppConfig, AppState, ProfileConfig};

use crate::cli::op::CliError;

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Peername to publish datasets under (defaults to one derived from the key)
    #[arg(long)]
    pub peername: Option<String>,

    /// Port for the API server
    #[arg(long, default_value_t = 5001)]
    pub api_port: u16,

    /// Listen port for peer connections (ephemeral if not set)
    #[arg(long)]
    pub peer_port: Option<u16>,

    /// Keep the daemon off the network by default
    #[arg(long)]
    pub offline: bool,

    /// Publish and resolve peers over the mainline DHT
    #[arg(long)]
    pub discovery: bool,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            api_port: self.api_port,
            peer_port: self.peer_port,
            online: !self.offline,
            discovery: self.discovery,
            profile: ProfileConfig {
                peername: self.peername.clone().unwrap_or_default(),
                ..Default::default()
            },
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;
        let id = state.load_key()?.public();

        Ok(format!(
            "Initialized strata directory at {}\n  peername: {}\n  id:       {}",
            state.strata_dir.display(),
            state.config.profile.peername,
            id
        ))
    }
}
