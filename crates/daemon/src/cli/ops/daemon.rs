use clap::Args;

use strata_daemon::state::AppState;
use strata_daemon::{spawn_service, ServiceConfig};

use crate::cli::op::CliError;

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override API server port (default from config)
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Serve the local repository without starting network services
    #[arg(long)]
    pub offline: bool,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Load state from config path (or default ~/.strata)
        let state = AppState::load(ctx.config_path.clone())?;

        let mut config = ServiceConfig::from_app_state(&state)?;
        if let Some(api_port) = self.api_port {
            config.api_port = api_port;
        }
        if self.offline {
            config.online = false;
        }
        config.log_level = tracing::Level::DEBUG;
        config.log_dir = self.log_dir.clone();

        spawn_service(&config).await;
        Ok("daemon ended".to_string())
    }
}
