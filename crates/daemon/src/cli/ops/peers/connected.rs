use clap::Args;

use strata_daemon::requests::PeerRequests;

use crate::cli::op::CliError;

/// Peers the daemon has talked to this session
#[derive(Args, Debug, Clone)]
pub struct Connected;

#[async_trait::async_trait]
impl crate::cli::op::Op for Connected {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let requests = PeerRequests::new(ctx.dispatch().await?);
        let ids = requests.connected_peers().await?;
        if ids.is_empty() {
            return Ok("No connected peers".to_string());
        }
        Ok(ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
