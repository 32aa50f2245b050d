use clap::Args;

use strata_daemon::requests::{PeerListParams, PeerRequests};

use crate::cli::op::CliError;

/// Peers in the address book
#[derive(Args, Debug, Clone)]
pub struct List {
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    #[arg(long, default_value_t = 100)]
    pub limit: usize,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for List {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let requests = PeerRequests::new(ctx.dispatch().await?);
        let profiles = requests
            .list(&PeerListParams {
                offset: self.offset,
                limit: self.limit,
            })
            .await?;

        if profiles.is_empty() {
            return Ok("No peers found".to_string());
        }
        Ok(profiles
            .iter()
            .map(|p| format!("{}\t{}", p.peername, p.id))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
