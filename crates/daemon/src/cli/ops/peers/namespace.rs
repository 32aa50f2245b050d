use clap::Args;

use strata_daemon::requests::{NamespaceParams, PeerRequests};

use crate::cli::op::CliError;
use crate::cli::ops::dataset::format_refs;

/// Datasets a peer publishes, from the repository or the network
#[derive(Args, Debug, Clone)]
pub struct Namespace {
    /// Peername (`me` for this node)
    pub peername: String,

    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    #[arg(long, default_value_t = 100)]
    pub limit: usize,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Namespace {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let requests = PeerRequests::new(ctx.dispatch().await?);
        let refs = requests
            .namespace(&NamespaceParams {
                peername: self.peername.clone(),
                offset: self.offset,
                limit: self.limit,
            })
            .await?;
        Ok(format_refs(&refs))
    }
}
