use clap::Args;

use strata_daemon::requests::{DatasetRequests, ListParams};

use super::format_refs;
use crate::cli::op::CliError;

#[derive(Args, Debug, Clone)]
pub struct List {
    /// Only datasets owned by this peername (`me` for this node)
    #[arg(long)]
    pub peer: Option<String>,

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
        let requests = DatasetRequests::new(ctx.dispatch().await?);
        let refs = requests
            .list(&ListParams {
                peername: self.peer.clone(),
                offset: self.offset,
                limit: self.limit,
            })
            .await?;
        Ok(format_refs(&refs))
    }
}
