use clap::Args;

use strata_daemon::requests::{ListParams, QueryRequests};

use crate::cli::op::CliError;
use crate::cli::ops::dataset::format_refs;

/// Datasets in the repository that were produced by a query
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
        let requests = QueryRequests::new(ctx.dispatch().await?);
        let refs = requests
            .list(&ListParams {
                peername: None,
                offset: self.offset,
                limit: self.limit,
            })
            .await?;
        Ok(format_refs(&refs))
    }
}
