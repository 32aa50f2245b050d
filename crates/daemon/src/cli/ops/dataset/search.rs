use clap::Args;

use common::namespace::SearchParams;
use strata_daemon::requests::DatasetRequests;

use super::format_refs;
use crate::cli::op::CliError;

#[derive(Args, Debug, Clone)]
pub struct Search {
    /// Text to match against dataset names and titles
    pub query: String,

    #[arg(long, default_value_t = 100)]
    pub limit: usize,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Search {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let requests = DatasetRequests::new(ctx.dispatch().await?);
        let refs = requests
            .search(&SearchParams {
                query: self.query.clone(),
                limit: self.limit,
            })
            .await?;
        Ok(format_refs(&refs))
    }
}
