use clap::Args;

use common::reference::DatasetRef;
use strata_daemon::requests::QueryRequests;

use crate::cli::op::CliError;

/// The query text behind a dataset
#[derive(Args, Debug, Clone)]
pub struct Get {
    pub reference: DatasetRef,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Get {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let requests = QueryRequests::new(ctx.dispatch().await?);
        let found = requests.get(&self.reference).await?;
        let query = found
            .dataset
            .as_ref()
            .and_then(|ds| ds.query.clone())
            .unwrap_or_default();
        Ok(format!("{}\n{}", found, query))
    }
}
