use clap::Args;

use common::reference::DatasetRef;
use strata_daemon::requests::DatasetRequests;

use crate::cli::op::CliError;

#[derive(Args, Debug, Clone)]
pub struct Get {
    /// Dataset reference, e.g. `b5/comics` or `me/comics@/ipfs/Qm...`
    pub reference: DatasetRef,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Get {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let requests = DatasetRequests::new(ctx.dispatch().await?);
        let found = requests.get(&self.reference).await?;
        Ok(serde_json::to_string_pretty(&found)?)
    }
}
