use clap::Args;

use common::reference::DatasetRef;
use strata_daemon::requests::DatasetRequests;

use crate::cli::op::CliError;

/// Copy a dataset's manifest and body into the local store
#[derive(Args, Debug, Clone)]
pub struct Package {
    pub reference: DatasetRef,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Package {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let requests = DatasetRequests::new(ctx.dispatch().await?);
        let info = requests.package(&self.reference).await?;
        Ok(format!(
            "Stored {} (root {}) from {}",
            info.reference, info.root, info.source
        ))
    }
}
