use clap::Args;

use common::reference::DatasetRef;
use strata_daemon::requests::DatasetRequests;

use crate::cli::op::CliError;

#[derive(Args, Debug, Clone)]
pub struct Remove {
    /// Dataset reference to drop from the repository
    pub reference: DatasetRef,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Remove {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let requests = DatasetRequests::new(ctx.dispatch().await?);
        let removed = requests.remove(&self.reference).await?;
        Ok(format!("Removed {}", removed))
    }
}
