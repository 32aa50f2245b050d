use clap::Args;

use common::reference::DatasetRef;
use strata_daemon::requests::{DatasetRequests, RenameParams};

use crate::cli::op::CliError;

#[derive(Args, Debug, Clone)]
pub struct Rename {
    /// Dataset to rename, e.g. `me/comics`
    pub current: DatasetRef,

    /// New dataset name
    pub new_name: String,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Rename {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let requests = DatasetRequests::new(ctx.dispatch().await?);
        let renamed = requests
            .rename(&RenameParams {
                current: self.current.clone(),
                new_name: self.new_name.clone(),
            })
            .await?;
        Ok(format!("Renamed {} to {}", self.current, renamed))
    }
}
