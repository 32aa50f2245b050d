use clap::Args;

use strata_daemon::requests::ProfileRequests;

use crate::cli::op::CliError;
use crate::cli::ops::peers::format_profile;

/// This node's profile
#[derive(Args, Debug, Clone)]
pub struct Get;

#[async_trait::async_trait]
impl crate::cli::op::Op for Get {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let requests = ProfileRequests::new(ctx.dispatch().await?);
        let profile = requests.get_profile().await?;
        Ok(format_profile(&profile))
    }
}
