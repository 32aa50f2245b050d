use clap::Args;

use common::crypto::ProfileId;
use strata_daemon::requests::{PeerInfoParams, PeerRequests};

use super::format_profile;
use crate::cli::op::CliError;

#[derive(Args, Debug, Clone)]
pub struct Info {
    /// Peername to look up (or use --id)
    #[arg(group = "peer_identifier")]
    pub peername: Option<String>,

    /// Profile id to look up (or give a peername)
    #[arg(long, group = "peer_identifier")]
    pub id: Option<ProfileId>,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Info {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        if self.peername.is_none() && self.id.is_none() {
            return Err(CliError::Invalid(
                "Either a peername or --id must be provided".to_string(),
            ));
        }

        let requests = PeerRequests::new(ctx.dispatch().await?);
        let profile = requests
            .info(&PeerInfoParams {
                peername: self.peername.clone(),
                profile_id: self.id,
            })
            .await?;
        Ok(format_profile(&profile))
    }
}
