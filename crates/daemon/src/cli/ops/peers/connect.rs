use clap::Args;

use common::crypto::ProfileId;
use strata_daemon::requests::{ConnectParams, PeerRequests};

use crate::cli::op::CliError;

/// Dial a peer and add it to the address book. Needs a running daemon.
#[derive(Args, Debug, Clone)]
pub struct Connect {
    pub id: ProfileId,

    /// Transport address to dial (repeatable); discovery is used without one
    #[arg(long = "addr")]
    pub addresses: Vec<String>,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Connect {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let requests = PeerRequests::new(ctx.dispatch().await?);
        let profile = requests
            .connect(&ConnectParams {
                profile_id: self.id,
                addresses: self.addresses.clone(),
            })
            .await?;
        Ok(format!("Connected to {} ({})", profile.peername, profile.id))
    }
}
