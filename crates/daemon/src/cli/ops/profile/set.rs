use clap::Args;

use common::profile::{ProfileEdit, ProfileType};
use strata_daemon::requests::ProfileRequests;

use crate::cli::op::CliError;
use crate::cli::ops::peers::format_profile;

/// Edit this node's profile. Only the given fields change.
#[derive(Args, Debug, Clone)]
pub struct Set {
    /// New peername; owned datasets move along with it
    #[arg(long)]
    pub peername: Option<String>,

    /// Mark the profile as an organization rather than a user
    #[arg(long)]
    pub organization: bool,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub home_url: Option<String>,

    #[arg(long)]
    pub color: Option<String>,

    #[arg(long)]
    pub twitter: Option<String>,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Set {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let edit = ProfileEdit {
            peername: self.peername.clone(),
            profile_type: self.organization.then_some(ProfileType::Organization),
            email: self.email.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            home_url: self.home_url.clone(),
            color: self.color.clone(),
            twitter: self.twitter.clone(),
        };
        if edit == ProfileEdit::default() {
            return Err(CliError::Invalid("nothing to change".to_string()));
        }

        let requests = ProfileRequests::new(ctx.dispatch().await?);
        let profile = requests.save_profile(&edit).await?;
        Ok(format_profile(&profile))
    }
}
