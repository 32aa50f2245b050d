use std::path::PathBuf;

use clap::Args;

use strata_daemon::requests::{PhotoParams, ProfileRequests};

use crate::cli::op::CliError;

/// Upload an image as the profile photo, or as the poster with --poster
#[derive(Args, Debug, Clone)]
pub struct Photo {
    pub file: PathBuf,

    #[arg(long)]
    pub poster: bool,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Photo {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let bytes = std::fs::read(&self.file)?;
        let params = PhotoParams::from_bytes(&bytes);

        let requests = ProfileRequests::new(ctx.dispatch().await?);
        let (label, addr) = if self.poster {
            let profile = requests.set_poster_photo(&params).await?;
            ("poster", profile.poster)
        } else {
            let profile = requests.set_profile_photo(&params).await?;
            ("photo", profile.photo)
        };
        let path = addr.map(|a| a.to_path()).unwrap_or_default();
        Ok(format!("Set {} to {}", label, path))
    }
}
