use std::path::PathBuf;

use clap::Args;

use strata_daemon::requests::{DatasetRequests, SaveParams};

use crate::cli::op::{read_json, CliError};

#[derive(Args, Debug, Clone)]
pub struct Save {
    /// Dataset name under this node's peername
    pub name: String,

    /// JSON file holding the body, an array of rows
    #[arg(long)]
    pub body: Option<PathBuf>,

    /// JSON file holding the manifest (title, description, structure)
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Save {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        if self.body.is_none() && self.manifest.is_none() {
            return Err(CliError::Invalid(
                "save needs --body, --manifest or both".to_string(),
            ));
        }
        let params = SaveParams {
            name: self.name.clone(),
            dataset: self.manifest.as_deref().map(read_json).transpose()?,
            body: self.body.as_deref().map(read_json).transpose()?,
        };

        let requests = DatasetRequests::new(ctx.dispatch().await?);
        let saved = requests.save(&params).await?;
        Ok(format!("Saved {}", saved))
    }
}
