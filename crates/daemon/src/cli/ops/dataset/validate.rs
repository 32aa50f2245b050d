use std::path::PathBuf;

use clap::Args;

use common::reference::DatasetRef;
use strata_daemon::requests::{DatasetRequests, ValidateParams};

use crate::cli::op::{read_json, CliError};

#[derive(Args, Debug, Clone)]
pub struct Validate {
    /// Dataset to check; omit to check a body file on its own
    pub reference: Option<DatasetRef>,

    /// JSON body file, checked instead of the dataset's body
    #[arg(long)]
    pub body: Option<PathBuf>,

    /// JSON structure file, checked against instead of the dataset's structure
    #[arg(long)]
    pub structure: Option<PathBuf>,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Validate {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let params = ValidateParams {
            reference: self.reference.clone(),
            structure: self.structure.as_deref().map(read_json).transpose()?,
            body: self.body.as_deref().map(read_json).transpose()?,
        };

        let requests = DatasetRequests::new(ctx.dispatch().await?);
        let errors = requests.validate(&params).await?;
        if errors.is_empty() {
            return Ok("Valid".to_string());
        }
        let mut lines = vec![format!("{} validation errors:", errors.len())];
        lines.extend(errors.iter().map(|e| format!("  {}", e)));
        Ok(lines.join("\n"))
    }
}
