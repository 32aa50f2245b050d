use clap::Args;

use common::reference::DatasetRef;
use strata_daemon::requests::{HistoryRequests, LogParams};

use crate::cli::op::CliError;

/// Versions of a dataset, newest first
#[derive(Args, Debug, Clone)]
pub struct Log {
    pub reference: DatasetRef,

    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    #[arg(long, default_value_t = 100)]
    pub limit: usize,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Log {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let requests = HistoryRequests::new(ctx.dispatch().await?);
        let versions = requests
            .log(&LogParams {
                reference: self.reference.clone(),
                offset: self.offset,
                limit: self.limit,
            })
            .await?;

        if versions.is_empty() {
            return Ok("No versions found".to_string());
        }
        let lines = versions
            .iter()
            .map(|v| {
                let path = v.path.map(|p| p.to_path()).unwrap_or_default();
                match &v.dataset {
                    Some(ds) => format!("{}\t{}\t{}", path, ds.timestamp.to_rfc3339(), ds.title),
                    None => path,
                }
            })
            .collect::<Vec<_>>();
        Ok(lines.join("\n"))
    }
}
