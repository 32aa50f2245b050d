use clap::{Args, Subcommand};

pub mod get;
pub mod list;
pub mod log;
pub mod package;
pub mod remove;
pub mod rename;
pub mod save;
pub mod search;
pub mod validate;

use common::reference::DatasetRef;

use crate::cli::op::Op;

crate::command_enum! {
    (List, list::List),
    (Get, get::Get),
    (Save, save::Save),
    (Rename, rename::Rename),
    (Remove, remove::Remove),
    (Validate, validate::Validate),
    (Search, search::Search),
    (Package, package::Package),
    (Log, log::Log),
}

// Rename the generated Command to DatasetCommand for clarity
pub type DatasetCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Dataset {
    #[command(subcommand)]
    pub command: DatasetCommand,
}

#[async_trait::async_trait]
impl Op for Dataset {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

/// One ref per line, with the title when the manifest is known
pub(crate) fn format_refs(refs: &[DatasetRef]) -> String {
    if refs.is_empty() {
        return "No datasets found".to_string();
    }
    refs.iter()
        .map(|r| match &r.dataset {
            Some(ds) if !ds.title.is_empty() => format!("{}\t{}", r, ds.title),
            _ => r.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
