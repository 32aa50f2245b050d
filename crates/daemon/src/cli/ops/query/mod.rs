use clap::{Args, Subcommand};

pub mod get;
pub mod list;

use crate::cli::op::Op;

crate::command_enum! {
    (List, list::List),
    (Get, get::Get),
}

// Rename the generated Command to QueryCommand for clarity
pub type QueryCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Query {
    #[command(subcommand)]
    pub command: QueryCommand,
}

#[async_trait::async_trait]
impl Op for Query {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
