use clap::{Args, Subcommand};

pub mod get;
pub mod photo;
pub mod set;

use crate::cli::op::Op;

crate::command_enum! {
    (Get, get::Get),
    (Set, set::Set),
    (Photo, photo::Photo),
}

// Rename the generated Command to ProfileCommand for clarity
pub type ProfileCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Profile {
    #[command(subcommand)]
    pub command: ProfileCommand,
}

#[async_trait::async_trait]
impl Op for Profile {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
