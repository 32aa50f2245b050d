use clap::{Args, Subcommand};

pub mod connect;
pub mod connected;
pub mod info;
pub mod list;
pub mod namespace;

use common::profile::Profile;

use crate::cli::op::Op;

crate::command_enum! {
    (List, list::List),
    (Info, info::Info),
    (Connect, connect::Connect),
    (Connected, connected::Connected),
    (Namespace, namespace::Namespace),
}

// Rename the generated Command to PeersCommand for clarity
pub type PeersCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Peers {
    #[command(subcommand)]
    pub command: PeersCommand,
}

#[async_trait::async_trait]
impl Op for Peers {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

pub(crate) fn format_profile(profile: &Profile) -> String {
    let mut lines = vec![
        format!("peername: {}", profile.peername),
        format!("id:       {}", profile.id),
        format!("type:     {}", profile.profile_type),
    ];
    for (label, value) in [
        ("name", &profile.name),
        ("email", &profile.email),
        ("about", &profile.description),
        ("home", &profile.home_url),
        ("twitter", &profile.twitter),
    ] {
        if !value.is_empty() {
            lines.push(format!("{:<9} {}", format!("{}:", label), value));
        }
    }
    if let Some(photo) = &profile.photo {
        lines.push(format!("photo:    {}", photo.to_path()));
    }
    if let Some(poster) = &profile.poster {
        lines.push(format!("poster:   {}", poster.to_path()));
    }
    lines.join("\n")
}
