//! pulseboard-cli: analytics API command-line client.
#![deny(clippy::all, clippy::pedantic)]

mod args;
mod client;
mod print;

use clap::Parser;

use args::{Cli, Commands};
use client::{CliError, build_ctx_from_cli};
use pulseboard_api_types::{CommentsResponse, TopUsersResponse, UserPostsResponse};
use print::print_json;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = build_ctx_from_cli(&cli)?;

    match cli.command {
        Commands::TopUsers => {
            let body: TopUsersResponse = ctx.get("api/v1/analytics/top-users").await?;
            print_json(&body)?;
        }
        Commands::Posts { user_id } => {
            let body: UserPostsResponse = ctx.get(&format!("api/v1/users/{user_id}/posts")).await?;
            print_json(&body)?;
        }
        Commands::Comments { post_id } => {
            let body: CommentsResponse =
                ctx.get(&format!("api/v1/posts/{post_id}/comments")).await?;
            print_json(&body)?;
        }
    }

    Ok(())
}
