//! Command-line surface for `pulseboard-cli`.

#![deny(clippy::all, clippy::pedantic)]

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pulseboard-cli", version, about = "Pulseboard analytics CLI", long_about = None)]
pub struct Cli {
    /// Server base URL, e.g. <http://localhost:3000>
    #[arg(long, env = "PULSEBOARD_SITE_URL")]
    pub site: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the current top-users leaderboard
    TopUsers,
    /// List a user's posts
    Posts { user_id: String },
    /// List a post's comments
    Comments { post_id: i64 },
}
