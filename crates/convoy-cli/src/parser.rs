//! Root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Tool-augmented chat from the command line.
#[derive(Parser)]
#[command(name = "convoy")]
#[command(about = "Chat with an LLM that can call MCP tools")]
#[command(version)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, global = true, env = "CONVOY_CONFIG", default_value = "convoy.json")]
    pub config: PathBuf,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
