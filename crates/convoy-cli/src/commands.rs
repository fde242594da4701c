//! Available subcommands.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a question; the model may call tools once before answering
    Ask {
        /// The question to send
        prompt: String,
        /// Only offer tools from these server ids (comma separated)
        #[arg(long, value_delimiter = ',', conflicts_with = "no_tools")]
        servers: Option<Vec<String>>,
        /// Offer no tools at all
        #[arg(long)]
        no_tools: bool,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the tools exposed by configured servers
    Tools {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show provider connectivity and tool server status
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Resolve the server filter for `ask`: `None` means every server.
pub fn enabled_servers(servers: Option<Vec<String>>, no_tools: bool) -> Option<Vec<String>> {
    if no_tools { Some(Vec::new()) } else { servers }
}
