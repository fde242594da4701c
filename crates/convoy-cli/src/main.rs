//! CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use convoy_cli::{AppConfig, Cli, CliError, Commands, bootstrap, enabled_servers, handlers};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(&cli.config)?;
    let ctx = bootstrap(config)?;

    let result = match cli.command {
        Commands::Ask {
            prompt,
            servers,
            no_tools,
            json,
        } => handlers::ask::execute(&ctx, prompt, enabled_servers(servers, no_tools), json).await,
        Commands::Tools { json } => handlers::tools::execute(&ctx, json).await,
        Commands::Status { json } => handlers::status::execute(&ctx, json).await,
    };

    ctx.shutdown().await;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before anything reads them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
