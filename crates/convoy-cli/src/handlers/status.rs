//! Status command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::{print_separator, truncate_string};

pub async fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    let status = ctx.engine.status().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let provider = &status.provider;
    println!("Provider: {} ({})", provider.provider, provider.model);
    if provider.connection.connected {
        let models = provider.connection.models.as_ref().map_or(0, Vec::len);
        println!("  ✓ connected ({models} model(s) available)");
    } else {
        let error = provider.connection.error.as_deref().unwrap_or("unknown error");
        println!("  ✗ {error}");
    }
    println!();

    if status.servers.is_empty() {
        println!("No tool servers configured.");
        return Ok(());
    }

    println!("{:<16} {:<16} {:<6} {:<6} Error", "Server", "Transport", "Up", "Tools");
    print_separator(80);
    for server in &status.servers {
        let up = if server.connected { "yes" } else { "no" };
        let error = match (&server.error, server.valid) {
            (Some(e), false) => format!("invalid config: {e}"),
            (Some(e), true) => e.clone(),
            (None, _) => String::new(),
        };
        println!(
            "{:<16} {:<16} {:<6} {:<6} {}",
            truncate_string(&server.id, 15),
            server.server_type.as_str(),
            up,
            server.tool_count,
            truncate_string(&error, 40)
        );
    }
    Ok(())
}
