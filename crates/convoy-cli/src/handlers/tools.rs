//! Tools command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::{one_line, print_separator, truncate_string};

/// List the tool catalog, grouped by owning server in catalog order.
pub async fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    let tools = ctx.engine.available_tools().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    if tools.is_empty() {
        println!("No tools available.");
        println!("Add servers to the config file or run 'convoy status' to see connection errors.");
        return Ok(());
    }

    println!("Found {} tool(s):\n", tools.len());
    println!("{:<16} {:<28} Description", "Server", "Tool");
    print_separator(90);
    for tool in &tools {
        println!(
            "{:<16} {:<28} {}",
            truncate_string(&tool.server_id, 15),
            truncate_string(tool.name(), 27),
            truncate_string(&one_line(tool.tool.description()), 44)
        );
    }
    Ok(())
}
