//! Ask command handler.

use anyhow::Result;
use convoy_core::{ChatMessage, QueryResponse};

use crate::bootstrap::CliContext;
use crate::presentation::{one_line, print_separator, truncate_string};

/// Run one query round and print the reply with its tool trace.
pub async fn execute(
    ctx: &CliContext,
    prompt: String,
    enabled_servers: Option<Vec<String>>,
    json: bool,
) -> Result<()> {
    let response = ctx
        .engine
        .process_query(vec![ChatMessage::user(prompt)], enabled_servers.as_deref())
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_response(&response);
    }
    Ok(())
}

fn print_response(response: &QueryResponse) {
    if !response.tool_responses.is_empty() {
        println!("Tool calls:");
        for (call, result) in response.tool_calls.iter().zip(&response.tool_responses) {
            let marker = if result.is_error() { "✗" } else { "✓" };
            println!(
                "  {marker} {} [{}] {}",
                call.name(),
                result.server_id,
                truncate_string(&one_line(&call.function.arguments), 60)
            );
            println!("      → {}", truncate_string(&one_line(&result.result), 72));
        }
        print_separator(80);
    }
    println!("{}", response.reply);
}
