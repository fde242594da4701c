//! CLI bootstrap - the composition root.
//!
//! The only place where concrete adapters are wired together:
//! - the provider adapter (via convoy-providers)
//! - the tool server manager and its connector (via convoy-mcp)
//! - the chat engine (via convoy-agent)

use std::sync::Arc;

use convoy_agent::ChatEngine;
use convoy_core::{ProviderAdapter, ServerConfig, ToolServerConnector};
use convoy_mcp::{McpConnector, ServerConnectionManager};
use convoy_providers::ProviderFactory;

use crate::config::AppConfig;
use crate::error::CliError;

/// Fully composed context for command handlers.
pub struct CliContext {
    pub engine: ChatEngine,
    manager: Arc<ServerConnectionManager>,
}

impl CliContext {
    /// Disconnect every tool server. Stdio children are killed.
    pub async fn shutdown(&self) {
        self.manager.shutdown().await;
    }
}

/// Build the production context from a loaded configuration.
pub fn bootstrap(config: AppConfig) -> Result<CliContext, CliError> {
    let provider = ProviderFactory::create(&config.provider, &config.servers)?;
    Ok(compose(
        Arc::new(provider),
        config.servers,
        Arc::new(McpConnector::new()),
        config.system_prompt,
    ))
}

/// Wire an engine from already-built parts.
pub fn compose(
    provider: Arc<dyn ProviderAdapter>,
    servers: Vec<ServerConfig>,
    connector: Arc<dyn ToolServerConnector>,
    system_prompt: Option<String>,
) -> CliContext {
    let manager = Arc::new(ServerConnectionManager::new(servers, connector));
    let mut engine = ChatEngine::new(provider, manager.clone());
    if let Some(prompt) = system_prompt {
        engine = engine.with_system_prompt(prompt);
    }
    CliContext { engine, manager }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convoy_core::{ConfigurationError, ProviderConfig};

    #[test]
    fn test_bootstrap_rejects_bad_provider() {
        let config = AppConfig {
            provider: ProviderConfig::new("openai", "gpt-4o"),
            servers: Vec::new(),
            system_prompt: None,
        };
        let Err(err) = bootstrap(config) else {
            panic!("expected missing key error");
        };
        assert!(matches!(err, CliError::Config(ConfigurationError::MissingApiKey(_))));
    }

    #[tokio::test]
    async fn test_bootstrap_without_servers() {
        let config = AppConfig {
            provider: ProviderConfig::new("ollama", "llama3.2"),
            servers: Vec::new(),
            system_prompt: Some("Be brief.".into()),
        };
        let ctx = bootstrap(config).unwrap();
        assert!(ctx.engine.available_tools().await.is_empty());
        assert!(ctx.engine.server_status().await.is_empty());
        ctx.shutdown().await;
    }
}
