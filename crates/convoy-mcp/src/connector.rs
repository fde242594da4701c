//! Production [`ToolServerConnector`]: picks the transport for a config,
//! opens it, and runs the MCP handshake.

use std::sync::Arc;

use async_trait::async_trait;
use convoy_core::{McpClientError, ServerConfig, ServerType, ToolServerClient, ToolServerConnector};

use crate::client::{McpClient, SseTransport, StdioTransport, StreamableHttpTransport, Transport};
use crate::path::build_env;
use crate::resolver::{EnvProvider, LaunchPlan, ResolveDeps, SystemEnv, plan_launch};

/// Connects over stdio, SSE, or streamable HTTP depending on the config.
#[derive(Debug, Clone, Default)]
pub struct McpConnector {
    /// Extra directories searched after PATH and the built-in locations.
    user_search_paths: Vec<String>,
    /// Extra environment applied on top of every stdio server's env.
    extra_env: Vec<(String, String)>,
}

impl McpConnector {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_search_paths(mut self, paths: Vec<String>) -> Self {
        self.user_search_paths = paths;
        self
    }

    #[must_use]
    pub fn with_extra_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_env.push((key.into(), value.into()));
        self
    }

    async fn open_stdio(&self, config: &ServerConfig) -> Result<Box<dyn Transport>, McpClientError> {
        // Resolution stats files and runs `--version` probes.
        let plan_config = config.clone();
        let search_paths = self.user_search_paths.clone();
        let plan: LaunchPlan = tokio::task::spawn_blocking(move || {
            plan_launch(
                &plan_config,
                &search_paths,
                &ResolveDeps::system(),
                &ResolveDeps::system_probed(),
            )
        })
        .await
        .map_err(|e| McpClientError::SpawnFailed(format!("Resolver task failed: {e}")))?
        .map_err(|e| McpClientError::SpawnFailed(e.to_string()))?;

        let env = build_env(SystemEnv.vars(), &config.env, &self.extra_env, plan.exe_dir());

        tracing::debug!(
            server_id = %config.id,
            program = %plan.program.display(),
            args = ?plan.args,
            "Launching stdio tool server"
        );

        let transport =
            StdioTransport::spawn(config.display_name(), &plan.program, &plan.args, &env)?;
        Ok(Box::new(transport))
    }
}

#[async_trait]
impl ToolServerConnector for McpConnector {
    async fn connect(
        &self,
        config: &ServerConfig,
    ) -> Result<Arc<dyn ToolServerClient>, McpClientError> {
        let transport: Box<dyn Transport> = match config.effective_type() {
            ServerType::Stdio => self.open_stdio(config).await?,
            ServerType::Sse => {
                let url = config.url.as_deref().ok_or_else(|| {
                    McpClientError::InvalidConfig("SSE server requires url".to_string())
                })?;
                Box::new(SseTransport::connect(url, &config.headers).await?)
            }
            ServerType::StreamableHttp => {
                let url = config.url.as_deref().ok_or_else(|| {
                    McpClientError::InvalidConfig("streamable-http server requires url".to_string())
                })?;
                Box::new(StreamableHttpTransport::new(url, &config.headers)?)
            }
        };

        let client = McpClient::connect(transport).await?;
        Ok(Arc::new(client))
    }
}
