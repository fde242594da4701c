//! Public facade bundling query processing and status reporting.

use std::sync::Arc;

use convoy_core::{
    ChatMessage, ProviderAdapter, ProviderStatus, QueryResponse, ServerStatus, ServerTool,
    ToolExecutor,
};
use serde::Serialize;

use crate::orchestrator::{ConversationOrchestrator, OrchestratorError};
use crate::status::StatusReporter;

/// Provider and server health in one snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub provider: ProviderStatus,
    pub servers: Vec<ServerStatus>,
}

/// Entry point used by front ends.
pub struct ChatEngine {
    orchestrator: ConversationOrchestrator,
    status: StatusReporter,
}

impl ChatEngine {
    pub fn new(provider: Arc<dyn ProviderAdapter>, executor: Arc<dyn ToolExecutor>) -> Self {
        Self {
            orchestrator: ConversationOrchestrator::new(Arc::clone(&provider), Arc::clone(&executor)),
            status: StatusReporter::new(provider, executor),
        }
    }

    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.orchestrator = self.orchestrator.with_system_prompt(prompt);
        self
    }

    pub async fn process_query(
        &self,
        messages: Vec<ChatMessage>,
        enabled_server_ids: Option<&[String]>,
    ) -> Result<QueryResponse, OrchestratorError> {
        self.orchestrator.process_query(messages, enabled_server_ids).await
    }

    pub async fn available_tools(&self) -> Vec<ServerTool> {
        self.orchestrator.available_tools().await
    }

    pub async fn provider_status(&self) -> ProviderStatus {
        self.status.provider_status().await
    }

    pub async fn server_status(&self) -> Vec<ServerStatus> {
        self.status.server_status().await
    }

    /// Probe the provider and collect server status concurrently.
    pub async fn status(&self) -> EngineStatus {
        let (provider, servers) =
            tokio::join!(self.status.provider_status(), self.status.server_status());
        EngineStatus { provider, servers }
    }
}
