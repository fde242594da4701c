//! Provider and tool-server health reporting.

use std::sync::Arc;

use convoy_core::{ProviderAdapter, ProviderStatus, ServerStatus, ToolExecutor};

pub struct StatusReporter {
    provider: Arc<dyn ProviderAdapter>,
    executor: Arc<dyn ToolExecutor>,
}

impl StatusReporter {
    pub fn new(provider: Arc<dyn ProviderAdapter>, executor: Arc<dyn ToolExecutor>) -> Self {
        Self { provider, executor }
    }

    /// Probe the provider. Failures are reported in the status, never raised.
    pub async fn provider_status(&self) -> ProviderStatus {
        let connection = self.provider.test_connection().await;
        if let Some(error) = &connection.error {
            tracing::warn!(provider = %self.provider.provider_type(), error = %error, "Provider connection test failed");
        }
        ProviderStatus {
            provider: self.provider.provider_type(),
            model: self.provider.model().to_string(),
            connection,
        }
    }

    /// One entry per configured server, in configuration order.
    pub async fn server_status(&self) -> Vec<ServerStatus> {
        self.executor.server_status().await
    }
}
