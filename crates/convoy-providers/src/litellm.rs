//! LiteLLM proxy adapter.
//!
//! LiteLLM speaks the chat-completions format, so requests and responses
//! pass through the OpenAI translation. The proxy is often run without
//! authentication, hence the optional key.

use async_trait::async_trait;
use convoy_core::{
    ChatMessage, ChatResponse, ConnectionTest, ProviderAdapter, ProviderError, ProviderType, Tool,
};
use reqwest::RequestBuilder;

use crate::http::{probe, send_json};
use crate::openai::{format_request, model_ids, parse_response};

pub struct LiteLlmAdapter {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl LiteLlmAdapter {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
            model: model.into(),
        }
    }

    fn headers(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl ProviderAdapter for LiteLlmAdapter {
    fn provider_type(&self) -> ProviderType {
        ProviderType::LiteLlm
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send_message(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[Tool]>,
    ) -> Result<ChatResponse, ProviderError> {
        let body = format_request(&self.model, messages, tools);
        tracing::debug!(model = %self.model, message_count = messages.len(), "Sending LiteLLM request");

        let request = self
            .headers(self.http.post(format!("{}/chat/completions", self.base_url)))
            .json(&body);
        let response = send_json(ProviderType::LiteLlm, request).await?;
        parse_response(ProviderType::LiteLlm, response)
    }

    async fn test_connection(&self) -> ConnectionTest {
        let models = self.headers(self.http.get(format!("{}/models", self.base_url)));
        let result = probe(models, model_ids).await;
        if result.connected {
            return result;
        }

        tracing::debug!(error = ?result.error, "LiteLLM models probe failed, trying /health");
        let health = self.headers(self.http.get(format!("{}/health", self.base_url)));
        let fallback = probe(health, |_| None).await;
        if fallback.connected { fallback } else { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubServer;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_no_bearer_without_key() {
        let stub = StubServer::start().await;
        stub.respond(
            "/chat/completions",
            StatusCode::OK,
            json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": "ok"}}]}),
        );
        let adapter = LiteLlmAdapter::new(stub.base_url.clone(), None, "claude-3-haiku");
        let response = adapter.send_message(&[ChatMessage::user("hi")], None).await.unwrap();

        assert_eq!(response.reply_text(), "ok");
        assert!(stub.last_request().header("authorization").is_none());
    }

    #[tokio::test]
    async fn test_bearer_with_key() {
        let stub = StubServer::start().await;
        stub.respond("/models", StatusCode::OK, json!({"data": [{"id": "gpt-4o"}]}));
        let adapter = LiteLlmAdapter::new(stub.base_url.clone(), Some("sk-lite".into()), "gpt-4o");
        let result = adapter.test_connection().await;

        assert!(result.connected);
        assert_eq!(stub.last_request().header("authorization"), Some("Bearer sk-lite"));
    }

    #[tokio::test]
    async fn test_connection_falls_back_to_health() {
        let stub = StubServer::start().await;
        stub.respond("/models", StatusCode::INTERNAL_SERVER_ERROR, json!({}));
        stub.respond("/health", StatusCode::OK, json!({"healthy_count": 1}));
        let adapter = LiteLlmAdapter::new(stub.base_url.clone(), None, "m");

        let result = adapter.test_connection().await;
        assert!(result.connected);
        assert!(result.models.is_none());
        let paths: Vec<_> = stub.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/models", "/health"]);
    }

    #[tokio::test]
    async fn test_connection_reports_models_error_when_both_fail() {
        let stub = StubServer::start().await;
        stub.respond("/models", StatusCode::UNAUTHORIZED, json!({}));
        stub.respond("/health", StatusCode::UNAUTHORIZED, json!({}));
        let adapter = LiteLlmAdapter::new(stub.base_url.clone(), Some("bad".into()), "m");

        let result = adapter.test_connection().await;
        assert!(!result.connected);
        assert_eq!(result.error.as_deref(), Some("Invalid API key"));
    }
}
