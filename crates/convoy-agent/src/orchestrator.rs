//! Two-phase conversation protocol.
//!
//! One query is at most one tool phase between exactly two provider calls:
//!
//! 1. send the conversation with the (filtered) tool catalog
//! 2. if the reply asks for tools, run them in order and append one
//!    (assistant, tool) message pair per call
//! 3. send the extended conversation again, without tools, for the
//!    natural-language answer
//!
//! There is no further round. Tool failures are contained as tool-result
//! content; provider failures abort the query.

use std::sync::Arc;

use convoy_core::{
    ChatMessage, ChatResponse, ERROR_SERVER_ID, MessageRole, ProviderAdapter, ProviderError,
    QueryResponse, ServerTool, Tool, ToolCall, ToolExecutor, ToolResponse,
};
use thiserror::Error;

/// System prompt used when the caller does not configure one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant with access to external tools. \
Use a tool when it helps answer the user's request, then answer in plain language. \
If no tool is relevant, answer directly.";

/// Failure of a whole query.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Drives one provider and one tool executor through the two-phase protocol.
pub struct ConversationOrchestrator {
    provider: Arc<dyn ProviderAdapter>,
    executor: Arc<dyn ToolExecutor>,
    system_prompt: String,
}

impl ConversationOrchestrator {
    pub fn new(provider: Arc<dyn ProviderAdapter>, executor: Arc<dyn ToolExecutor>) -> Self {
        Self {
            provider,
            executor,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Replace the default system prompt. Blank prompts keep the default.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        if !prompt.trim().is_empty() {
            self.system_prompt = prompt;
        }
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Full server-tagged tool catalog.
    pub async fn available_tools(&self) -> Vec<ServerTool> {
        self.executor.available_tools().await
    }

    /// Run one query round.
    ///
    /// `enabled_server_ids`: `None` offers every tool, `Some(&[])` offers
    /// none, otherwise only tools owned by the listed servers.
    pub async fn process_query(
        &self,
        messages: Vec<ChatMessage>,
        enabled_server_ids: Option<&[String]>,
    ) -> Result<QueryResponse, OrchestratorError> {
        let mut messages = self.ensure_system_prompt(messages);
        let tools = filter_tools(self.executor.available_tools().await, enabled_server_ids);

        tracing::debug!(
            provider = %self.provider.provider_type(),
            message_count = messages.len(),
            tool_count = tools.len(),
            "Sending initial request"
        );
        let first = self
            .provider
            .send_message_with_servers(
                &messages,
                (!tools.is_empty()).then_some(tools.as_slice()),
                enabled_server_ids,
            )
            .await?;

        if !first.provider_tool_calls.is_empty() {
            return Ok(provider_executed(first));
        }

        let calls = first.tool_calls().to_vec();
        if calls.is_empty() {
            return Ok(QueryResponse::direct(first.reply_text()));
        }

        tracing::info!(call_count = calls.len(), "Executing tool calls");
        let mut responses = Vec::with_capacity(calls.len());
        for call in &calls {
            let response = self.run_tool(call).await;
            messages.push(ChatMessage::assistant_tool_calls(vec![call.clone()]));
            messages.push(ChatMessage::tool_result(&call.id, &response.result));
            responses.push(response);
        }

        let follow_up = self
            .provider
            .send_message_with_servers(&messages, None, Some(&[]))
            .await?;
        Ok(QueryResponse {
            reply: follow_up.reply_text().to_string(),
            tool_calls: calls,
            tool_responses: responses,
        })
    }

    fn ensure_system_prompt(&self, mut messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
        let has_leading_system = messages
            .first()
            .is_some_and(|m| m.role == MessageRole::System);
        if !has_leading_system {
            messages.insert(0, ChatMessage::system(&self.system_prompt));
        }
        messages
    }

    async fn run_tool(&self, call: &ToolCall) -> ToolResponse {
        match self.executor.execute(call).await {
            Ok(execution) => ToolResponse {
                tool_call_id: call.id.clone(),
                name: call.name().to_string(),
                server_id: execution.server_id,
                result: execution.result,
            },
            Err(e) => {
                tracing::warn!(tool = call.name(), call_id = %call.id, error = %e, "Tool execution failed");
                ToolResponse {
                    tool_call_id: call.id.clone(),
                    name: call.name().to_string(),
                    server_id: ERROR_SERVER_ID.to_string(),
                    result: tool_error_text(call.name(), &e),
                }
            }
        }
    }
}

fn tool_error_text(name: &str, error: &dyn std::fmt::Display) -> String {
    format!("Error executing tool {name}: {error}")
}

/// Apply the enabled-server filter and strip server tags.
fn filter_tools(catalog: Vec<ServerTool>, enabled_server_ids: Option<&[String]>) -> Vec<Tool> {
    catalog
        .into_iter()
        .filter(|tool| enabled_server_ids.is_none_or(|ids| ids.contains(&tool.server_id)))
        .map(ServerTool::into_tool)
        .collect()
}

/// Report calls the provider already executed; no local phase follows.
fn provider_executed(response: ChatResponse) -> QueryResponse {
    let reply = response.reply_text().to_string();
    let (tool_calls, tool_responses) = response
        .provider_tool_calls
        .into_iter()
        .map(|executed| {
            let result = match executed.error {
                Some(error) => tool_error_text(executed.call.name(), &error),
                None => executed.output.unwrap_or_default(),
            };
            let response = ToolResponse {
                tool_call_id: executed.call.id.clone(),
                name: executed.call.name().to_string(),
                server_id: executed.server_label,
                result,
            };
            (executed.call, response)
        })
        .unzip();

    QueryResponse {
        reply,
        tool_calls,
        tool_responses,
    }
}
