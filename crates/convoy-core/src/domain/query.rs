//! Result of one two-phase query round.

use serde::{Deserialize, Serialize};

use super::chat::ToolCall;

/// Server id recorded for tool calls that failed before or during execution.
pub const ERROR_SERVER_ID: &str = "error";

/// Outcome of a single tool call, successful or contained failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub tool_call_id: String,
    pub name: String,
    /// Owning server, or [`ERROR_SERVER_ID`] when execution failed.
    pub server_id: String,
    pub result: String,
}

impl ToolResponse {
    /// Whether this response records a contained failure.
    pub fn is_error(&self) -> bool {
        self.server_id == ERROR_SERVER_ID
    }
}

/// Final answer of `process_query`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub reply: String,
    pub tool_calls: Vec<ToolCall>,
    pub tool_responses: Vec<ToolResponse>,
}

impl QueryResponse {
    /// A reply that involved no tools.
    pub fn direct(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            tool_calls: Vec::new(),
            tool_responses: Vec::new(),
        }
    }
}
