//! Core domain types and port definitions for convoy.
//!
//! `convoy-core` is the pure layer of the workspace: the internal chat
//! contract, tool and server descriptors, provider configuration, and the
//! traits (ports) that adapters and tool-server clients implement.
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod ports;

// Re-export commonly used types for convenience
pub use domain::{
    ChatChoice, ChatMessage, ChatResponse, ConnectionTest, ERROR_SERVER_ID, FunctionDefinition,
    MessageRole, ProviderConfig, ProviderStatus, ProviderToolCall, ProviderType, QueryResponse,
    ServerConfig, ServerStatus, ServerTool, ServerType, Tool, ToolCall, ToolCallFunction,
    ToolResponse, Usage,
};
pub use ports::{
    CallToolResult, ConfigurationError, McpClientError, McpTool, ProviderAdapter, ProviderError,
    ToolError, ToolExecution, ToolExecutor, ToolServerClient, ToolServerConnector,
};
