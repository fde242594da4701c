//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No HTTP client types in any signature
//! - No process/filesystem implementation details
//! - Errors are colocated with the port that raises them

pub mod config_error;
pub mod provider;
pub mod tool_executor;
pub mod tool_server;

pub use config_error::ConfigurationError;
pub use provider::{ERROR_BODY_LIMIT, ProviderAdapter, ProviderError, truncate_body};
pub use tool_executor::{ToolError, ToolExecution, ToolExecutor};
pub use tool_server::{
    CallToolResult, McpClientError, McpTool, ToolServerClient, ToolServerConnector,
};
