//! MCP tool server plumbing for convoy.
//!
//! - [`client`]: JSON-RPC session over stdio, SSE, and streamable HTTP
//! - [`resolver`]: locating `npx` and script interpreters for stdio servers
//! - [`McpConnector`]: the production `ToolServerConnector`
//! - [`ServerConnectionManager`]: memoized one-shot connection of the fleet
//! - [`ToolRouter`]: dispatch of tool calls to their owning server
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub mod client;
pub(crate) mod connector;
pub(crate) mod manager;
pub mod path;
pub mod resolver;
pub(crate) mod router;

#[cfg(test)]
pub(crate) mod testing;

pub use connector::McpConnector;
pub use manager::{ConnectionSnapshot, ServerConnection, ServerConnectionManager};
pub use router::ToolRouter;

// Re-export domain types from core for convenience
pub use convoy_core::{McpClientError, McpTool, ServerConfig, ServerStatus, ServerTool, ServerType};

// Dev-dependencies used only by integration tests.
#[cfg(test)]
use {axum as _, tempfile as _};
