//! Domain types shared by every convoy crate.
//!
//! These types carry no I/O and no transport details.

pub mod chat;
pub mod provider;
pub mod query;
pub mod server;
pub mod tool;

pub use chat::{
    ChatChoice, ChatMessage, ChatResponse, MessageRole, ProviderToolCall, ToolCall,
    ToolCallFunction, Usage,
};
pub use provider::{ConnectionTest, ProviderConfig, ProviderStatus, ProviderType};
pub use query::{ERROR_SERVER_ID, QueryResponse, ToolResponse};
pub use server::{ServerConfig, ServerStatus, ServerType};
pub use tool::{FunctionDefinition, ServerTool, Tool};
