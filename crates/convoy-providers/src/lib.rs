//! LLM provider adapters for convoy.
//!
//! Each backend lives in its own module with its wire types kept private.
//! [`ProviderFactory`] validates a [`convoy_core::ProviderConfig`] and
//! returns a [`Provider`], which implements [`convoy_core::ProviderAdapter`].
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub mod claude;
mod factory;
pub mod gemini;
mod http;
pub mod litellm;
pub mod ollama;
pub mod openai;
pub mod responses;

#[cfg(test)]
mod testing;

pub use claude::ClaudeAdapter;
pub use factory::{Provider, ProviderFactory};
pub use gemini::{GeminiAdapter, sanitize_schema};
pub use http::describe_status;
pub use litellm::LiteLlmAdapter;
pub use ollama::OllamaAdapter;
pub use openai::OpenAiAdapter;
pub use responses::{McpToolDescriptor, ResponsesAdapter};
