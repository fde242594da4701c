//! Conversation orchestration for convoy.
//!
//! This crate depends only on `convoy-core` ports: a [`ProviderAdapter`]
//! for the LLM and a [`ToolExecutor`] for the tool catalog. Concrete
//! adapters and the tool-server manager are wired in by the binary.
//!
//! [`ProviderAdapter`]: convoy_core::ProviderAdapter
//! [`ToolExecutor`]: convoy_core::ToolExecutor
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

mod engine;
mod orchestrator;
mod status;

#[cfg(test)]
mod testing;

pub use engine::{ChatEngine, EngineStatus};
pub use orchestrator::{ConversationOrchestrator, DEFAULT_SYSTEM_PROMPT, OrchestratorError};
pub use status::StatusReporter;
