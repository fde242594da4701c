//! Command-line front end for convoy.
//!
//! `main.rs` parses arguments, loads [`AppConfig`], builds a [`CliContext`]
//! through [`bootstrap`], and dispatches to [`handlers`].
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by main.rs only
use dotenvy as _;
use tokio as _;
use tracing_subscriber as _;

// Dev-dependencies used only by integration tests
#[cfg(test)]
use {async_trait as _, axum as _};

pub mod bootstrap;
pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliContext, bootstrap, compose};
pub use commands::{Commands, enabled_servers};
pub use config::AppConfig;
pub use error::CliError;
pub use parser::Cli;
