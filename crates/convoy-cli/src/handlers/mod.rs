//! Command handlers. Each receives the composed [`crate::CliContext`].

pub mod ask;
pub mod status;
pub mod tools;
