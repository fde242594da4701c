//! Types for executable resolution.

use std::path::PathBuf;

/// Successful resolution plus the diagnostic trail.
#[derive(Debug, Clone)]
pub struct ResolveResult {
    /// Absolute path of the executable that passed every check.
    pub resolved_path: PathBuf,
    /// Every candidate examined, in search order.
    pub attempts: Vec<Attempt>,
}

/// One candidate path and what happened when it was checked.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub candidate: PathBuf,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Ok,
    NotFound,
    NotAFile,
    NotExecutable,
    PermissionDenied,
    IoError(String),
    /// Executable, but `--version` failed.
    VersionCheckFailed(String),
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::NotFound => write!(f, "not found"),
            Self::NotAFile => write!(f, "not a file"),
            Self::NotExecutable => write!(f, "not executable"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::IoError(msg) => write!(f, "I/O error: {msg}"),
            Self::VersionCheckFailed(msg) => write!(f, "version check failed: {msg}"),
        }
    }
}

/// Resolution or launch planning failed.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Command is empty")]
    EmptyCommand,

    #[error("Server has neither npxCommand nor scriptPath")]
    NothingToLaunch,

    #[error("Could not resolve '{command}' to an executable path. Tried:\n{attempts}")]
    NotResolved { command: String, attempts: String },
}

impl ResolveError {
    pub fn not_resolved(command: impl Into<String>, attempts: &[Attempt]) -> Self {
        let attempts = if attempts.is_empty() {
            "  (no candidates checked)".to_string()
        } else {
            attempts
                .iter()
                .map(|a| format!("  x {}: {}", a.candidate.display(), a.outcome))
                .collect::<Vec<_>>()
                .join("\n")
        };

        Self::NotResolved {
            command: command.into(),
            attempts,
        }
    }
}
