//! `--version` probing of candidate executables.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::path::build_effective_path;

/// Runs a candidate with `--version` to prove it actually works.
///
/// A broken shim (e.g. an npx whose node is missing) exists and is
/// executable, yet fails here.
pub trait VersionProbe {
    /// Returns the trimmed version output, or why the probe failed.
    fn check_version(&self, path: &Path) -> Result<String, String>;
}

/// Spawns the real binary (blocking).
pub struct SystemProbe;

impl VersionProbe for SystemProbe {
    fn check_version(&self, path: &Path) -> Result<String, String> {
        let current = std::env::var("PATH").ok();
        let effective = build_effective_path(path.parent(), current.as_deref());

        let output = Command::new(path)
            .arg("--version")
            .env("PATH", effective)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| e.to_string())?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(format!("--version exited with {}", output.status))
        }
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MockProbe {
    working: std::collections::HashSet<std::path::PathBuf>,
}

#[cfg(test)]
impl MockProbe {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_working(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.working.insert(path.into());
        self
    }
}

#[cfg(test)]
impl VersionProbe for MockProbe {
    fn check_version(&self, path: &Path) -> Result<String, String> {
        if self.working.contains(path) {
            Ok("10.0.0".to_string())
        } else {
            Err("--version exited with 127".to_string())
        }
    }
}
