//! Executable resolution: search candidates, check each, stop at the first
//! one that passes.

use std::path::Path;

use super::env::{EnvProvider, SystemEnv};
use super::fs::{FsProvider, SystemFs};
use super::probe::{SystemProbe, VersionProbe};
use super::search::ExecutableSearcher;
use super::types::{Attempt, AttemptOutcome, ResolveError, ResolveResult};

/// Injected dependencies for resolution.
pub struct ResolveDeps<'a> {
    pub env: &'a dyn EnvProvider,
    pub fs: &'a dyn FsProvider,
    /// When set, a candidate must also pass `--version`.
    pub probe: Option<&'a dyn VersionProbe>,
}

impl ResolveDeps<'static> {
    /// Real environment and filesystem, no version probe.
    pub fn system() -> Self {
        Self {
            env: &SystemEnv,
            fs: &SystemFs,
            probe: None,
        }
    }

    /// Real environment and filesystem with `--version` probing.
    pub fn system_probed() -> Self {
        Self {
            env: &SystemEnv,
            fs: &SystemFs,
            probe: Some(&SystemProbe),
        }
    }
}

impl ResolveDeps<'_> {
    fn check(&self, candidate: &Path) -> AttemptOutcome {
        let outcome = self.fs.check_executable(candidate);
        if outcome != AttemptOutcome::Ok {
            return outcome;
        }
        match self.probe.map(|p| p.check_version(candidate)) {
            Some(Err(reason)) => AttemptOutcome::VersionCheckFailed(reason),
            _ => AttemptOutcome::Ok,
        }
    }
}

/// Resolve a command to an absolute executable path.
///
/// An absolute command is checked as-is; if it fails, its basename is
/// searched like any relative command.
pub fn resolve_executable(
    command: &str,
    user_search_paths: &[String],
    deps: &ResolveDeps<'_>,
) -> Result<ResolveResult, ResolveError> {
    let command = command.trim();
    if command.is_empty() {
        return Err(ResolveError::EmptyCommand);
    }

    let mut attempts = Vec::new();
    let mut name = command;

    let command_path = Path::new(command);
    if command_path.is_absolute() {
        let outcome = deps.check(command_path);
        let ok = outcome == AttemptOutcome::Ok;
        attempts.push(Attempt {
            candidate: command_path.to_path_buf(),
            outcome: outcome.clone(),
        });
        if ok {
            return Ok(ResolveResult {
                resolved_path: command_path.to_path_buf(),
                attempts,
            });
        }

        let Some(basename) = command_path.file_name().and_then(|n| n.to_str()) else {
            return Err(ResolveError::not_resolved(command, &attempts));
        };
        tracing::debug!(command, %outcome, basename, "Absolute path failed, searching by basename");
        name = basename;
    }

    let searcher = ExecutableSearcher::new(deps.env, deps.fs);
    for candidate in searcher.candidates(name, user_search_paths) {
        let outcome = deps.check(&candidate);
        let ok = outcome == AttemptOutcome::Ok;
        attempts.push(Attempt {
            candidate: candidate.clone(),
            outcome,
        });
        if ok {
            return Ok(ResolveResult {
                resolved_path: candidate,
                attempts,
            });
        }
    }

    Err(ResolveError::not_resolved(command, &attempts))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::resolver::env::MockEnv;
    use crate::resolver::fs::MockFs;
    use crate::resolver::probe::MockProbe;
    use std::path::PathBuf;

    fn deps<'a>(env: &'a MockEnv, fs: &'a MockFs, probe: Option<&'a MockProbe>) -> ResolveDeps<'a> {
        ResolveDeps {
            env,
            fs,
            probe: probe.map(|p| p as &dyn VersionProbe),
        }
    }

    #[test]
    fn test_resolve_absolute_path_success() {
        let env = MockEnv::new();
        let fs = MockFs::new().with_executable("/usr/local/bin/npx");

        let resolved = resolve_executable("/usr/local/bin/npx", &[], &deps(&env, &fs, None)).unwrap();
        assert_eq!(resolved.resolved_path, PathBuf::from("/usr/local/bin/npx"));
    }

    #[test]
    fn test_resolve_absolute_path_failure_falls_back() {
        let env = MockEnv::new().with_var("PATH", "/opt/homebrew/bin");
        let fs = MockFs::new().with_executable("/opt/homebrew/bin/npx");

        let resolved = resolve_executable("/missing/bin/npx", &[], &deps(&env, &fs, None)).unwrap();
        assert_eq!(resolved.resolved_path, PathBuf::from("/opt/homebrew/bin/npx"));
        assert_eq!(resolved.attempts[0].outcome, AttemptOutcome::NotFound);
    }

    #[test]
    fn test_resolve_empty_command() {
        let env = MockEnv::new();
        let fs = MockFs::new();
        let result = resolve_executable("  ", &[], &deps(&env, &fs, None));
        assert!(matches!(result, Err(ResolveError::EmptyCommand)));
    }

    #[test]
    fn test_resolve_not_found_lists_attempts() {
        let env = MockEnv::new().with_var("PATH", "/nowhere");
        let fs = MockFs::new();

        match resolve_executable("nonexistent", &[], &deps(&env, &fs, None)) {
            Err(ResolveError::NotResolved { command, attempts }) => {
                assert_eq!(command, "nonexistent");
                assert!(attempts.contains("/nowhere/nonexistent"));
            }
            other => panic!("Expected NotResolved error, got {other:?}"),
        }
    }

    #[test]
    fn test_broken_candidate_skipped_by_version_probe() {
        let env = MockEnv::new().with_var("PATH", "/broken:/good");
        let fs = MockFs::new()
            .with_executable("/broken/npx")
            .with_executable("/good/npx");
        let probe = MockProbe::new().with_working("/good/npx");

        let resolved = resolve_executable("npx", &[], &deps(&env, &fs, Some(&probe))).unwrap();
        assert_eq!(resolved.resolved_path, PathBuf::from("/good/npx"));
        assert!(matches!(
            resolved.attempts[0].outcome,
            AttemptOutcome::VersionCheckFailed(_)
        ));
    }

    #[test]
    fn test_resolve_with_user_paths() {
        let env = MockEnv::new();
        let fs = MockFs::new().with_executable("/custom/bin/npx");
        let user_paths = vec!["/custom/bin".to_string()];

        let resolved = resolve_executable("npx", &user_paths, &deps(&env, &fs, None)).unwrap();
        assert_eq!(resolved.resolved_path, PathBuf::from("/custom/bin/npx"));
    }
}
