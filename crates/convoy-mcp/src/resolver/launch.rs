//! Turn a stdio [`ServerConfig`] into a concrete program + argv.

use std::path::{Path, PathBuf};

use convoy_core::ServerConfig;

use super::resolve::{ResolveDeps, resolve_executable};
use super::types::ResolveError;

/// What to spawn for a stdio server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl LaunchPlan {
    /// Directory of the program, prepended to the child's PATH.
    pub fn exe_dir(&self) -> Option<&Path> {
        self.program.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

const NO_PREFIX: &[&str] = &[];
const TSX_PREFIX: &[&str] = &["tsx"];

/// Interpreter implied by a script's extension, if any.
///
/// `.ts` runs through `npx tsx`, so the second element holds the argv
/// prefix placed before the script path.
pub fn interpreter_for(script: &Path) -> Option<(&'static str, &'static [&'static str])> {
    let ext = script.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "js" | "mjs" | "cjs" => Some(("node", NO_PREFIX)),
        "py" => Some(("python3", NO_PREFIX)),
        "sh" => Some(("sh", NO_PREFIX)),
        "ts" => Some(("npx", TSX_PREFIX)),
        _ => None,
    }
}

/// Build the launch plan for a stdio server.
///
/// `npxCommand` wins over `scriptPath`. npx candidates must pass the
/// version probe in `npx_deps`; script interpreters only need to exist.
pub fn plan_launch(
    config: &ServerConfig,
    user_search_paths: &[String],
    deps: &ResolveDeps<'_>,
    npx_deps: &ResolveDeps<'_>,
) -> Result<LaunchPlan, ResolveError> {
    if let Some(package) = config.npx_command.as_deref().filter(|p| !p.trim().is_empty()) {
        let npx = resolve_executable("npx", user_search_paths, npx_deps)?;
        let mut args = vec!["-y".to_string(), package.trim().to_string()];
        args.extend(config.args.iter().cloned());
        return Ok(LaunchPlan {
            program: npx.resolved_path,
            args,
        });
    }

    let Some(script) = config.script_path.as_deref().filter(|p| !p.trim().is_empty()) else {
        return Err(ResolveError::NothingToLaunch);
    };
    let script_path = Path::new(script);

    let Some((interpreter, prefix)) = interpreter_for(script_path) else {
        return Ok(LaunchPlan {
            program: script_path.to_path_buf(),
            args: config.args.clone(),
        });
    };

    let resolve_deps = if interpreter == "npx" { npx_deps } else { deps };
    let program = resolve_executable(interpreter, user_search_paths, resolve_deps)?.resolved_path;

    let mut args: Vec<String> = prefix.iter().map(ToString::to_string).collect();
    args.push(script.to_string());
    args.extend(config.args.iter().cloned());
    Ok(LaunchPlan { program, args })
}
