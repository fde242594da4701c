//! Environment construction for spawned tool servers.
//!
//! The child environment is built explicitly from layers instead of being
//! inherited implicitly:
//! 1. the base environment (normally the current process)
//! 2. the server's configured `env`
//! 3. caller-supplied extras
//!
//! Later layers win. `PATH` is then rebuilt so the resolved executable's
//! directory comes first, followed by the merged PATH and platform defaults.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Platform-specific PATH separator
#[cfg(unix)]
pub const PATH_SEPARATOR: &str = ":";
#[cfg(windows)]
pub const PATH_SEPARATOR: &str = ";";

/// Default paths to include on macOS when PATH is limited (bundled apps)
#[cfg(target_os = "macos")]
const MACOS_DEFAULT_PATHS: &str = "/opt/homebrew/bin:/usr/local/bin:/usr/bin:/bin:/usr/sbin:/sbin";

/// Merge environment layers for a child process.
pub fn build_env<I>(
    base: I,
    server: &BTreeMap<String, String>,
    extra: &[(String, String)],
    exe_dir: Option<&Path>,
) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut env: BTreeMap<String, String> = base.into_iter().collect();
    for (key, value) in server {
        env.insert(key.clone(), value.clone());
    }
    for (key, value) in extra {
        env.insert(key.clone(), value.clone());
    }

    let merged_path = env.get("PATH").map(String::as_str);
    let path = build_effective_path(exe_dir, merged_path);
    env.insert("PATH".to_string(), path);
    env
}

/// Build an effective PATH: executable directory, then `current`, then
/// platform defaults. Entries are deduplicated preserving order.
pub fn build_effective_path(exe_dir: Option<&Path>, current: Option<&str>) -> String {
    let mut entries: Vec<String> = Vec::new();

    if let Some(dir) = exe_dir.and_then(Path::to_str) {
        if !dir.is_empty() {
            entries.push(dir.to_string());
        }
    }

    if let Some(current) = current {
        entries.extend(
            current
                .split(PATH_SEPARATOR)
                .filter(|e| !e.is_empty())
                .map(String::from),
        );
    }

    #[cfg(target_os = "macos")]
    entries.extend(
        MACOS_DEFAULT_PATHS
            .split(':')
            .filter(|e| !e.is_empty())
            .map(String::from),
    );

    let mut seen = HashSet::new();
    entries.retain(|entry| seen.insert(entry.clone()));
    entries.join(PATH_SEPARATOR)
}
