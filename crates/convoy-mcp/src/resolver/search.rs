//! Candidate enumeration for executable search.

use std::path::PathBuf;

use super::env::EnvProvider;
use super::fs::FsProvider;

/// Enumerates the places a command may live, in priority order.
pub struct ExecutableSearcher<'a> {
    env: &'a dyn EnvProvider,
    fs: &'a dyn FsProvider,
}

impl<'a> ExecutableSearcher<'a> {
    pub fn new(env: &'a dyn EnvProvider, fs: &'a dyn FsProvider) -> Self {
        Self { env, fs }
    }

    /// Every candidate path for `command`:
    /// 1. each PATH entry
    /// 2. platform default directories
    /// 3. Node version-manager shims (npm/npx/node only)
    /// 4. user-supplied directories
    pub fn candidates(&self, command: &str, user_paths: &[String]) -> Vec<PathBuf> {
        let mut dirs = self.path_dirs();
        dirs.extend(platform_default_dirs().iter().map(PathBuf::from));
        dirs.extend(self.node_manager_dirs(command));
        dirs.extend(
            user_paths
                .iter()
                .filter(|d| !d.is_empty())
                .map(PathBuf::from),
        );

        let mut seen = std::collections::HashSet::new();
        dirs.into_iter()
            .filter(|d| seen.insert(d.clone()))
            .flat_map(|dir| self.variants(command).into_iter().map(move |v| dir.join(v)))
            .collect()
    }

    fn path_dirs(&self) -> Vec<PathBuf> {
        self.env
            .get("PATH")
            .and_then(|p| p.into_string().ok())
            .map(|p| {
                p.split(path_separator())
                    .filter(|d| !d.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// asdf and volta shims first, then nvm's default alias, then installed
    /// nvm versions newest first.
    fn node_manager_dirs(&self, command: &str) -> Vec<PathBuf> {
        if !matches!(command, "npm" | "npx" | "node") {
            return Vec::new();
        }
        let Some(home) = self.env.get("HOME").map(PathBuf::from) else {
            return Vec::new();
        };

        let mut dirs = vec![home.join(".asdf/shims"), home.join(".volta/bin")];

        let nvm = home.join(".nvm");
        if let Some(alias) = self.fs.read_to_string(&nvm.join("alias/default")) {
            let alias = alias.trim();
            let version = if alias.starts_with('v') {
                alias.to_string()
            } else {
                format!("v{alias}")
            };
            dirs.push(nvm.join("versions/node").join(version).join("bin"));
        }

        let mut versions = self.fs.list_dir(&nvm.join("versions/node"));
        versions.sort_by(|a, b| version_key(b).cmp(&version_key(a)));
        dirs.extend(
            versions
                .into_iter()
                .map(|v| nvm.join("versions/node").join(v).join("bin")),
        );

        dirs
    }

    #[cfg(windows)]
    fn variants(&self, command: &str) -> Vec<String> {
        let mut variants = vec![command.to_string()];
        let exts = self
            .env
            .get("PATHEXT")
            .and_then(|p| p.into_string().ok())
            .unwrap_or_else(|| ".CMD;.EXE;.BAT;.COM".to_string());
        variants.extend(
            exts.split(';')
                .filter(|e| !e.is_empty())
                .map(|e| format!("{command}{}", e.to_lowercase())),
        );
        variants
    }

    #[cfg(not(windows))]
    fn variants(&self, command: &str) -> Vec<String> {
        let _ = self;
        vec![command.to_string()]
    }
}

/// Numeric sort key for `v20.11.1`-style directory names.
fn version_key(name: &str) -> Vec<u64> {
    name.trim_start_matches('v')
        .split('.')
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}

fn platform_default_dirs() -> &'static [&'static str] {
    #[cfg(target_os = "macos")]
    {
        &["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin", "/bin"]
    }

    #[cfg(target_os = "windows")]
    {
        &[]
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        &["/usr/local/bin", "/usr/bin", "/bin"]
    }
}

#[cfg(unix)]
const fn path_separator() -> char {
    ':'
}

#[cfg(windows)]
const fn path_separator() -> char {
    ';'
}
