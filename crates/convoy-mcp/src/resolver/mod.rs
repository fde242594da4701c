//! Executable resolution and launch planning for stdio tool servers.
//!
//! ## Architecture
//!
//! - `types`: result, attempt and error types
//! - `env`, `fs`, `probe`: injectable environment, filesystem and
//!   `--version` access
//! - `search`: candidate enumeration (PATH, platform defaults, Node
//!   version-manager shims, user paths)
//! - `resolve`: check candidates in order, first pass wins
//! - `launch`: `npxCommand` / `scriptPath` to program + argv
//!
//! ## Usage
//!
//! ```rust,no_run
//! use convoy_mcp::resolver::{ResolveDeps, resolve_executable};
//!
//! let result = resolve_executable("npx", &[], &ResolveDeps::system_probed()).unwrap();
//! println!("Resolved to: {}", result.resolved_path.display());
//! for attempt in &result.attempts {
//!     println!("  {} - {}", attempt.candidate.display(), attempt.outcome);
//! }
//! ```

mod env;
mod fs;
mod launch;
mod probe;
mod resolve;
mod search;
mod types;

pub use env::{EnvProvider, SystemEnv};
pub use fs::{FsProvider, SystemFs};
pub use launch::{LaunchPlan, interpreter_for, plan_launch};
pub use probe::{SystemProbe, VersionProbe};
pub use resolve::{ResolveDeps, resolve_executable};
pub use types::{Attempt, AttemptOutcome, ResolveError, ResolveResult};
