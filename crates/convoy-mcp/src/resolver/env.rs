//! Environment access (injectable for testing).

use std::ffi::OsString;

/// Read access to environment variables.
pub trait EnvProvider {
    /// Get one variable.
    fn get(&self, key: &str) -> Option<OsString>;

    /// Snapshot of all UTF-8 variables; the base layer for child environments.
    fn vars(&self) -> Vec<(String, String)>;
}

/// Reads the real process environment.
pub struct SystemEnv;

impl EnvProvider for SystemEnv {
    fn get(&self, key: &str) -> Option<OsString> {
        std::env::var_os(key)
    }

    fn vars(&self) -> Vec<(String, String)> {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MockEnv {
    vars: std::collections::BTreeMap<String, String>,
}

#[cfg(test)]
impl MockEnv {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
impl EnvProvider for MockEnv {
    fn get(&self, key: &str) -> Option<OsString> {
        self.vars.get(key).map(OsString::from)
    }

    fn vars(&self) -> Vec<(String, String)> {
        self.vars.clone().into_iter().collect()
    }
}
