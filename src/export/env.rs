//! Environment fallback for variable lookup.

use std::collections::HashMap;

/// Source of variables consulted when a name is not explicitly exported.
pub trait EnvProvider: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;

    /// Every variable name the provider knows about.
    fn names(&self) -> Vec<String>;
}

/// The process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnv;

impl EnvProvider for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn names(&self) -> Vec<String> {
        std::env::vars_os()
            .filter_map(|(k, _)| k.into_string().ok())
            .collect()
    }
}

/// A fixed set of variables, for tests and sandboxed shells.
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvProvider for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.vars.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_env_lookup() {
        let env = MapEnv::new().with("HOME", "/home/me");
        assert_eq!(env.var("HOME").as_deref(), Some("/home/me"));
        assert_eq!(env.var("SHELL"), None);
        assert_eq!(env.names(), vec!["HOME".to_string()]);
    }

    #[test]
    fn map_env_from_iter() {
        let env: MapEnv = [("A", "1"), ("B", "2")].into_iter().collect();
        assert_eq!(env.var("B").as_deref(), Some("2"));
    }

    #[test]
    fn system_env_sees_path() {
        assert!(SystemEnv.var("PATH").is_some());
        assert!(SystemEnv.names().iter().any(|n| n == "PATH"));
    }
}
