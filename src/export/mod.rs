//! Exported variables: assignment, lookup, expansion and persistence.
//!
//! [`ExportManager`] owns a table of `NAME -> raw value` entries. Raw values
//! may reference other variables; references are resolved on lookup, not on
//! assignment, except for a variable referencing itself (`export
//! PATH=$PATH:/bin`), which is substituted with the previous value when the
//! assignment happens.

/// Environment fallback providers.
pub mod env;
/// `$NAME` / `${NAME}` reference parsing and recursive expansion.
pub mod expand;
/// Reading and writing the export file.
pub mod store;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use env::{EnvProvider, MapEnv, SystemEnv};
pub use expand::Expander;

use crate::config::ExportSettings;
use crate::error::ExportError;
use expand::{is_name_char, reference_at};

/// Called with `(name, stored_value)` after every successful assignment.
pub type ExportListener = Box<dyn Fn(&str, &str) + Send + Sync>;

pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Split `export NAME = VALUE` into its name and value.
///
/// VALUE is the first run of non-whitespace after `=`; anything after it is
/// ignored.
fn parse_export(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim_start().strip_prefix("export")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    let name_len = rest.find(|c: char| !is_name_char(c)).unwrap_or(rest.len());
    if name_len == 0 {
        return None;
    }
    let (name, rest) = rest.split_at(name_len);
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let value_len = rest.find(char::is_whitespace).unwrap_or(rest.len());
    if value_len == 0 {
        return None;
    }
    Some((name, &rest[..value_len]))
}

/// Replace references to `name` inside `value` with `current`, in one pass.
fn substitute_self(value: &str, name: &str, current: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last = 0;
    for (i, _) in value.match_indices('$') {
        if i < last {
            continue;
        }
        if let Some(r) = reference_at(value, i)
            && r.name == name
        {
            out.push_str(&value[last..i]);
            out.push_str(current);
            last = r.end;
        }
    }
    out.push_str(&value[last..]);
    out
}

pub struct ExportManager {
    variables: RwLock<BTreeMap<String, String>>,
    env: Option<Box<dyn EnvProvider>>,
    listener: Option<ExportListener>,
    max_depth: usize,
    file: Option<PathBuf>,
}

impl fmt::Debug for ExportManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportManager")
            .field("variables", &*self.read_vars())
            .field("env_fallback", &self.env.is_some())
            .field("max_depth", &self.max_depth)
            .field("file", &self.file)
            .finish()
    }
}

impl Default for ExportManager {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ExportManager {
    /// A manager with no environment fallback and no backing file.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ExportManagerBuilder {
        ExportManagerBuilder::default()
    }

    /// Build a manager from the `[export]` config section, loading the
    /// export file when it exists.
    pub fn from_settings(settings: &ExportSettings) -> Self {
        let mut builder = Self::builder().max_depth(settings.max_expansion_depth);
        if settings.use_system_environment {
            builder = builder.environment(SystemEnv);
        }
        if let Some(path) = settings.file_path() {
            builder = builder.file(path);
        }
        builder.build()
    }

    fn read_vars(&self) -> RwLockReadGuard<'_, BTreeMap<String, String>> {
        self.variables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_vars(&self) -> RwLockWriteGuard<'_, BTreeMap<String, String>> {
        self.variables.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.env.as_ref().and_then(|env| env.var(name))
    }

    /// Assign a variable from an `export NAME=VALUE` line.
    pub fn add_variable(&self, line: &str) -> Result<(), ExportError> {
        let Some((name, value)) = parse_export(line) else {
            return Err(ExportError::Usage);
        };

        let stored = {
            let mut vars = self.write_vars();
            let mut stored = value.to_string();
            if value.contains('$') {
                let current = vars
                    .get(name)
                    .cloned()
                    .or_else(|| self.env_var(name))
                    .unwrap_or_default();
                stored = substitute_self(value, name, &current);
            }
            vars.insert(name.to_string(), stored.clone());
            stored
        };

        log::debug!("export {name}={stored}");
        if let Some(listener) = &self.listener {
            listener(name, &stored);
        }
        Ok(())
    }

    /// Look up `key` and expand it.
    ///
    /// A key without `$` is a variable name: `None` if it is not defined
    /// anywhere. A key containing `$` is an expression and always expands.
    pub fn get_value(&self, key: &str) -> Option<String> {
        let vars = self.read_vars();
        let lookup = |name: &str| vars.get(name).cloned().or_else(|| self.env_var(name));
        if !key.contains('$') {
            let value = lookup(key)?;
            if !value.contains('$') {
                return Some(value);
            }
            return Some(Expander::new(lookup, self.max_depth).expand_variable(key, &value));
        }
        Some(Expander::new(lookup, self.max_depth).expand(key))
    }

    /// Expand every reference in `value`. Unresolved references are dropped.
    pub fn parse_value(&self, value: &str) -> String {
        let vars = self.read_vars();
        let lookup = |name: &str| vars.get(name).cloned().or_else(|| self.env_var(name));
        Expander::new(lookup, self.max_depth).expand(value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read_vars().contains_key(name) || self.env_var(name).is_some()
    }

    /// Every known name (exports and environment), sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self.read_vars().keys().cloned().collect();
        if let Some(env) = &self.env {
            names.extend(env.names());
        }
        names.into_iter().collect()
    }

    /// Every known name followed by `=`, for completing `export` arguments.
    pub fn names_with_equals(&self) -> Vec<String> {
        self.names().into_iter().map(|n| format!("{n}=")).collect()
    }

    /// Names matching the variable prefix at the end of `word`.
    ///
    /// When `word` holds a `$` the prefix is what follows the last one and
    /// the candidates keep the `$` (or `${ ... }`) form; otherwise `word` is a
    /// bare name prefix and the candidates are bare names.
    pub fn find_all_matching_keys(&self, word: &str) -> Vec<String> {
        let (prefix, open, close) = match word.rfind('$') {
            Some(i) => match word[i + 1..].strip_prefix('{') {
                Some(rest) => (rest, "${", "}"),
                None => (&word[i + 1..], "$", ""),
            },
            None => (word, "", ""),
        };
        self.names()
            .into_iter()
            .filter(|n| n.starts_with(prefix))
            .map(|n| format!("{open}{n}{close}"))
            .collect()
    }

    /// The explicit exports as `export NAME=VALUE` lines, sorted by name.
    pub fn list_all_variables(&self) -> Vec<String> {
        self.read_vars()
            .iter()
            .map(|(k, v)| format!("export {k}={v}"))
            .collect()
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Write the explicit exports to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ExportError> {
        let vars = self.read_vars();
        store::write_variables(path, vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Replay the `export` lines of `path`. Returns how many were applied.
    pub fn load_from(&self, path: &Path) -> Result<usize, ExportError> {
        let mut applied = 0;
        for line in store::read_export_lines(path)? {
            match self.add_variable(&line) {
                Ok(()) => applied += 1,
                Err(e) => log::warn!("{}: skipping {line:?}: {e}", path.display()),
            }
        }
        Ok(applied)
    }

    /// Save to the backing file, if any. Failures are logged; the in-memory
    /// table stays authoritative.
    pub fn persist(&self) {
        let Some(path) = &self.file else {
            return;
        };
        match self.save_to(path) {
            Ok(()) => log::debug!("persisted exports to {}", path.display()),
            Err(e) => log::warn!("could not persist exports: {e}"),
        }
    }
}

#[derive(Default)]
pub struct ExportManagerBuilder {
    env: Option<Box<dyn EnvProvider>>,
    listener: Option<ExportListener>,
    max_depth: Option<usize>,
    file: Option<PathBuf>,
}

impl ExportManagerBuilder {
    /// Fall back to `env` for names that were never exported.
    pub fn environment(mut self, env: impl EnvProvider + 'static) -> Self {
        self.env = Some(Box::new(env));
        self
    }

    pub fn listener(mut self, listener: impl Fn(&str, &str) + Send + Sync + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Backing file, loaded by `build` and written by `persist`.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn build(self) -> ExportManager {
        let manager = ExportManager {
            variables: RwLock::new(BTreeMap::new()),
            env: self.env,
            listener: self.listener,
            max_depth: self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
            file: self.file,
        };
        if let Some(path) = manager.file.as_deref()
            && path.exists()
        {
            match manager.load_from(path) {
                Ok(n) => log::debug!("loaded {n} export(s) from {}", path.display()),
                Err(e) => log::warn!("could not load exports: {e}"),
            }
        }
        manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn manager() -> ExportManager {
        ExportManager::new()
    }

    #[test]
    fn parse_export_grammar() {
        assert_eq!(parse_export("export FOO=bar"), Some(("FOO", "bar")));
        assert_eq!(parse_export("  export   FOO  =  bar  "), Some(("FOO", "bar")));
        assert_eq!(parse_export("export FOO=bar trailing junk"), Some(("FOO", "bar")));
        assert_eq!(parse_export("export FOO"), None);
        assert_eq!(parse_export("export FOO="), None);
        assert_eq!(parse_export("exportFOO=bar"), None);
        assert_eq!(parse_export("export =bar"), None);
        assert_eq!(parse_export("set FOO=bar"), None);
    }

    #[test]
    fn simple_value() {
        let m = manager();
        m.add_variable("export FOO=/opt").unwrap();
        assert_eq!(m.get_value("FOO").as_deref(), Some("/opt"));
    }

    #[test]
    fn usage_error() {
        let err = manager().add_variable("export").unwrap_err();
        assert!(matches!(err, ExportError::Usage));
        assert_eq!(err.to_string(), crate::error::EXPORT_USAGE);
    }

    #[test]
    fn missing_name_is_none() {
        assert_eq!(manager().get_value("NOPE"), None);
    }

    #[test]
    fn missing_reference_is_empty() {
        assert_eq!(manager().get_value("$UNDEFINED").as_deref(), Some(""));
    }

    #[test]
    fn self_reference_appends_once() {
        let m = manager();
        m.add_variable("export PATH=/usr").unwrap();
        m.add_variable("export PATH=$PATH:/bin").unwrap();
        m.add_variable("export PATH=$PATH:/bin").unwrap();
        assert_eq!(m.get_value("PATH").as_deref(), Some("/usr:/bin:/bin"));
    }

    #[test]
    fn self_reference_braced_and_bounded() {
        let m = manager();
        m.add_variable("export P=a").unwrap();
        m.add_variable("export P=${P}:$PX:$P").unwrap();
        assert_eq!(m.list_all_variables(), vec!["export P=a:$PX:a"]);
    }

    #[test]
    fn self_reference_without_previous_value() {
        let m = manager();
        m.add_variable("export NEW=$NEW:/x").unwrap();
        assert_eq!(m.get_value("NEW").as_deref(), Some(":/x"));
    }

    #[test]
    fn self_reference_falls_back_to_environment() {
        let m = ExportManager::builder()
            .environment(MapEnv::new().with("PATH", "/usr/bin"))
            .build();
        m.add_variable("export PATH=$PATH:/opt/bin").unwrap();
        assert_eq!(m.get_value("PATH").as_deref(), Some("/usr/bin:/opt/bin"));
    }

    #[test]
    fn chained_resolution() {
        let m = manager();
        m.add_variable("export FOO=/opt").unwrap();
        m.add_variable("export FOO2=$FOO").unwrap();
        m.add_variable("export TEST=/foo/bar").unwrap();
        assert_eq!(m.get_value("FOO2").as_deref(), Some("/opt"));
        assert_eq!(
            m.get_value("$FOO2:${TEST}").as_deref(),
            Some("/opt:/foo/bar")
        );
    }

    #[test]
    fn lookup_resolves_at_read_time() {
        let m = manager();
        m.add_variable("export A=$B/x").unwrap();
        m.add_variable("export B=/first").unwrap();
        assert_eq!(m.get_value("A").as_deref(), Some("/first/x"));
        m.add_variable("export B=/second").unwrap();
        assert_eq!(m.get_value("A").as_deref(), Some("/second/x"));
    }

    #[test]
    fn unresolved_in_expression_dropped() {
        let m = manager();
        m.add_variable("export FOO=foo").unwrap();
        assert_eq!(m.parse_value("$FOO3 bar $FOO").as_str(), " bar foo");
    }

    #[test]
    fn cycle_does_not_hang() {
        let m = ExportManager::builder().max_depth(8).build();
        m.add_variable("export A=$B").unwrap();
        m.add_variable("export B=$A").unwrap();
        let value = m.get_value("A").unwrap();
        assert!(value.starts_with('$'));
    }

    #[test]
    fn fan_out_cycle_returns_quickly() {
        let m = manager();
        m.add_variable("export A=$B$B").unwrap();
        m.add_variable("export B=$A$A").unwrap();
        assert_eq!(m.get_value("A").as_deref(), Some("$A$A$A$A"));
        assert_eq!(m.parse_value("[$B]"), "[$B$B$B$B]");
    }

    #[test]
    fn many_references_in_one_expression() {
        let m = manager();
        m.add_variable("export X=x").unwrap();
        let input = "a$X$MISSING".repeat(50_000);
        assert_eq!(m.parse_value(&input), "ax".repeat(50_000));
    }

    #[test]
    fn environment_fallback_and_precedence() {
        let m = ExportManager::builder()
            .environment(MapEnv::new().with("HOME", "/home/me").with("EDITOR", "vi"))
            .build();
        assert_eq!(m.get_value("HOME").as_deref(), Some("/home/me"));
        m.add_variable("export EDITOR=hx").unwrap();
        assert_eq!(m.get_value("EDITOR").as_deref(), Some("hx"));
        assert_eq!(m.get_value("$HOME/.config").as_deref(), Some("/home/me/.config"));
        assert!(m.contains("HOME"));
        assert_eq!(m.names(), vec!["EDITOR", "HOME"]);
    }

    #[test]
    fn no_environment_without_provider() {
        assert_eq!(manager().get_value("PATH"), None);
    }

    #[test]
    fn matching_keys() {
        let m = manager();
        m.add_variable("export FOO=1").unwrap();
        m.add_variable("export FOO2=2").unwrap();
        m.add_variable("export BAR=3").unwrap();
        assert_eq!(m.find_all_matching_keys("FO"), vec!["FOO", "FOO2"]);
        assert_eq!(m.find_all_matching_keys("$FO"), vec!["$FOO", "$FOO2"]);
        assert_eq!(m.find_all_matching_keys("x=$B"), vec!["$BAR"]);
        assert_eq!(m.find_all_matching_keys("${B"), vec!["${BAR}"]);
        assert_eq!(m.find_all_matching_keys("$").len(), 3);
        assert!(m.find_all_matching_keys("Z").is_empty());
    }

    #[test]
    fn names_with_equals_sorted() {
        let m = manager();
        m.add_variable("export B=1").unwrap();
        m.add_variable("export A=2").unwrap();
        assert_eq!(m.names_with_equals(), vec!["A=", "B="]);
    }

    #[test]
    fn listener_sees_stored_value() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let m = ExportManager::builder()
            .listener(move |name, value| {
                sink.lock().unwrap().push(format!("{name}={value}"));
            })
            .build();
        m.add_variable("export X=1").unwrap();
        m.add_variable("export X=$X:2").unwrap();
        let _ = m.add_variable("not an export");
        assert_eq!(*seen.lock().unwrap(), vec!["X=1", "X=1:2"]);
    }

    #[test]
    fn persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exports");
        {
            let m = ExportManager::builder().file(&path).build();
            m.add_variable("export FOO=/opt").unwrap();
            m.add_variable("export BAR=$FOO/bin").unwrap();
            m.persist();
        }
        let m = ExportManager::builder().file(&path).build();
        assert_eq!(m.get_value("BAR").as_deref(), Some("/opt/bin"));
        assert_eq!(
            m.list_all_variables(),
            vec!["export BAR=$FOO/bin", "export FOO=/opt"]
        );
    }

    #[test]
    fn persist_failure_keeps_memory_state() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be opened as a file
        let m = ExportManager::builder().file(dir.path()).build();
        m.add_variable("export FOO=1").unwrap();
        m.persist();
        assert_eq!(m.get_value("FOO").as_deref(), Some("1"));
    }

    #[test]
    fn concurrent_reads_during_writes() {
        let m = Arc::new(manager());
        m.add_variable("export N=0").unwrap();
        let reader = {
            let m = Arc::clone(&m);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    assert!(m.get_value("N").is_some());
                }
            })
        };
        for i in 0..200 {
            m.add_variable(&format!("export N={i}")).unwrap();
        }
        reader.join().unwrap();
        assert_eq!(m.get_value("N").as_deref(), Some("199"));
    }
}
