use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub parser: ParserSettings,
    #[serde(default)]
    pub commands: CommandSettings,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            log_level: default_log_level(),
        }
    }
}

fn default_prompt() -> String {
    "$ ".into()
}

fn default_log_level() -> String {
    "warn".into()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ExportSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Export file; `~` is expanded. Empty disables persistence.
    #[serde(default)]
    pub file: String,
    /// Fall back to the process environment for names never exported.
    #[serde(default = "default_true")]
    pub use_system_environment: bool,
    #[serde(default = "default_max_depth")]
    pub max_expansion_depth: usize,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            file: String::new(),
            use_system_environment: true,
            max_expansion_depth: default_max_depth(),
        }
    }
}

impl ExportSettings {
    /// The export file with `~` expanded, if persistence is configured.
    pub fn file_path(&self) -> Option<PathBuf> {
        expand_path(&self.file)
    }
}

fn expand_path(path: &str) -> Option<PathBuf> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    Some(PathBuf::from(shellexpand::tilde(path).as_ref()))
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> usize {
    crate::export::DEFAULT_MAX_DEPTH
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HistorySettings {
    #[serde(default = "default_history_size")]
    pub max_size: usize,
    /// History file for the interactive binary; `~` is expanded. Empty
    /// keeps history in memory only.
    #[serde(default)]
    pub file: String,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_size: default_history_size(),
            file: String::new(),
        }
    }
}

impl HistorySettings {
    pub fn file_path(&self) -> Option<PathBuf> {
        expand_path(&self.file)
    }
}

fn default_history_size() -> usize {
    500
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ParserSettings {
    /// Keep `{...}` / `[...]` spans together as one word.
    #[serde(default)]
    pub parse_brackets: bool,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct CommandSettings {
    /// Built-in commands that are not registered.
    #[serde(default)]
    pub disabled: Vec<String>,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    export: ExportOverlay,
    #[serde(default)]
    history: HistoryOverlay,
    #[serde(default)]
    parser: ParserOverlay,
    #[serde(default)]
    commands: CommandsOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    prompt: Option<String>,
    log_level: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ExportOverlay {
    enabled: Option<bool>,
    file: Option<String>,
    use_system_environment: Option<bool>,
    max_expansion_depth: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct HistoryOverlay {
    max_size: Option<usize>,
    file: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ParserOverlay {
    parse_brackets: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct CommandsOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    disabled: Vec<String>,
    #[serde(default)]
    remove_disabled: Vec<String>,
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

fn merge_scalar<T>(base: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *base = v;
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/shellkit/config.toml (if exists)
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config
    }

    /// Try to load user overlay from ~/.config/shellkit/config.toml.
    fn load_overlay() -> Option<ConfigOverlay> {
        let path = PathBuf::from(shellexpand::tilde("~/.config/shellkit/config.toml").as_ref());
        let content = std::fs::read_to_string(&path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                log::warn!("{}: config parse error: {e}", path.display());
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let s = overlay.settings;
        merge_scalar(&mut self.settings.prompt, s.prompt);
        merge_scalar(&mut self.settings.log_level, s.log_level);

        let e = overlay.export;
        merge_scalar(&mut self.export.enabled, e.enabled);
        merge_scalar(&mut self.export.file, e.file);
        merge_scalar(
            &mut self.export.use_system_environment,
            e.use_system_environment,
        );
        merge_scalar(&mut self.export.max_expansion_depth, e.max_expansion_depth);

        merge_scalar(&mut self.history.max_size, overlay.history.max_size);
        merge_scalar(&mut self.history.file, overlay.history.file);
        merge_scalar(&mut self.parser.parse_brackets, overlay.parser.parse_brackets);

        let c = overlay.commands;
        merge_list(
            &mut self.commands.disabled,
            c.disabled,
            &c.remove_disabled,
            c.replace,
        );
    }

    /// The configured log level, falling back to `warn` on unknown names.
    pub fn log_level(&self) -> log::LevelFilter {
        self.settings
            .log_level
            .parse()
            .unwrap_or(log::LevelFilter::Warn)
    }

    /// Serialize the merged configuration (for `--dump-config`).
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
