//! Option parsing for a dispatched command.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::ShellError;
use crate::export::ExportManager;
use crate::parse::ParsedLineIterator;
use crate::registry::{Command, CommandRegistry};

/// Options and positional arguments recognised on a command line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedOptions {
    pub values: HashMap<String, String>,
    pub flags: HashSet<String>,
    pub arguments: Vec<String>,
}

impl ParsedOptions {
    /// Apply `f` to every option value and argument.
    pub fn map_text(&mut self, f: impl Fn(&str) -> String) {
        for value in self.values.values_mut() {
            *value = f(value);
        }
        for arg in &mut self.arguments {
            *arg = f(arg);
        }
    }
}

/// Consume the words left in `it` as options of `command`.
///
/// Accepts `--name=value`, `--name value`, `--flag`, `-x`, `-xvalue`,
/// `-x value` and clustered short flags (`-la`). `--` ends option
/// parsing; a lone `-` is an argument. Options may appear anywhere among
/// the arguments.
pub fn parse_options(
    command: &Command,
    path: &str,
    it: &mut ParsedLineIterator<'_>,
) -> Result<ParsedOptions, ShellError> {
    let mut parsed = ParsedOptions::default();
    let mut only_arguments = false;

    while let Some(word) = it.poll_word() {
        if only_arguments || word == "-" || !word.starts_with('-') {
            parsed.arguments.push(word.to_string());
        } else if word == "--" {
            only_arguments = true;
        } else if let Some(long) = word.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            let spec = command
                .option(name)
                .ok_or_else(|| unknown(path, word))?;
            match (spec.takes_value, inline) {
                (true, Some(value)) => {
                    parsed.values.insert(spec.name.clone(), value.to_string());
                }
                (true, None) => {
                    let value = it.poll_word().ok_or_else(|| missing_value(path, &spec.name))?;
                    parsed.values.insert(spec.name.clone(), value.to_string());
                }
                (false, None) => {
                    parsed.flags.insert(spec.name.clone());
                }
                (false, Some(_)) => return Err(unknown(path, word)),
            }
        } else {
            parse_short(command, path, &word[1..], it, &mut parsed)?;
        }
    }

    for spec in command.options() {
        if parsed.values.contains_key(&spec.name) || parsed.flags.contains(&spec.name) {
            continue;
        }
        if let Some(default) = &spec.default_value {
            parsed.values.insert(spec.name.clone(), default.clone());
        } else if spec.required {
            return Err(ShellError::MissingRequired {
                command: path.to_string(),
                option: spec.name.clone(),
            });
        }
    }

    log::debug!(
        "{path}: {} value(s), {} flag(s), {} argument(s)",
        parsed.values.len(),
        parsed.flags.len(),
        parsed.arguments.len()
    );
    Ok(parsed)
}

fn parse_short(
    command: &Command,
    path: &str,
    cluster: &str,
    it: &mut ParsedLineIterator<'_>,
    parsed: &mut ParsedOptions,
) -> Result<(), ShellError> {
    for (i, c) in cluster.char_indices() {
        let spec = command
            .option_by_short(c)
            .ok_or_else(|| unknown(path, &format!("-{c}")))?;
        if !spec.takes_value {
            parsed.flags.insert(spec.name.clone());
            continue;
        }
        // the rest of the cluster is the value: `-mhello`
        let rest = &cluster[i + c.len_utf8()..];
        let value = if rest.is_empty() {
            it.poll_word()
                .ok_or_else(|| missing_value(path, &spec.name))?
                .to_string()
        } else {
            rest.to_string()
        };
        parsed.values.insert(spec.name.clone(), value);
        return Ok(());
    }
    Ok(())
}

fn unknown(path: &str, option: &str) -> ShellError {
    ShellError::UnknownOption {
        command: path.to_string(),
        option: option.to_string(),
    }
}

fn missing_value(path: &str, option: &str) -> ShellError {
    ShellError::MissingValue {
        command: path.to_string(),
        option: option.to_string(),
    }
}

/// Everything a handler gets to see about the line that invoked it.
pub struct Invocation<'a> {
    path: String,
    line: &'a str,
    options: ParsedOptions,
    exports: &'a ExportManager,
    registry: Option<&'a dyn CommandRegistry>,
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("path", &self.path)
            .field("line", &self.line)
            .field("options", &self.options)
            .field("has_registry", &self.registry.is_some())
            .finish()
    }
}

impl<'a> Invocation<'a> {
    pub fn new(
        path: impl Into<String>,
        line: &'a str,
        options: ParsedOptions,
        exports: &'a ExportManager,
    ) -> Self {
        Self {
            path: path.into(),
            line,
            options,
            exports,
            registry: None,
        }
    }

    /// Give the handler read access to the registry it was dispatched from.
    pub fn with_registry(mut self, registry: &'a dyn CommandRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// The command name, followed by the sub-command for group commands.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw input line, before expansion.
    pub fn line(&self) -> &'a str {
        self.line
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.options.flags.contains(name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.options.values.get(name).map(String::as_str)
    }

    pub fn arguments(&self) -> &[String] {
        &self.options.arguments
    }

    pub fn exports(&self) -> &'a ExportManager {
        self.exports
    }

    pub fn registry(&self) -> Option<&'a dyn CommandRegistry> {
        self.registry
    }
}
