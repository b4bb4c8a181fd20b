//! shellkit: the building blocks of an embeddable interactive shell.
//!
//! Input lines are split by a quote- and escape-aware parser that tracks the
//! cursor, `export NAME=VALUE` statements feed a variable table whose
//! `$NAME` / `${NAME}` references expand on lookup, and completion offers
//! unambiguous command and option suggestions plus variable-name candidates.
//! A [`Shell`](shell::Shell) ties these together and dispatches lines to
//! commands from a [`CommandRegistry`](registry::CommandRegistry).
//!
//! # Architecture
//!
//! - **[`parse`]**: line parser, parsed line/word types, incremental iterator.
//! - **[`export`]**: variable table, expansion, environment fallback, export file.
//! - **[`registry`]**: command descriptions and the registry contract.
//! - **[`complete`]**: inline suggestions and export completion.
//! - **[`shell`]**: dispatch, option parsing, built-ins, buffer and history.
//! - **[`config`]**: embedded defaults plus user overlay.
//! - **[`logging`]**: file logging to `~/.local/share/shellkit/shellkit.log`.

/// Inline suggestions and tab completion.
pub mod complete;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Error types.
pub mod error;
/// Exported variables: table, expansion and persistence.
pub mod export;
/// File-based logging.
pub mod logging;
/// Line parsing: parser, parsed line types and iterator.
pub mod parse;
/// Commands and the registry contract.
pub mod registry;
/// Line dispatch, option parsing, built-ins, buffer and history.
pub mod shell;

use std::sync::Arc;

use error::ShellError;
use export::ExportManager;
use registry::MapRegistry;
use shell::Shell;

/// Build a shell with the built-in commands from `config`, loading the
/// configured export file unless `[export] enabled` is off.
pub fn build_shell(config: &config::Config) -> Result<Shell, ShellError> {
    let exports = if config.export.enabled {
        ExportManager::from_settings(&config.export)
    } else {
        ExportManager::new()
    };
    let exports = Arc::new(exports);
    Shell::with_builtins(config, MapRegistry::new(), exports)
}

/// A shell over the default config with no environment fallback and no
/// export file.
///
/// This is the main entry point for tests and simple embedding.
pub fn ephemeral_shell() -> Shell {
    let config = config::Config::default_config();
    Shell::new(&config, Arc::new(builtin_registry()), Arc::new(ExportManager::new()))
}

fn builtin_registry() -> MapRegistry {
    let mut registry = MapRegistry::new();
    for command in shell::builtins::all() {
        // names are distinct, registration cannot fail
        let _ = registry.register(command);
    }
    registry
}
