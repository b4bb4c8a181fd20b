//! Error types for every fallible shellkit operation.
//!
//! Unclosed quotes are not errors: they are reported through
//! [`LineStatus`](crate::parse::LineStatus) so an interactive reader can ask
//! for a continuation line instead.

use thiserror::Error;

/// Usage message returned for a malformed `export` statement.
pub const EXPORT_USAGE: &str = "export: usage: export [name[=value] ...]";

#[derive(Debug, Error)]
pub enum ExportError {
    /// The line did not match `export NAME=VALUE`.
    #[error("{}", EXPORT_USAGE)]
    Usage,
    #[error("export file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IteratorError {
    #[error("iterator position can only move forward (got length {0})")]
    InvalidLength(usize),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command not found: {0}")]
    CommandNotFound(String),
    #[error("command already registered: {0}")]
    Duplicate(String),
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Iterator(#[from] IteratorError),
    #[error("{command}: unknown option '{option}'")]
    UnknownOption { command: String, option: String },
    #[error("{command}: option '--{option}' requires a value")]
    MissingValue { command: String, option: String },
    #[error("{command}: missing required option '--{option}'")]
    MissingRequired { command: String, option: String },
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}
