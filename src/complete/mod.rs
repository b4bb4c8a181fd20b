//! Completion: inline suggestions for commands and options, and tab
//! completion for exported variables.

/// `export` and `$NAME` completion.
pub mod export;
/// Unambiguous command, sub-command and option suggestions.
pub mod suggest;

pub use export::{CompleteOperation, ExportCompletion};
pub use suggest::CommandSuggestionProvider;
