//! Line dispatch: the glue between the parser, the registry, the export
//! table and completion.

/// `export`, `echo` and `help`.
pub mod builtins;
/// Editable input line.
pub mod buffer;
/// Bounded command history.
pub mod history;
/// Option parsing and the handler-facing invocation.
pub mod options;

pub use buffer::Buffer;
pub use history::History;
pub use options::{Invocation, ParsedOptions};

use std::io::Write;
use std::sync::Arc;

use crate::complete::{CommandSuggestionProvider, CompleteOperation, ExportCompletion};
use crate::config::Config;
use crate::error::ShellError;
use crate::export::ExportManager;
use crate::logging;
use crate::parse::{LineParser, LineStatus, ParsedLine};
use crate::registry::{CommandOutcome, CommandRegistry, MapRegistry};

const CONTINUATION_PROMPT: &str = "> ";

/// Result of feeding one input line to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// Nothing but whitespace.
    Empty,
    /// A quote is still open; the next line continues this one.
    Incomplete,
    Executed(CommandOutcome),
}

pub struct Shell {
    registry: Arc<dyn CommandRegistry>,
    exports: Arc<ExportManager>,
    parser: LineParser,
    suggestions: CommandSuggestionProvider,
    export_completion: Option<ExportCompletion>,
    history: History,
    pending: Option<String>,
    prompt: String,
}

impl Shell {
    pub fn new(
        config: &Config,
        registry: Arc<dyn CommandRegistry>,
        exports: Arc<ExportManager>,
    ) -> Self {
        let export_completion = config
            .export
            .enabled
            .then(|| ExportCompletion::new(Arc::clone(&exports)));
        Self {
            suggestions: CommandSuggestionProvider::new(Arc::clone(&registry)),
            registry,
            exports,
            parser: LineParser::new().parse_brackets(config.parser.parse_brackets),
            export_completion,
            history: History::new(config.history.max_size),
            pending: None,
            prompt: config.settings.prompt.clone(),
        }
    }

    /// Register the built-in commands into `registry`, skipping the ones
    /// listed in `[commands] disabled`, and build a shell over it.
    pub fn with_builtins(
        config: &Config,
        mut registry: MapRegistry,
        exports: Arc<ExportManager>,
    ) -> Result<Self, ShellError> {
        for command in builtins::all() {
            let disabled = config.commands.disabled.iter().any(|d| d == command.name())
                || (command.name() == builtins::EXPORT && !config.export.enabled);
            if disabled {
                log::debug!("builtin {} disabled", command.name());
                continue;
            }
            registry.register(command)?;
        }
        Ok(Self::new(config, Arc::new(registry), exports))
    }

    /// The prompt to show before reading the next line.
    pub fn prompt(&self) -> &str {
        match self.pending {
            Some(_) => CONTINUATION_PROMPT,
            None => &self.prompt,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn exports(&self) -> &Arc<ExportManager> {
        &self.exports
    }

    /// Feed one input line. Output of the executed command goes to `out`.
    pub fn feed(&mut self, line: &str, out: &mut dyn Write) -> Result<Feed, ShellError> {
        let text = match self.pending.take() {
            Some(pending) => format!("{pending}\n{line}"),
            None => line.to_string(),
        };
        let parsed = self.parser.parse(&text, text.chars().count());
        if parsed.status() != LineStatus::Ok {
            log::debug!("waiting for more input: {:?}", parsed.error_message());
            self.pending = Some(text);
            return Ok(Feed::Incomplete);
        }
        if parsed.is_empty() {
            return Ok(Feed::Empty);
        }

        self.history.push(&text);
        let result = self.dispatch(&parsed, out);
        let outcome = match &result {
            Ok(CommandOutcome::Success) => "ok".to_string(),
            Ok(CommandOutcome::Failure(code)) => format!("exit {code}"),
            Err(e) => format!("error: {e}"),
        };
        logging::log_command(&text, &outcome);
        result.map(Feed::Executed)
    }

    /// True while a quoted span is waiting for its continuation line.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop a half-entered multi-line command.
    pub fn cancel_pending(&mut self) -> bool {
        self.pending.take().is_some()
    }

    fn dispatch(
        &self,
        line: &ParsedLine,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, ShellError> {
        let mut it = line.iter();
        let Some(name) = it.poll_word() else {
            return Ok(CommandOutcome::Success);
        };
        let mut command = self.registry.get_command(name, line.text())?;
        let mut path = name.to_string();

        if command.is_group()
            && let Some(child) = it.peek_word().and_then(|w| command.child(w)).cloned()
        {
            it.poll_word();
            path = format!("{path} {}", child.name());
            command = child;
        }

        let mut options = options::parse_options(&command, &path, &mut it)?;
        // `export` stores raw values; references resolve on lookup
        if name != builtins::EXPORT {
            options.map_text(|text| {
                if text.contains('$') {
                    self.exports.parse_value(text)
                } else {
                    text.to_string()
                }
            });
        }

        let Some(handler) = command.handler() else {
            if command.is_group() {
                let children: Vec<&str> = command.children().iter().map(|c| c.name()).collect();
                writeln!(out, "{path}: expected one of: {}", children.join(", "))?;
                return Ok(CommandOutcome::Failure(1));
            }
            log::debug!("{path}: no handler");
            return Ok(CommandOutcome::Success);
        };
        log::debug!("dispatching {path}");
        let invocation = Invocation::new(path, line.text(), options, &self.exports)
            .with_registry(&*self.registry);
        handler.execute(&invocation, out)
    }

    /// Inline suggestion for `buffer`.
    pub fn suggest(&self, buffer: &str) -> Option<String> {
        self.suggestions.suggest(buffer)
    }

    /// Tab completion at `cursor` (a character offset).
    pub fn complete(&self, buffer: &str, cursor: usize) -> Option<CompleteOperation> {
        let completion = self.export_completion.as_ref()?;
        completion.complete(&self.parser.parse(buffer, cursor))
    }

    /// Complete `buffer` in place: tab completion first, then the inline
    /// suggestion when the cursor is at the end.
    pub fn complete_buffer(&self, buffer: &mut Buffer) -> bool {
        let text = buffer.text();
        if let Some(op) = self.complete(&text, buffer.cursor())
            && buffer.apply(&op)
        {
            return true;
        }
        if buffer.cursor() == buffer.len()
            && let Some(suggestion) = self.suggest(&text)
        {
            buffer.append_suggestion(&suggestion);
            return true;
        }
        false
    }

    /// Write exports to the configured file.
    pub fn persist(&self) {
        self.exports.persist();
    }
}
