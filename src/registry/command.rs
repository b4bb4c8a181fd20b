//! Command descriptions: name, options, sub-commands and handler.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use crate::error::ShellError;
use crate::shell::options::Invocation;

/// What a handler reports back to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Non-zero exit status.
    Failure(i32),
}

/// Trait for command handlers.
///
/// Handlers receive the parsed invocation and write their output to `out`.
pub trait CommandHandler: Send + Sync {
    fn execute(
        &self,
        invocation: &Invocation<'_>,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, ShellError>;
}

struct FnHandler<F>(F);

impl<F> CommandHandler for FnHandler<F>
where
    F: Fn(&Invocation<'_>, &mut dyn Write) -> Result<CommandOutcome, ShellError> + Send + Sync,
{
    fn execute(
        &self,
        invocation: &Invocation<'_>,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, ShellError> {
        (self.0)(invocation, out)
    }
}

/// Decides from the current buffer whether a command is offered.
pub type Activator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A long option (`--name`), optionally with a short alias (`-n`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: String,
    pub short: Option<char>,
    pub description: String,
    /// Whether the option consumes a value (`--name=value` / `--name value`).
    pub takes_value: bool,
    pub required: bool,
    pub default_value: Option<String>,
}

impl OptionSpec {
    /// A boolean flag.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short: None,
            description: String::new(),
            takes_value: false,
            required: false,
            default_value: None,
        }
    }

    /// An option taking a value.
    pub fn value(name: impl Into<String>) -> Self {
        Self {
            takes_value: true,
            ..Self::flag(name)
        }
    }

    pub fn short(mut self, c: char) -> Self {
        self.short = Some(c);
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// A registered command. Group commands carry `children`, each with its
/// own option set.
pub struct Command {
    name: String,
    description: String,
    options: Vec<OptionSpec>,
    children: Vec<Arc<Command>>,
    activator: Option<Activator>,
    handler: Option<Arc<dyn CommandHandler>>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("children", &self.children)
            .field("has_activator", &self.activator.is_some())
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl Command {
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            name: name.into(),
            description: String::new(),
            options: Vec::new(),
            children: Vec::new(),
            activator: None,
            handler: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    pub fn children(&self) -> &[Arc<Command>] {
        &self.children
    }

    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn child(&self, name: &str) -> Option<&Arc<Command>> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn option(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.name == name)
    }

    pub fn option_by_short(&self, short: char) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.short == Some(short))
    }

    /// Whether the command should be offered for `buffer`.
    pub fn is_active(&self, buffer: &str) -> bool {
        self.activator.as_ref().is_none_or(|a| a(buffer))
    }

    pub fn handler(&self) -> Option<&Arc<dyn CommandHandler>> {
        self.handler.as_ref()
    }
}

pub struct CommandBuilder {
    name: String,
    description: String,
    options: Vec<OptionSpec>,
    children: Vec<Arc<Command>>,
    activator: Option<Activator>,
    handler: Option<Arc<dyn CommandHandler>>,
}

impl CommandBuilder {
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    /// Add a sub-command, making this a group command.
    pub fn child(mut self, command: Command) -> Self {
        self.children.push(Arc::new(command));
        self
    }

    pub fn activator(mut self, activator: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.activator = Some(Arc::new(activator));
        self
    }

    pub fn handler(mut self, handler: impl CommandHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn handler_fn<F>(self, f: F) -> Self
    where
        F: Fn(&Invocation<'_>, &mut dyn Write) -> Result<CommandOutcome, ShellError>
            + Send
            + Sync
            + 'static,
    {
        self.handler(FnHandler(f))
    }

    pub fn build(self) -> Command {
        Command {
            name: self.name,
            description: self.description,
            options: self.options,
            children: self.children,
            activator: self.activator,
            handler: self.handler,
        }
    }
}
