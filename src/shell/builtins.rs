//! Commands every shell gets unless disabled in `[commands]`.

use std::io::Write;

use crate::error::{ExportError, ShellError};
use crate::registry::{Command, CommandHandler, CommandOutcome, OptionSpec};

use super::options::Invocation;

pub const EXPORT: &str = "export";
pub const ECHO: &str = "echo";
pub const HELP: &str = "help";

const NAME_WIDTH: usize = 13;

/// `export` lists variables without arguments and assigns otherwise.
pub struct ExportCommand;

impl CommandHandler for ExportCommand {
    fn execute(
        &self,
        invocation: &Invocation<'_>,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, ShellError> {
        let exports = invocation.exports();
        if invocation.arguments().is_empty() {
            for line in exports.list_all_variables() {
                writeln!(out, "{line}")?;
            }
            return Ok(CommandOutcome::Success);
        }
        match exports.add_variable(invocation.line()) {
            Ok(()) => Ok(CommandOutcome::Success),
            Err(ExportError::Usage) => {
                writeln!(out, "{}", ExportError::Usage)?;
                Ok(CommandOutcome::Failure(1))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// `echo [-n] args...`
pub struct EchoCommand;

impl CommandHandler for EchoCommand {
    fn execute(
        &self,
        invocation: &Invocation<'_>,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, ShellError> {
        write!(out, "{}", invocation.arguments().join(" "))?;
        if !invocation.has_flag("no-newline") {
            writeln!(out)?;
        }
        Ok(CommandOutcome::Success)
    }
}

/// `help` lists commands; `help NAME [SUB]` describes one command.
pub struct HelpCommand;

impl CommandHandler for HelpCommand {
    fn execute(
        &self,
        invocation: &Invocation<'_>,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, ShellError> {
        let Some(registry) = invocation.registry() else {
            writeln!(out, "help: no commands available")?;
            return Ok(CommandOutcome::Failure(1));
        };
        let args = invocation.arguments();
        let Some(name) = args.first() else {
            for name in registry.all_command_names() {
                let description = registry
                    .get_command(&name, invocation.line())
                    .map(|c| c.description().to_string())
                    .unwrap_or_default();
                write_entry(out, &name, &description)?;
            }
            return Ok(CommandOutcome::Success);
        };

        let Ok(mut command) = registry.get_command(name, invocation.line()) else {
            writeln!(out, "help: no such command: {name}")?;
            return Ok(CommandOutcome::Failure(1));
        };
        let mut path = name.clone();
        for sub in &args[1..] {
            let Some(child) = command.child(sub).cloned() else {
                writeln!(out, "help: {path} has no sub-command {sub}")?;
                return Ok(CommandOutcome::Failure(1));
            };
            path = format!("{path} {sub}");
            command = child;
        }
        describe(out, &path, &command)?;
        Ok(CommandOutcome::Success)
    }
}

fn write_entry(out: &mut dyn Write, name: &str, description: &str) -> std::io::Result<()> {
    let line = format!("  {name:<width$} {description}", width = NAME_WIDTH);
    writeln!(out, "{}", line.trim_end())
}

fn describe(out: &mut dyn Write, path: &str, command: &Command) -> std::io::Result<()> {
    if command.description().is_empty() {
        writeln!(out, "{path}")?;
    } else {
        writeln!(out, "{path}: {}", command.description())?;
    }
    if !command.options().is_empty() {
        writeln!(out, "options:")?;
        for option in command.options() {
            write_entry(out, &option_usage(option), &option_details(option))?;
        }
    }
    if command.is_group() {
        writeln!(out, "sub-commands:")?;
        for child in command.children() {
            write_entry(out, child.name(), child.description())?;
        }
    }
    Ok(())
}

fn option_usage(option: &OptionSpec) -> String {
    let mut usage = format!("--{}", option.name);
    if option.takes_value {
        usage.push_str("=VALUE");
    }
    if let Some(short) = option.short {
        usage = format!("-{short}, {usage}");
    }
    usage
}

fn option_details(option: &OptionSpec) -> String {
    let mut details = option.description.clone();
    if option.required {
        details.push_str(" (required)");
    }
    if let Some(default) = &option.default_value {
        details.push_str(&format!(" (default: {default})"));
    }
    details.trim_start().to_string()
}

pub fn export_command() -> Command {
    Command::builder(EXPORT)
        .description("Set or list exported variables")
        .handler(ExportCommand)
        .build()
}

pub fn echo_command() -> Command {
    Command::builder(ECHO)
        .description("Print arguments")
        .option(
            OptionSpec::flag("no-newline")
                .short('n')
                .description("Do not print a trailing newline"),
        )
        .handler(EchoCommand)
        .build()
}

pub fn help_command() -> Command {
    Command::builder(HELP)
        .description("List commands or describe one")
        .handler(HelpCommand)
        .build()
}

/// Every built-in, in registration order.
pub fn all() -> Vec<Command> {
    vec![export_command(), echo_command(), help_command()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportManager;
    use crate::parse::parse_line;
    use crate::registry::{CommandRegistry, MapRegistry};
    use crate::shell::options::parse_options;

    fn registry() -> MapRegistry {
        let mut registry = MapRegistry::new();
        for command in all() {
            registry.register(command).unwrap();
        }
        registry
            .register(
                Command::builder("remote")
                    .description("Manage remotes")
                    .child(
                        Command::builder("add")
                            .description("Add a remote")
                            .option(OptionSpec::value("name").short('n').required())
                            .option(OptionSpec::value("fetch").default_value("all"))
                            .build(),
                    )
                    .build(),
            )
            .unwrap();
        registry
    }

    fn run(command: &Command, line: &str, exports: &ExportManager) -> (CommandOutcome, String) {
        run_in(command, line, exports, None)
    }

    fn run_in(
        command: &Command,
        line: &str,
        exports: &ExportManager,
        registry: Option<&dyn CommandRegistry>,
    ) -> (CommandOutcome, String) {
        let parsed = parse_line(line, 0);
        let mut it = parsed.iter();
        it.poll_word();
        let options = parse_options(command, command.name(), &mut it).unwrap();
        let mut invocation = Invocation::new(command.name(), line, options, exports);
        if let Some(registry) = registry {
            invocation = invocation.with_registry(registry);
        }
        let mut out = Vec::new();
        let outcome = command
            .handler()
            .unwrap()
            .execute(&invocation, &mut out)
            .unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn export_assigns() {
        let exports = ExportManager::new();
        let (outcome, out) = run(&export_command(), "export FOO=bar", &exports);
        assert_eq!(outcome, CommandOutcome::Success);
        assert!(out.is_empty());
        assert_eq!(exports.get_value("FOO").as_deref(), Some("bar"));
    }

    #[test]
    fn export_lists() {
        let exports = ExportManager::new();
        exports.add_variable("export B=2").unwrap();
        exports.add_variable("export A=1").unwrap();
        let (_, out) = run(&export_command(), "export", &exports);
        assert_eq!(out, "export A=1\nexport B=2\n");
    }

    #[test]
    fn export_usage() {
        let exports = ExportManager::new();
        let (outcome, out) = run(&export_command(), "export FOO", &exports);
        assert_eq!(outcome, CommandOutcome::Failure(1));
        assert_eq!(out.trim_end(), crate::error::EXPORT_USAGE);
    }

    #[test]
    fn echo_joins_arguments() {
        let exports = ExportManager::new();
        let (_, out) = run(&echo_command(), "echo a  \"b c\"", &exports);
        assert_eq!(out, "a b c\n");
        let (_, out) = run(&echo_command(), "echo -n x", &exports);
        assert_eq!(out, "x");
    }

    #[test]
    fn help_lists_commands_with_descriptions() {
        let exports = ExportManager::new();
        let registry = registry();
        let (outcome, out) = run_in(&help_command(), "help", &exports, Some(&registry));
        assert_eq!(outcome, CommandOutcome::Success);
        assert_eq!(
            out,
            "  echo          Print arguments\n\
             \x20 export        Set or list exported variables\n\
             \x20 help          List commands or describe one\n\
             \x20 remote        Manage remotes\n"
        );
    }

    #[test]
    fn help_describes_options() {
        let exports = ExportManager::new();
        let registry = registry();
        let (_, out) = run_in(&help_command(), "help echo", &exports, Some(&registry));
        assert_eq!(
            out,
            "echo: Print arguments\noptions:\n  -n, --no-newline Do not print a trailing newline\n"
        );

        let (_, out) = run_in(&help_command(), "help remote add", &exports, Some(&registry));
        assert_eq!(
            out,
            "remote add: Add a remote\n\
             options:\n\
             \x20 -n, --name=VALUE (required)\n\
             \x20 --fetch=VALUE (default: all)\n"
        );
    }

    #[test]
    fn help_lists_sub_commands() {
        let exports = ExportManager::new();
        let registry = registry();
        let (_, out) = run_in(&help_command(), "help remote", &exports, Some(&registry));
        assert_eq!(out, "remote: Manage remotes\nsub-commands:\n  add           Add a remote\n");
    }

    #[test]
    fn help_unknown_command() {
        let exports = ExportManager::new();
        let registry = registry();
        let (outcome, out) = run_in(&help_command(), "help nope", &exports, Some(&registry));
        assert_eq!(outcome, CommandOutcome::Failure(1));
        assert_eq!(out, "help: no such command: nope\n");

        let (outcome, out) = run_in(&help_command(), "help echo x", &exports, Some(&registry));
        assert_eq!(outcome, CommandOutcome::Failure(1));
        assert_eq!(out, "help: echo has no sub-command x\n");
    }

    #[test]
    fn help_without_registry() {
        let exports = ExportManager::new();
        let (outcome, _) = run(&help_command(), "help", &exports);
        assert_eq!(outcome, CommandOutcome::Failure(1));
    }
}
