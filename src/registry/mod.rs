//! The command registry: the narrow contract completion and dispatch rely on,
//! plus a map-backed implementation.

/// Command, option and handler types.
pub mod command;

pub use command::{
    Activator, Command, CommandBuilder, CommandHandler, CommandOutcome, OptionSpec,
};

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RegistryError;

/// Lookup interface for registered commands.
pub trait CommandRegistry: Send + Sync {
    /// Resolve `name`. `line` is the buffer the lookup happens for.
    fn get_command(&self, name: &str, line: &str) -> Result<Arc<Command>, RegistryError>;

    /// Every registered command name.
    fn all_command_names(&self) -> Vec<String>;
}

/// Registry of commands, keyed by command name.
#[derive(Debug, Default)]
pub struct MapRegistry {
    commands: HashMap<String, Arc<Command>>,
}

impl MapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. Names must be unique.
    pub fn register(&mut self, command: Command) -> Result<(), RegistryError> {
        if self.commands.contains_key(command.name()) {
            return Err(RegistryError::Duplicate(command.name().to_string()));
        }
        log::debug!("registered command {}", command.name());
        self.commands
            .insert(command.name().to_string(), Arc::new(command));
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<Command>> {
        self.commands.remove(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl CommandRegistry for MapRegistry {
    fn get_command(&self, name: &str, _line: &str) -> Result<Arc<Command>, RegistryError> {
        self.commands
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::CommandNotFound(name.to_string()))
    }

    fn all_command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut registry = MapRegistry::new();
        registry.register(Command::builder("ls").build()).unwrap();
        registry.register(Command::builder("cd").build()).unwrap();
        assert_eq!(registry.get_command("ls", "ls").unwrap().name(), "ls");
        assert_eq!(registry.all_command_names(), vec!["cd", "ls"]);
    }

    #[test]
    fn missing_command() {
        let registry = MapRegistry::new();
        assert_eq!(
            registry.get_command("nope", "nope").unwrap_err(),
            RegistryError::CommandNotFound("nope".into())
        );
    }

    #[test]
    fn duplicate_rejected() {
        let mut registry = MapRegistry::new();
        registry.register(Command::builder("ls").build()).unwrap();
        assert_eq!(
            registry.register(Command::builder("ls").build()).unwrap_err(),
            RegistryError::Duplicate("ls".into())
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_command() {
        let mut registry = MapRegistry::new();
        registry.register(Command::builder("ls").build()).unwrap();
        assert!(registry.remove("ls").is_some());
        assert!(registry.is_empty());
    }
}
