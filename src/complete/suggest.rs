//! Inline suggestions: the text to append to the buffer when exactly one
//! command, sub-command or option matches what has been typed.

use std::sync::Arc;

use crate::parse::{ParsedWord, parse_line};
use crate::registry::{Command, CommandRegistry};

/// Suggests completions for command names, sub-commands and long options.
///
/// Only unambiguous matches produce a suggestion; two or more candidates
/// produce nothing rather than a common prefix. Registry errors never
/// escape: they are logged and treated as "no suggestion".
pub struct CommandSuggestionProvider {
    registry: Arc<dyn CommandRegistry>,
}

impl CommandSuggestionProvider {
    pub fn new(registry: Arc<dyn CommandRegistry>) -> Self {
        Self { registry }
    }

    /// The suffix to append to `buffer`, if exactly one candidate matches.
    pub fn suggest(&self, buffer: &str) -> Option<String> {
        let line = parse_line(buffer, buffer.chars().count());
        let words = line.words();
        let trailing_space = line.space_at_end();

        if !trailing_space
            && let Some(last) = words.last()
            && last.text.starts_with("--")
        {
            return self.suggest_option(buffer, words, &last.text);
        }
        if words.len() > 1 || (words.len() == 1 && trailing_space) {
            return self.suggest_child(buffer, words, trailing_space);
        }
        let prefix = words.first()?.text.as_str();
        self.suggest_command(buffer, prefix)
    }

    fn lookup(&self, name: &str, buffer: &str) -> Option<Arc<Command>> {
        match self.registry.get_command(name, buffer) {
            Ok(command) => Some(command),
            Err(e) => {
                log::debug!("no suggestion for {buffer:?}: {e}");
                None
            }
        }
    }

    fn suggest_command(&self, buffer: &str, prefix: &str) -> Option<String> {
        let matches: Vec<String> = self
            .registry
            .all_command_names()
            .into_iter()
            .filter(|name| name.starts_with(prefix))
            .filter(|name| {
                self.lookup(name, buffer)
                    .is_some_and(|command| command.is_active(buffer))
            })
            .collect();
        match matches.as_slice() {
            [only] => Some(format!("{} ", &only[prefix.len()..])),
            _ => None,
        }
    }

    fn suggest_child(
        &self,
        buffer: &str,
        words: &[ParsedWord],
        trailing_space: bool,
    ) -> Option<String> {
        let (command, prefix) = match (words, trailing_space) {
            ([command], true) => (command, ""),
            ([command, sub], false) => (command, sub.text.as_str()),
            _ => return None,
        };
        let command = self.lookup(&command.text, buffer)?;
        if !command.is_group() {
            return None;
        }
        let matches: Vec<&str> = command
            .children()
            .iter()
            .map(|c| c.name())
            .filter(|name| name.starts_with(prefix))
            .collect();
        match matches.as_slice() {
            [only] => Some(format!("{} ", &only[prefix.len()..])),
            _ => None,
        }
    }

    fn suggest_option(&self, buffer: &str, words: &[ParsedWord], last: &str) -> Option<String> {
        let prefix = last.trim_start_matches('-');
        if prefix.contains('=') {
            return None;
        }
        let command = self.lookup(&words.first()?.text, buffer)?;

        // `group child --opt`: the child owns the options
        let target = match words.get(1) {
            Some(sub) if words.len() > 2 && command.is_group() && !sub.text.starts_with('-') => {
                command.child(&sub.text).cloned().unwrap_or(command)
            }
            _ => command,
        };

        let matches: Vec<_> = target
            .options()
            .iter()
            .filter(|o| o.name.starts_with(prefix))
            .collect();
        let [option] = matches.as_slice() else {
            return None;
        };
        let mut suffix = option.name[prefix.len()..].to_string();
        if option.takes_value {
            suffix.push('=');
        }
        (!suffix.is_empty()).then_some(suffix)
    }
}
