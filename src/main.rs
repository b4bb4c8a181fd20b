//! shellkit: a small interactive shell over the shellkit library.
//!
//! With no arguments, reads lines through a rustyline editor and dispatches
//! them to the built-in commands (`export`, `echo`, `help`). Tab completes
//! variable references and commands, the inline hint shows the unambiguous
//! suggestion, and history is kept in the configured history file. `exit` or
//! end of input quits, and exports are written back to the export file.
//!
//! Flags:
//!   --complete <buffer>  print the suggestion and completion for a buffer as JSON
//!   --dump-config        print the merged configuration as TOML
//!   --no-env             do not fall back to the process environment

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use shellkit::config::{Config, HistorySettings};
use shellkit::logging;
use shellkit::registry::CommandOutcome;
use shellkit::shell::{Feed, Shell};

const USAGE: &str = "usage: shellkit [--no-env] [--dump-config] [--complete <buffer>]";

/// Line-editor hooks backed by the shell's completion.
struct ShellHelper {
    shell: Rc<RefCell<Shell>>,
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(completion_pairs(&self.shell.borrow(), line, pos))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        hint_for(&self.shell.borrow(), line, pos)
    }
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

/// Byte offset of the `chars`-th character, or the end of `text`.
fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
}

/// Tab completion for `line` with the cursor at byte `pos`: variable
/// candidates first, then the inline suggestion when the cursor is at the
/// end. Returns the byte offset the candidates replace from.
fn completion_pairs(shell: &Shell, line: &str, pos: usize) -> (usize, Vec<Pair>) {
    let cursor = line[..pos].chars().count();
    if let Some(op) = shell.complete(line, cursor) {
        let pairs = op
            .candidates
            .iter()
            .map(|c| Pair {
                display: c.clone(),
                replacement: c.clone(),
            })
            .collect();
        return (byte_offset(line, op.offset), pairs);
    }
    if let Some(suffix) = hint_for(shell, line, pos) {
        let pair = Pair {
            display: suffix.clone(),
            replacement: suffix,
        };
        return (pos, vec![pair]);
    }
    (pos, Vec::new())
}

fn hint_for(shell: &Shell, line: &str, pos: usize) -> Option<String> {
    if pos < line.len() || shell.is_pending() {
        return None;
    }
    shell.suggest(line)
}

fn run_repl(shell: &Rc<RefCell<Shell>>, history: &HistorySettings) -> rustyline::Result<()> {
    let config = rustyline::Config::builder()
        .max_history_size(history.max_size)?
        .auto_add_history(false)
        .build();
    let mut editor: Editor<ShellHelper, DefaultHistory> = Editor::with_config(config)?;
    editor.set_helper(Some(ShellHelper {
        shell: Rc::clone(shell),
    }));

    let history_file = history.file_path();
    if let Some(path) = &history_file
        && path.exists()
        && let Err(e) = editor.load_history(path)
    {
        log::warn!("{}: {e}", path.display());
    }

    let mut stdout = std::io::stdout();
    loop {
        let prompt = shell.borrow().prompt().to_string();
        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                shell.borrow_mut().cancel_pending();
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e),
        };

        let mut sh = shell.borrow_mut();
        if !sh.is_pending() && line.trim() == "exit" {
            break;
        }
        let result = sh.feed(&line, &mut stdout);
        let _ = stdout.flush();
        match &result {
            Ok(Feed::Executed(CommandOutcome::Failure(code))) => {
                log::debug!("command exited with {code}");
            }
            Ok(_) => {}
            Err(e) => eprintln!("{e}"),
        }
        // multi-line commands are recalled whole
        if !matches!(result, Ok(Feed::Incomplete | Feed::Empty))
            && let Some(entry) = sh.history().last()
        {
            editor.add_history_entry(entry)?;
        }
    }
    if shell.borrow_mut().cancel_pending() {
        eprintln!("unterminated quote, input discarded");
    }

    if let Some(path) = &history_file {
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Err(e) = editor.save_history(path) {
            log::warn!("{}: {e}", path.display());
        }
    }
    Ok(())
}

fn print_completion(shell: &Shell, buffer: &str) {
    let cursor = buffer.chars().count();
    let suggestion = shell.suggest(buffer);
    let completion = shell.complete(buffer, cursor).map(|op| {
        serde_json::json!({
            "offset": op.offset,
            "candidates": op.candidates,
        })
    });
    let output = serde_json::json!({
        "buffer": buffer,
        "suggestion": suggestion,
        "completion": completion,
    });
    println!("{output}");
}

fn main() {
    let mut config = Config::load();
    let mut complete = None;
    let mut dump_config = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--no-env" => config.export.use_system_environment = false,
            "--dump-config" => dump_config = true,
            "--complete" => match args.next() {
                Some(buffer) => complete = Some(buffer),
                None => {
                    eprintln!("--complete requires a buffer\n{USAGE}");
                    std::process::exit(2);
                }
            },
            "-h" | "--help" => {
                println!("{USAGE}");
                return;
            }
            other => {
                eprintln!("unknown argument: {other}\n{USAGE}");
                std::process::exit(2);
            }
        }
    }

    if dump_config {
        match config.to_toml() {
            Ok(toml) => print!("{toml}"),
            Err(e) => {
                eprintln!("config serialization error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if let Some(path) = logging::default_log_path() {
        logging::init(config.log_level(), &path);
    }

    let shell = match shellkit::build_shell(&config) {
        Ok(shell) => shell,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if let Some(buffer) = complete {
        print_completion(&shell, &buffer);
        return;
    }

    let shell = Rc::new(RefCell::new(shell));
    if let Err(e) = run_repl(&shell, &config.history) {
        eprintln!("shellkit: {e}");
    }
    shell.borrow().persist();
}
