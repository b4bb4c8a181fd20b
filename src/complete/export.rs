//! Tab completion for `export` lines and `$NAME` references.

use std::sync::Arc;

use crate::export::ExportManager;
use crate::parse::ParsedLine;

const EXPORT: &str = "export";

/// Replace the buffer text between `offset` and the cursor with one of the
/// `candidates`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteOperation {
    /// Character offset in the buffer where the replaced text starts.
    pub offset: usize,
    pub candidates: Vec<String>,
}

impl CompleteOperation {
    pub fn new(offset: usize, candidates: Vec<String>) -> Self {
        Self { offset, candidates }
    }

    /// The candidate, when there is exactly one.
    pub fn single(&self) -> Option<&str> {
        match self.candidates.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Longest prefix shared by every candidate.
    pub fn common_prefix(&self) -> String {
        let Some((first, rest)) = self.candidates.split_first() else {
            return String::new();
        };
        let mut len = first.len();
        for c in rest {
            len = first
                .char_indices()
                .zip(c.chars())
                .take_while(|((_, a), b)| a == b)
                .last()
                .map_or(0, |((i, a), _)| i + a.len_utf8())
                .min(len);
        }
        first[..len].to_string()
    }
}

/// Completes the `export` command name, the variable names it assigns, and
/// `$NAME` / `${NAME` references anywhere on the line.
pub struct ExportCompletion {
    exports: Arc<ExportManager>,
}

impl ExportCompletion {
    pub fn new(exports: Arc<ExportManager>) -> Self {
        Self { exports }
    }

    pub fn complete(&self, line: &ParsedLine) -> Option<CompleteOperation> {
        let is_export = line.first_word().is_some_and(|w| w.text == EXPORT);
        let word = line.selected_word();
        let to_cursor = line.selected_word_to_cursor();

        if line.cursor_word() == Some(0)
            && let (Some(word), Some(typed)) = (word, to_cursor.as_deref())
        {
            if typed.contains('$') {
                return self.complete_reference(line, typed);
            }
            if !typed.is_empty() && EXPORT.starts_with(typed) {
                return Some(CompleteOperation::new(
                    word.line_index,
                    vec![format!("{EXPORT} ")],
                ));
            }
            return None;
        }

        match (word, to_cursor.as_deref()) {
            (Some(_), Some(typed)) if typed.contains('$') => {
                self.complete_reference(line, typed)
            }
            (Some(word), Some(typed)) if is_export && !typed.contains('=') => {
                let candidates: Vec<String> = self
                    .exports
                    .names_with_equals()
                    .into_iter()
                    .filter(|n| n.starts_with(typed))
                    .collect();
                non_empty(word.line_index, candidates)
            }
            (None, _) if is_export && line.space_at_end() => {
                non_empty(line.cursor(), self.exports.names_with_equals())
            }
            _ => None,
        }
    }

    /// Candidates for the reference left of the cursor. The offset is
    /// counted back from the cursor: the word text before `$` may have lost
    /// escapes and quotes, the reference itself cannot have.
    fn complete_reference(&self, line: &ParsedLine, typed: &str) -> Option<CompleteOperation> {
        let dollar = typed.rfind('$')?;
        let offset = line.cursor().checked_sub(typed[dollar..].chars().count())?;
        non_empty(offset, self.exports.find_all_matching_keys(typed))
    }
}

fn non_empty(offset: usize, candidates: Vec<String>) -> Option<CompleteOperation> {
    (!candidates.is_empty()).then(|| CompleteOperation::new(offset, candidates))
}
