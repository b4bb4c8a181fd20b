//! Types produced by the line parser and consumed by completion and dispatch.

use super::iterator::ParsedLineIterator;

/// Quote or bracket state a word was left in when the input ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordStatus {
    #[default]
    Ok,
    /// `{` or `[` opened but not closed (bracket parsing only)
    OpenBracket,
    /// `'` opened but not closed
    OpenQuote,
    /// `"` (or `"""`) opened but not closed
    OpenDoubleQuote,
}

/// Quote state of the whole line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStatus {
    #[default]
    Ok,
    /// One kind of quote is still open; the reader should ask for more input.
    UnclosedQuote,
    /// Both a single and a double quote are still open.
    DoubleUnclosedQuote,
}

/// A single word recognised by the parser.
///
/// `text` holds the word content with quote delimiters and escape
/// backslashes consumed. `line_index` is the character offset of the first
/// content character in the original buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedWord {
    pub text: String,
    pub line_index: usize,
    pub status: WordStatus,
}

impl ParsedWord {
    pub fn new(text: impl Into<String>, line_index: usize) -> Self {
        Self {
            text: text.into(),
            line_index,
            status: WordStatus::Ok,
        }
    }

    pub fn with_status(mut self, status: WordStatus) -> Self {
        self.status = status;
        self
    }

    /// Length of the word content in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Character offset just past the word's content.
    pub fn end_index(&self) -> usize {
        self.line_index + self.len()
    }
}

/// A fully tokenized input buffer.
///
/// Words are ordered by ascending `line_index` and never overlap.
/// `cursor_word` is `None` when the cursor does not touch any word
/// (e.g. it sits after a separating space).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    text: String,
    words: Vec<ParsedWord>,
    cursor: usize,
    cursor_word: Option<usize>,
    word_cursor: usize,
    status: LineStatus,
    error_message: Option<String>,
}

impl ParsedLine {
    pub(crate) fn new(
        text: &str,
        words: Vec<ParsedWord>,
        cursor: usize,
        cursor_word: Option<usize>,
        word_cursor: usize,
        status: LineStatus,
        error_message: Option<String>,
    ) -> Self {
        Self {
            text: text.to_string(),
            words,
            cursor,
            cursor_word,
            word_cursor,
            status,
            error_message,
        }
    }

    /// The original, unmodified input.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn words(&self) -> &[ParsedWord] {
        &self.words
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_word(&self) -> Option<usize> {
        self.cursor_word
    }

    /// Offset of the cursor inside the cursor word.
    pub fn word_cursor(&self) -> usize {
        self.word_cursor
    }

    pub fn status(&self) -> LineStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn first_word(&self) -> Option<&ParsedWord> {
        self.words.first()
    }

    /// The word the cursor is inside or immediately after.
    pub fn selected_word(&self) -> Option<&ParsedWord> {
        self.cursor_word.and_then(|i| self.words.get(i))
    }

    /// The part of the cursor word that lies before the cursor.
    pub fn selected_word_to_cursor(&self) -> Option<String> {
        self.selected_word()
            .map(|w| w.text.chars().take(self.word_cursor).collect())
    }

    /// Input length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn cursor_at_end(&self) -> bool {
        self.cursor == self.char_len()
    }

    /// True when the input ends with an unquoted, unescaped separator.
    pub fn space_at_end(&self) -> bool {
        if !self.text.ends_with(' ') {
            return false;
        }
        match self.words.last() {
            Some(last) => last.end_index() < self.char_len() && self.status == LineStatus::Ok,
            None => true,
        }
    }

    /// Start an incremental walk over this line.
    pub fn iter(&self) -> ParsedLineIterator<'_> {
        ParsedLineIterator::new(self)
    }
}
