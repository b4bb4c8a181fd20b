use super::types::{ParsedLine, ParsedWord};
use crate::error::IteratorError;

/// Incremental walk over a [`ParsedLine`], word by word or char by char.
///
/// The two pointers stay synchronised: polling a word moves the char
/// pointer to the start of the following word, and walking chars past the
/// end of a word moves the word pointer on. Option parsers use this to
/// consume tokens without re-tokenizing while still reporting positions in
/// the original buffer.
#[derive(Debug, Clone)]
pub struct ParsedLineIterator<'a> {
    line: &'a ParsedLine,
    chars: Vec<char>,
    word: usize,
    character: usize,
}

impl<'a> ParsedLineIterator<'a> {
    pub fn new(line: &'a ParsedLine) -> Self {
        let chars: Vec<char> = line.text().chars().collect();
        let character = line.words().first().map_or(0, |w| w.line_index);
        Self {
            line,
            chars,
            word: 0,
            character,
        }
    }

    pub fn has_next_word(&self) -> bool {
        self.word < self.line.len()
    }

    pub fn has_next_char(&self) -> bool {
        self.character < self.chars.len()
    }

    /// The next word, advancing past it.
    pub fn poll_parsed_word(&mut self) -> Option<&'a ParsedWord> {
        let line = self.line;
        let word = line.words().get(self.word)?;
        self.word += 1;
        self.character = line
            .words()
            .get(self.word)
            .map_or(self.chars.len(), |next| next.line_index);
        Some(word)
    }

    pub fn peek_parsed_word(&self) -> Option<&'a ParsedWord> {
        let line = self.line;
        line.words().get(self.word)
    }

    pub fn poll_word(&mut self) -> Option<&'a str> {
        self.poll_parsed_word().map(|w| w.text.as_str())
    }

    pub fn peek_word(&self) -> Option<&'a str> {
        self.peek_parsed_word().map(|w| w.text.as_str())
    }

    /// The next char of the original text.
    pub fn poll_char(&mut self) -> Option<char> {
        let c = *self.chars.get(self.character)?;
        self.character += 1;
        self.skip_consumed_words();
        Some(c)
    }

    pub fn peek_char(&self) -> Option<char> {
        self.chars.get(self.character).copied()
    }

    /// Move the char pointer forward by `length` chars, clamped to the end of
    /// the text. Words that end at or before the new position are skipped.
    pub fn update_iterator_position(&mut self, length: usize) -> Result<(), IteratorError> {
        if length == 0 {
            return Err(IteratorError::InvalidLength(length));
        }
        self.character = (self.character + length).min(self.chars.len());
        self.skip_consumed_words();
        Ok(())
    }

    /// True when the next word to be polled is the one holding the cursor.
    pub fn is_next_word_cursor_word(&self) -> bool {
        self.line.cursor_word() == Some(self.word)
    }

    /// Both the word and the char pointer are exhausted.
    pub fn finished(&self) -> bool {
        !self.has_next_word() && !self.has_next_char()
    }

    /// The line being iterated.
    pub fn base_line(&self) -> &'a ParsedLine {
        self.line
    }

    /// Character offset of the char pointer in the original text.
    pub fn position(&self) -> usize {
        self.character
    }

    fn skip_consumed_words(&mut self) {
        let line = self.line;
        while let Some(w) = line.words().get(self.word) {
            if w.end_index() > self.character {
                break;
            }
            self.word += 1;
        }
    }
}
