use super::types::{LineStatus, ParsedLine, ParsedWord, WordStatus};

/// Quote- and escape-aware tokenizer for an interactive input buffer.
///
/// Besides splitting words it records which word the cursor touches and
/// where inside that word it sits, which completion needs to compute
/// replacement offsets.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineParser {
    parse_brackets: bool,
}

/// Tokenize `text` with default parser settings.
pub fn parse_line(text: &str, cursor: usize) -> ParsedLine {
    LineParser::new().parse(text, cursor)
}

impl LineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `{...}` and `[...]` as single words, spaces and quotes included.
    pub fn parse_brackets(mut self, enabled: bool) -> Self {
        self.parse_brackets = enabled;
        self
    }

    /// Split `text` into words. `cursor` is a character offset into `text`.
    pub fn parse(&self, text: &str, cursor: usize) -> ParsedLine {
        let len = text.chars().count();
        let cursor = cursor.min(len);
        let mut scan = Scanner::default();
        let mut cursor_word = None;
        let mut word_cursor = 0;
        // true when the previous char was an unquoted, unescaped space
        let mut prev_separator = false;

        for (index, c) in text.chars().enumerate() {
            if cursor == index && !prev_separator {
                cursor_word = Some(scan.words.len());
                word_cursor = scan.buf_len;
            }
            prev_separator = false;

            if c != '"' {
                scan.quote_run = 0;
                // `""` followed by anything else was just an empty string
                if scan.triple_quote && scan.opener == 2 {
                    scan.end_double_quote();
                }
            }

            match c {
                ' ' => {
                    if scan.escape || scan.in_quote() || scan.bracket_depth > 0 {
                        scan.push(c, index);
                        scan.escape = false;
                    } else {
                        scan.flush(WordStatus::Ok);
                        prev_separator = true;
                    }
                }
                '\\' => {
                    if scan.escape || scan.triple_quote {
                        scan.push(c, index);
                        scan.escape = false;
                    } else {
                        scan.escape = true;
                    }
                }
                '\'' => scan.single_quote_char(index),
                '"' => scan.double_quote_char(index),
                _ if scan.escape => {
                    // unknown escapes are kept verbatim
                    scan.push('\\', index - 1);
                    scan.push(c, index);
                    scan.escape = false;
                }
                '{' | '[' if self.parse_brackets && !scan.in_quote() => {
                    scan.bracket_depth += 1;
                    scan.push(c, index);
                }
                '}' | ']' if self.parse_brackets && !scan.in_quote() && scan.bracket_depth > 0 => {
                    scan.bracket_depth -= 1;
                    scan.push(c, index);
                }
                _ => scan.push(c, index),
            }
        }

        if scan.escape {
            scan.push('\\', len - 1);
            scan.escape = false;
        }
        if scan.triple_quote && scan.opener == 2 {
            scan.end_double_quote();
        }

        let word_status = if scan.single_quote {
            WordStatus::OpenQuote
        } else if scan.double_quote {
            WordStatus::OpenDoubleQuote
        } else if scan.bracket_depth > 0 {
            WordStatus::OpenBracket
        } else {
            WordStatus::Ok
        };
        scan.flush(word_status);

        if cursor == len
            && !prev_separator
            && let Some(last) = scan.words.last()
        {
            cursor_word = Some(scan.words.len() - 1);
            word_cursor = last.len();
        }

        let (status, error_message) = match (scan.single_quote, scan.double_quote) {
            (true, true) => (
                LineStatus::DoubleUnclosedQuote,
                Some("unclosed single and double quote".to_string()),
            ),
            (true, false) => (LineStatus::UnclosedQuote, Some("unclosed quote".to_string())),
            (false, true) => (
                LineStatus::UnclosedQuote,
                Some("unclosed double quote".to_string()),
            ),
            (false, false) => (LineStatus::Ok, None),
        };

        log::trace!(
            "parsed {:?}: {} word(s), cursor word {:?}, status {:?}",
            text,
            scan.words.len(),
            cursor_word,
            status
        );

        ParsedLine::new(
            text,
            scan.words,
            cursor,
            cursor_word,
            word_cursor,
            status,
            error_message,
        )
    }
}

#[derive(Debug, Default)]
struct Scanner {
    words: Vec<ParsedWord>,
    buf: String,
    /// Length of `buf` in chars.
    buf_len: usize,
    word_start: usize,
    escape: bool,
    single_quote: bool,
    double_quote: bool,
    triple_quote: bool,
    /// Index of the `"` that opened double-quote mode.
    dq_open: usize,
    /// Quotes consumed by the `"""` opener so far (2 or 3).
    opener: u8,
    /// Consecutive `"` captured inside triple-quote mode.
    quote_run: usize,
    bracket_depth: usize,
}

impl Scanner {
    fn in_quote(&self) -> bool {
        self.single_quote || self.double_quote || self.triple_quote
    }

    fn push(&mut self, c: char, index: usize) {
        if self.buf.is_empty() {
            self.word_start = index;
        }
        self.buf.push(c);
        self.buf_len += 1;
    }

    fn flush(&mut self, status: WordStatus) {
        if self.buf.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.buf);
        self.words
            .push(ParsedWord::new(text, self.word_start).with_status(status));
        self.buf_len = 0;
    }

    fn end_double_quote(&mut self) {
        self.triple_quote = false;
        self.double_quote = false;
        self.opener = 0;
        self.quote_run = 0;
    }

    fn single_quote_char(&mut self, index: usize) {
        if self.escape || self.triple_quote || self.bracket_depth > 0 {
            self.push('\'', index);
            self.escape = false;
        } else if self.single_quote {
            self.flush(WordStatus::Ok);
            self.single_quote = false;
        } else if self.double_quote {
            self.push('\'', index);
        } else {
            self.single_quote = true;
        }
    }

    fn double_quote_char(&mut self, index: usize) {
        if self.escape || self.bracket_depth > 0 {
            self.push('"', index);
            self.escape = false;
            return;
        }
        if self.triple_quote {
            if self.opener < 3 {
                self.opener = 3;
                return;
            }
            self.push('"', index);
            self.quote_run += 1;
            if self.quote_run == 3 {
                // the three closing quotes are delimiters, not content
                for _ in 0..3 {
                    self.buf.pop();
                }
                self.buf_len -= 3;
                self.flush(WordStatus::Ok);
                self.end_double_quote();
            }
            return;
        }
        if self.double_quote {
            if index == self.dq_open + 1 {
                self.triple_quote = true;
                self.opener = 2;
            } else {
                self.flush(WordStatus::Ok);
                self.double_quote = false;
            }
            return;
        }
        if self.single_quote {
            self.push('"', index);
        } else {
            self.double_quote = true;
            self.dq_open = index;
        }
    }
}
