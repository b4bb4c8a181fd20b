use crate::complete::CompleteOperation;

/// An editable input line. The cursor is a character offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    chars: Vec<char>,
    cursor: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer holding `text` with the cursor at the end.
    pub fn from_text(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let cursor = chars.len();
        Self { chars, cursor }
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn insert(&mut self, c: char) {
        self.chars.insert(self.cursor, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        let tail = self.chars.split_off(self.cursor);
        self.chars.extend(s.chars());
        self.cursor = self.chars.len();
        self.chars.extend(tail);
    }

    /// Remove the char before the cursor.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.chars.remove(self.cursor);
        true
    }

    /// Remove the char under the cursor.
    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.chars.len() {
            return false;
        }
        self.chars.remove(self.cursor);
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.chars.len());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.chars.len();
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }

    /// Replace the text between `op.offset` and the cursor.
    ///
    /// A single candidate is inserted as is. Several candidates insert their
    /// common prefix when it extends what was typed. Returns whether the
    /// buffer changed.
    pub fn apply(&mut self, op: &CompleteOperation) -> bool {
        if op.offset > self.cursor {
            return false;
        }
        let replacement = match op.single() {
            Some(only) => only.to_string(),
            None => op.common_prefix(),
        };
        let typed: String = self.chars[op.offset..self.cursor].iter().collect();
        if replacement == typed || replacement.chars().count() < typed.chars().count() {
            return false;
        }
        self.chars.drain(op.offset..self.cursor);
        self.cursor = op.offset;
        self.insert_str(&replacement);
        true
    }

    /// Append an inline suggestion and move the cursor to the end.
    pub fn append_suggestion(&mut self, suggestion: &str) {
        self.end();
        self.insert_str(suggestion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing() {
        let mut b = Buffer::new();
        b.insert_str("lx");
        b.move_left();
        b.insert('s');
        assert_eq!(b.text(), "lsx");
        assert_eq!(b.cursor(), 2);
        assert!(b.delete());
        assert_eq!(b.text(), "ls");
        assert!(!b.delete());
        b.home();
        assert!(!b.backspace());
        b.end();
        assert!(b.backspace());
        assert_eq!(b.text(), "l");
    }

    #[test]
    fn cursor_clamped() {
        let mut b = Buffer::from_text("ab");
        b.move_right();
        assert_eq!(b.cursor(), 2);
        b.home();
        b.move_left();
        assert_eq!(b.cursor(), 0);
    }

    #[test]
    fn multibyte_chars() {
        let mut b = Buffer::from_text("héllo");
        b.move_left();
        b.backspace();
        assert_eq!(b.text(), "hélo");
        assert_eq!(b.cursor(), 3);
    }

    #[test]
    fn apply_single_candidate() {
        let mut b = Buffer::from_text("export BAR=$F");
        assert!(b.apply(&CompleteOperation::new(11, vec!["$FOO".into()])));
        assert_eq!(b.text(), "export BAR=$FOO");
        assert_eq!(b.cursor(), 15);
    }

    #[test]
    fn apply_keeps_text_after_cursor() {
        let mut b = Buffer::from_text("echo $F tail");
        for _ in 0..5 {
            b.move_left();
        }
        assert!(b.apply(&CompleteOperation::new(5, vec!["$FOO".into()])));
        assert_eq!(b.text(), "echo $FOO tail");
        assert_eq!(b.cursor(), 9);
    }

    #[test]
    fn apply_common_prefix() {
        let mut b = Buffer::from_text("echo $F");
        let op = CompleteOperation::new(5, vec!["$FOO".into(), "$FOO2".into()]);
        assert!(b.apply(&op));
        assert_eq!(b.text(), "echo $FOO");
        assert!(!b.apply(&op));
    }

    #[test]
    fn apply_out_of_range() {
        let mut b = Buffer::from_text("ab");
        b.home();
        assert!(!b.apply(&CompleteOperation::new(1, vec!["x".into()])));
        assert_eq!(b.text(), "ab");
    }

    #[test]
    fn append_suggestion_at_end() {
        let mut b = Buffer::from_text("exp");
        b.home();
        b.append_suggestion("ort ");
        assert_eq!(b.text(), "export ");
        assert_eq!(b.cursor(), 7);
    }
}
