use std::collections::VecDeque;

/// Bounded command history with a browse cursor.
///
/// Empty lines and repeats of the most recent entry are not recorded.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    max_size: usize,
    /// Browse position; `entries.len()` means "past the newest entry".
    index: usize,
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_size,
            index: 0,
        }
    }

    pub fn push(&mut self, line: &str) {
        let line = line.trim_end_matches(['\n', '\r']);
        if self.max_size == 0
            || line.trim().is_empty()
            || self.entries.back().is_some_and(|last| last == line)
        {
            self.index = self.entries.len();
            return;
        }
        if self.entries.len() == self.max_size {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_string());
        self.index = self.entries.len();
    }

    /// Step back to the previous (older) entry.
    pub fn previous(&mut self) -> Option<&str> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index).map(String::as_str)
    }

    /// Step forward; `None` once past the newest entry.
    pub fn next(&mut self) -> Option<&str> {
        if self.index >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// The most recently recorded entry.
    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
