pub mod iterator;
pub mod line_parser;
pub mod types;

pub use iterator::ParsedLineIterator;
pub use line_parser::{LineParser, parse_line};
pub use types::{LineStatus, ParsedLine, ParsedWord, WordStatus};
