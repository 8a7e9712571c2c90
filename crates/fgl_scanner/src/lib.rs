//! fgl_scanner: Lexer/tokenizer for 4GL source code.
//!
//! Produces tokens from source text with support for:
//! - Case-insensitive keywords and contextual keywords usable as names
//! - Integer, decimal and exponent numeric literals
//! - Single and double quoted strings with backslash escapes
//! - `#`, `--` and `{ }` comments
//! - A verbatim mode that keeps whitespace and comments as tokens

mod char_codes;
mod scanner;
mod token;

pub use scanner::{tokenize, ScanMode, Scanner};
pub use token::Token;
