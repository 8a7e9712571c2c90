//! Tokens produced by the scanner.

use fgl_ast::types::TokenFlags;
use fgl_ast::{TokenCategory, TokenKind};
use fgl_core::text::{TextPos, TextSpan};
use std::borrow::Cow;

/// A scanned token. `text` is the exact source slice, so concatenating the
/// text of every token from a verbatim scan reproduces the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Character offsets, end exclusive.
    pub pos: TextPos,
    pub end: TextPos,
    pub text: String,
    pub flags: TokenFlags,
}

impl Token {
    /// A token with no text or flags yet.
    pub fn new(kind: TokenKind, pos: TextPos, end: TextPos) -> Self {
        Self {
            kind,
            pos,
            end,
            text: String::new(),
            flags: TokenFlags::default(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Zero-width `EndOfFile` at `pos`.
    pub fn end_of_file(pos: TextPos) -> Self {
        Self::new(TokenKind::EndOfFile, pos, pos)
    }

    pub fn span(&self) -> TextSpan {
        TextSpan::from_bounds(self.pos, self.end)
    }

    pub fn category(&self) -> TokenCategory {
        self.kind.category()
    }

    /// Set when a line break sits between this token and the previous
    /// significant one.
    pub fn has_preceding_line_break(&self) -> bool {
        self.flags.contains(TokenFlags::PRECEDING_LINE_BREAK)
    }

    /// The normalized value: lowercase text for keywords, the unquoted and
    /// unescaped contents for strings, the source text otherwise.
    pub fn value(&self) -> Cow<'_, str> {
        if let Some(keyword) = self.kind.keyword_text() {
            return Cow::Borrowed(keyword);
        }
        if self.kind == TokenKind::StringLiteral {
            return Cow::Owned(unquote(&self.text, self.flags.contains(TokenFlags::UNTERMINATED)));
        }
        Cow::Borrowed(&self.text)
    }
}

fn unquote(text: &str, unterminated: bool) -> String {
    let mut chars = text.chars();
    chars.next();
    if !unterminated {
        chars.next_back();
    }
    let mut out = String::with_capacity(text.len());
    while let Some(ch) = chars.next() {
        let unescaped = match ch {
            '\\' => match chars.next() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                Some(other) => other,
                None => '\\',
            },
            _ => ch,
        };
        out.push(unescaped);
    }
    out
}
