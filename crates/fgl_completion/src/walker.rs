//! Walking tokens backward from the cursor.

use fgl_ast::TokenKind;
use fgl_core::text::{TextPos, TextSpan};
use fgl_scanner::{tokenize, ScanMode, Token};

/// Yields the significant tokens before a cursor offset, nearest first.
///
/// The text before the cursor is scanned with the same scanner the parser
/// uses, so comments and whitespace never show up and multi-character
/// operators are single tokens.
#[derive(Debug, Clone)]
pub struct ReverseTokenWalker {
    /// Remaining tokens in source order; iteration pops from the back.
    tokens: Vec<Token>,
    cursor: TextPos,
}

impl ReverseTokenWalker {
    /// `offset` is a character offset; offsets past the end clamp to it.
    pub fn new(text: &str, offset: TextPos) -> Self {
        let before = match text.char_indices().nth(offset as usize) {
            Some((byte, _)) => &text[..byte],
            None => text,
        };
        let (mut tokens, _) = tokenize(before, ScanMode::Default);
        tokens.retain(|token| token.kind != TokenKind::EndOfFile);
        Self {
            tokens,
            cursor: before.chars().count() as TextPos,
        }
    }

    /// The cursor offset after clamping.
    pub fn cursor(&self) -> TextPos {
        self.cursor
    }

    /// Split the tokens into the word being typed, the trigger and the
    /// backward stream.
    pub fn into_context(mut self) -> CursorContext {
        let cursor = self.cursor;
        let typing = self
            .tokens
            .last()
            .is_some_and(|token| token.end == cursor && is_word(token.kind));
        let (prefix, prefix_start) = match typing.then(|| self.next()).flatten() {
            Some(word) => (word.text, word.pos),
            None => (String::new(), cursor),
        };
        let (trigger, trigger_span) = match self.next() {
            Some(token) => (token.kind, Some(token.span())),
            None => (TokenKind::EndOfFile, None),
        };
        CursorContext {
            prefix,
            prefix_start,
            trigger,
            trigger_span,
            backward: self.map(|token| token.kind).collect(),
        }
    }
}

impl Iterator for ReverseTokenWalker {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.tokens.pop()
    }
}

fn is_word(kind: TokenKind) -> bool {
    kind == TokenKind::Identifier || kind.is_keyword()
}

/// The tokens around a cursor, as the completion engine needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorContext {
    /// The partial word ending at the cursor; empty after a separator.
    pub prefix: String,
    pub prefix_start: TextPos,
    /// The nearest significant token before the prefix. `EndOfFile` when
    /// nothing precedes it, so rules keyed on `eof` describe the start of a
    /// document.
    pub trigger: TokenKind,
    pub trigger_span: Option<TextSpan>,
    /// Significant tokens before the trigger, nearest first.
    pub backward: Vec<TokenKind>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgl_ast::TokenKind as K;

    #[test]
    fn test_walks_backward_skipping_trivia() {
        let kinds: Vec<_> = ReverseTokenWalker::new("LET x = -- note\n  y + ", 100)
            .map(|token| token.kind)
            .collect();
        assert_eq!(kinds, vec![K::PlusToken, K::Identifier, K::EqualsToken, K::Identifier, K::LetKeyword]);
    }

    #[test]
    fn test_word_at_cursor_is_the_prefix() {
        let context = ReverseTokenWalker::new("FOR i = 1 TO 10 ST", 18).into_context();
        assert_eq!(context.prefix, "ST");
        assert_eq!(context.prefix_start, 16);
        assert_eq!(context.trigger, K::NumberLiteral);
        assert_eq!(context.backward, vec![K::ToKeyword, K::NumberLiteral, K::EqualsToken, K::Identifier, K::ForKeyword]);
    }

    #[test]
    fn test_separator_before_cursor_is_the_trigger() {
        let context = ReverseTokenWalker::new("FOR i = 1 TO 10 ", 16).into_context();
        assert_eq!(context.prefix, "");
        assert_eq!(context.trigger, K::NumberLiteral);

        // A keyword followed by a space is complete: it triggers.
        let context = ReverseTokenWalker::new("CALL ", 5).into_context();
        assert_eq!(context.trigger, K::CallKeyword);
        assert!(context.backward.is_empty());
    }

    #[test]
    fn test_offsets_are_characters() {
        let text = "DISPLAY \"é\" || na";
        let offset = text.chars().count() as TextPos;
        let context = ReverseTokenWalker::new(text, offset).into_context();
        assert_eq!(context.prefix, "na");
        assert_eq!(context.prefix_start, offset - 2);
        assert_eq!(context.trigger, K::BarBarToken);
    }

    #[test]
    fn test_start_of_document() {
        let context = ReverseTokenWalker::new("MA", 2).into_context();
        assert_eq!(context.prefix, "MA");
        assert_eq!(context.trigger, K::EndOfFile);
        assert_eq!(context.trigger_span, None);
    }
}
