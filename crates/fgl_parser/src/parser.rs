//! Parser core.
//!
//! `Parser` owns the lookahead buffer, the active language version and the
//! diagnostics reported so far. Grammar productions live in their own
//! modules and drive the parser through the small API defined here.

use crate::lookahead::TokenQueue;
use fgl_ast::TokenKind;
use fgl_core::text::{TextPos, TextSpan};
use fgl_core::version::LanguageVersion;
use fgl_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage};
use fgl_scanner::{ScanMode, Token};

/// Maximum recursion depth to prevent stack overflow on deeply nested input.
const MAX_RECURSION_DEPTH: u32 = 200;

/// Options that control a parse.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Constructs newer than this version are reported instead of parsed.
    pub language_version: LanguageVersion,
    /// Keep whitespace and comments; they are returned as trivia.
    pub verbatim: bool,
    /// File name attached to reported diagnostics.
    pub file_name: Option<String>,
}

impl ParseOptions {
    pub fn with_version(language_version: LanguageVersion) -> Self {
        Self {
            language_version,
            ..Self::default()
        }
    }
}

/// The recursive-descent parser state shared by all productions.
pub struct Parser {
    tokens: TokenQueue,
    language_version: LanguageVersion,
    diagnostics: DiagnosticCollection,
    /// Tracks recursion depth to prevent stack overflow on deeply nested input.
    recursion_depth: u32,
    depth_error_reported: bool,
    text_len: TextPos,
}

impl Parser {
    pub fn new(source_text: &str, options: &ParseOptions) -> Self {
        let mode = if options.verbatim {
            ScanMode::Verbatim
        } else {
            ScanMode::Default
        };
        Self {
            tokens: TokenQueue::new(source_text, mode),
            language_version: options.language_version,
            diagnostics: DiagnosticCollection::new(),
            recursion_depth: 0,
            depth_error_reported: false,
            text_len: source_text.chars().count() as TextPos,
        }
    }

    /// Finish parsing: return all diagnostics (scanner and parser, in source
    /// order) and the trivia collected in verbatim mode.
    pub fn finish(self) -> (DiagnosticCollection, Vec<Token>) {
        let (trivia, scanner_diagnostics) = self.tokens.into_parts();
        let mut diagnostics = scanner_diagnostics;
        diagnostics.extend(self.diagnostics);
        diagnostics.sort();
        (diagnostics, trivia)
    }

    #[inline]
    pub fn language_version(&self) -> LanguageVersion {
        self.language_version
    }

    /// Length of the source text in characters.
    #[inline]
    pub fn text_len(&self) -> TextPos {
        self.text_len
    }

    // ========================================================================
    // Token management
    // ========================================================================

    #[inline]
    pub fn peek_token(&mut self, depth: usize) -> &Token {
        self.tokens.peek_token(depth)
    }

    #[inline]
    pub fn peek(&mut self, kind: TokenKind) -> bool {
        self.tokens.peek(kind)
    }

    #[inline]
    pub fn peek_at(&mut self, kind: TokenKind, depth: usize) -> bool {
        self.tokens.peek_at(kind, depth)
    }

    /// Kind of the next token.
    #[inline]
    pub fn peek_kind(&mut self) -> TokenKind {
        self.tokens.peek_token(1).kind
    }

    #[inline]
    pub fn next_token(&mut self) -> TokenKind {
        self.tokens.next_token()
    }

    /// The most recently consumed token.
    #[inline]
    pub fn token(&self) -> &Token {
        self.tokens.token()
    }

    #[inline]
    pub fn eof(&mut self) -> bool {
        self.tokens.eof()
    }

    /// Number of tokens consumed so far; used to detect lack of progress.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.tokens.consumed()
    }

    /// Start offset of the next token.
    pub fn next_pos(&mut self) -> TextPos {
        self.tokens.peek_token(1).pos
    }

    /// End offset of the most recently consumed token.
    pub fn last_end(&self) -> TextPos {
        self.tokens.token().end
    }

    /// Consume the next token if it has the given kind.
    pub fn optional(&mut self, kind: TokenKind) -> bool {
        if self.peek(kind) {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Consume the next token if it has the given kind, otherwise report
    /// `'<kind>' expected` at the next token and consume nothing.
    pub fn expect(&mut self, kind: TokenKind) -> bool {
        if self.optional(kind) {
            return true;
        }
        self.error_at_next(&messages::_0_EXPECTED, &[kind.text()]);
        false
    }

    /// Consume a name (an identifier or a contextual keyword) and return its
    /// source text and span.
    pub fn parse_identifier(&mut self) -> Option<(String, TextSpan)> {
        let token = self.peek_token(1);
        if !token.kind.can_be_identifier() {
            return None;
        }
        let result = (token.text.clone(), token.span());
        self.next_token();
        Some(result)
    }

    /// Like [`Parser::parse_identifier`], but reports `Identifier expected`
    /// when no name follows.
    pub fn expect_identifier(&mut self) -> Option<(String, TextSpan)> {
        let name = self.parse_identifier();
        if name.is_none() {
            self.error_at_next(&messages::IDENTIFIER_EXPECTED, &[]);
        }
        name
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    pub fn report_syntax_error(&mut self, message: &DiagnosticMessage, args: &[&str], span: TextSpan) {
        self.diagnostics.add(Diagnostic::at(span, message, args));
    }

    /// Report at the next (not yet consumed) token.
    pub fn error_at_next(&mut self, message: &DiagnosticMessage, args: &[&str]) {
        let span = self.peek_token(1).span();
        self.report_syntax_error(message, args, span);
    }

    /// Errors reported so far: the parser's own plus the scanner errors of
    /// every consumed token. Nodes compare this before and after parsing to
    /// tell whether recovery happened inside them.
    pub fn error_count(&self) -> usize {
        self.diagnostics.error_count() + self.tokens.consumed_errors()
    }

    // ========================================================================
    // Nesting
    // ========================================================================

    /// Enter one level of nesting. Returns false (reporting once per parse)
    /// when the depth limit is reached; the caller must not recurse then.
    pub fn enter_nested(&mut self) -> bool {
        if self.recursion_depth >= MAX_RECURSION_DEPTH {
            if !self.depth_error_reported {
                self.depth_error_reported = true;
                self.error_at_next(&messages::MAXIMUM_NESTING_DEPTH_EXCEEDED, &[]);
            }
            return false;
        }
        self.recursion_depth += 1;
        true
    }

    pub fn exit_nested(&mut self) {
        self.recursion_depth = self.recursion_depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_reports_without_consuming() {
        let mut parser = Parser::new("x", &ParseOptions::default());
        assert!(!parser.expect(TokenKind::ThenKeyword));
        assert_eq!(parser.consumed(), 0);
        let (diagnostics, _) = parser.finish();
        assert_eq!(diagnostics.diagnostics()[0].message_text, "'then' expected.");
    }

    #[test]
    fn test_contextual_keyword_is_an_identifier() {
        let mut parser = Parser::new("action end", &ParseOptions::default());
        assert_eq!(parser.parse_identifier().map(|(n, _)| n), Some("action".to_string()));
        assert!(parser.parse_identifier().is_none());
        assert!(parser.peek(TokenKind::EndKeyword));
    }
}
