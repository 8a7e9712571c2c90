//! The 4GL scanner/lexer.
//!
//! Converts source text into a stream of tokens. In the default mode
//! whitespace, newlines and comments are skipped and only recorded through
//! the `PRECEDING_LINE_BREAK` flag. In verbatim mode they are returned as
//! tokens of their own.

use crate::char_codes::*;
use crate::token::Token;
use fgl_ast::types::TokenFlags;
use fgl_ast::TokenKind;
use fgl_core::text::{TextPos, TextSpan};
use fgl_diagnostics::{messages, Diagnostic, DiagnosticCollection};

/// Whether trivia is skipped or returned as tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    #[default]
    Default,
    Verbatim,
}

/// Turns 4GL source text into tokens, one call to [`Scanner::scan`] at a
/// time.
pub struct Scanner {
    text: Vec<char>,
    pos: usize,
    /// Where the current token begins, after any skipped trivia.
    token_start: usize,
    token: TokenKind,
    token_flags: TokenFlags,
    mode: ScanMode,
    /// Verbatim mode only: a line break token was handed out since the last
    /// significant token.
    line_break_pending: bool,
    diagnostics: DiagnosticCollection,
    errors_taken: usize,
}

impl Scanner {
    pub fn new(text: &str) -> Self {
        Self::with_mode(text, ScanMode::Default)
    }

    pub fn with_mode(text: &str, mode: ScanMode) -> Self {
        Self {
            text: text.chars().collect(),
            pos: 0,
            token_start: 0,
            token: TokenKind::Unknown,
            token_flags: TokenFlags::NONE,
            mode,
            line_break_pending: false,
            diagnostics: DiagnosticCollection::new(),
            errors_taken: 0,
        }
    }

    #[inline]
    pub fn token(&self) -> TokenKind {
        self.token
    }

    /// Source slice of the token last scanned.
    pub fn token_text(&self) -> String {
        self.slice(self.token_start, self.pos)
    }

    #[inline]
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Exclusive end of the token last scanned, which is also where the next
    /// scan starts.
    #[inline]
    pub fn token_end(&self) -> usize {
        self.pos
    }

    /// Errors reported so far, including ones already handed over.
    pub fn error_count(&self) -> usize {
        self.errors_taken + self.diagnostics.error_count()
    }

    /// Hand over the diagnostics reported so far.
    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        self.errors_taken += self.diagnostics.error_count();
        std::mem::take(&mut self.diagnostics)
    }

    /// The token last scanned, as an owned [`Token`].
    pub fn token_info(&self) -> Token {
        Token {
            kind: self.token,
            pos: self.token_start as TextPos,
            end: self.pos as TextPos,
            text: self.token_text(),
            flags: self.token_flags,
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.scan();
        self.token_info()
    }

    #[inline]
    fn current_char(&self) -> Option<char> {
        self.text.get(self.pos).copied()
    }

    #[inline]
    fn char_at(&self, offset: usize) -> Option<char> {
        self.text.get(self.pos + offset).copied()
    }

    fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.text.len());
        self.text[start.min(end)..end].iter().collect()
    }

    fn error_at(&mut self, start: usize, end: usize, message: &fgl_diagnostics::DiagnosticMessage, args: &[&str]) {
        self.diagnostics.add(Diagnostic::at(
            TextSpan::from_bounds(start as u32, end as u32),
            message,
            args,
        ));
    }

    /// Whether a comment starts at the current position.
    fn at_comment_start(&self) -> bool {
        match self.current_char() {
            Some('#') | Some('{') => true,
            Some('-') => self.char_at(1) == Some('-'),
            _ => false,
        }
    }

    /// Consume one comment starting at the current position. Returns whether
    /// the comment contained a line break.
    fn scan_comment(&mut self) -> bool {
        let start = self.pos;
        if self.current_char() == Some('{') {
            let mut saw_line_break = false;
            self.pos += 1;
            loop {
                match self.current_char() {
                    None => {
                        self.token_flags |= TokenFlags::UNTERMINATED;
                        self.error_at(start, self.pos, &messages::UNTERMINATED_BLOCK_COMMENT, &[]);
                        return saw_line_break;
                    }
                    Some('}') => {
                        self.pos += 1;
                        return saw_line_break;
                    }
                    Some(ch) => {
                        saw_line_break |= is_line_break(ch);
                        self.pos += 1;
                    }
                }
            }
        }
        // `#` or `--` runs to the end of the line; the line break itself is
        // not part of the comment.
        while let Some(ch) = self.current_char() {
            if is_line_break(ch) {
                break;
            }
            self.pos += 1;
        }
        false
    }

    /// Consume one line break (`\r\n` counts as one).
    fn scan_line_break(&mut self) {
        if self.current_char() == Some('\r') && self.char_at(1) == Some('\n') {
            self.pos += 2;
        } else {
            self.pos += 1;
        }
    }

    /// Default mode: step over whitespace and comments, flagging the next
    /// token when any of them held a line break.
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.current_char() {
            if is_line_break(ch) {
                self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
                self.scan_line_break();
            } else if is_white_space_single_line(ch) {
                self.pos += 1;
            } else if self.at_comment_start() {
                if self.scan_comment() {
                    self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
                }
                self.token_flags.remove(TokenFlags::UNTERMINATED);
            } else {
                return;
            }
        }
    }

    /// Scan one trivia token in verbatim mode, if the current position
    /// starts one.
    fn scan_trivia_token(&mut self) -> Option<TokenKind> {
        let ch = self.current_char()?;
        if is_line_break(ch) {
            self.scan_line_break();
            self.line_break_pending = true;
            return Some(TokenKind::NewLine);
        }
        if is_white_space_single_line(ch) {
            while self.current_char().map_or(false, is_white_space_single_line) {
                self.pos += 1;
            }
            return Some(TokenKind::Whitespace);
        }
        if self.at_comment_start() {
            if self.scan_comment() {
                self.line_break_pending = true;
            }
            return Some(TokenKind::Comment);
        }
        None
    }

    /// Advance to the next token. Past the end of the text this keeps
    /// returning `EndOfFile`.
    pub fn scan(&mut self) -> TokenKind {
        self.token_flags = TokenFlags::NONE;

        match self.mode {
            ScanMode::Default => self.skip_trivia(),
            ScanMode::Verbatim => {
                self.token_start = self.pos;
                if let Some(kind) = self.scan_trivia_token() {
                    self.token = kind;
                    return kind;
                }
                if self.line_break_pending {
                    self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
                    self.line_break_pending = false;
                }
            }
        }
        self.token_start = self.pos;

        let Some(ch) = self.current_char() else {
            self.token = TokenKind::EndOfFile;
            return self.token;
        };

        self.token = match ch {
            '(' => { self.pos += 1; TokenKind::OpenParenToken }
            ')' => { self.pos += 1; TokenKind::CloseParenToken }
            '[' => { self.pos += 1; TokenKind::OpenBracketToken }
            ']' => { self.pos += 1; TokenKind::CloseBracketToken }
            ',' => { self.pos += 1; TokenKind::CommaToken }
            ':' => { self.pos += 1; TokenKind::ColonToken }
            ';' => { self.pos += 1; TokenKind::SemicolonToken }
            '+' => { self.pos += 1; TokenKind::PlusToken }
            '-' => { self.pos += 1; TokenKind::MinusToken }
            '/' => { self.pos += 1; TokenKind::SlashToken }

            '.' => {
                if self.char_at(1).map_or(false, is_digit) {
                    self.scan_number()
                } else {
                    self.pos += 1;
                    TokenKind::DotToken
                }
            }
            '*' => self.scan_pair('*', TokenKind::AsteriskToken, TokenKind::AsteriskAsteriskToken),
            '=' => self.scan_pair('=', TokenKind::EqualsToken, TokenKind::EqualsEqualsToken),
            '>' => self.scan_pair('=', TokenKind::GreaterThanToken, TokenKind::GreaterThanEqualsToken),
            '<' => match self.char_at(1) {
                Some('=') => { self.pos += 2; TokenKind::LessThanEqualsToken }
                Some('>') => { self.pos += 2; TokenKind::LessThanGreaterThanToken }
                _ => { self.pos += 1; TokenKind::LessThanToken }
            },
            '|' if self.char_at(1) == Some('|') => { self.pos += 2; TokenKind::BarBarToken }
            '!' if self.char_at(1) == Some('=') => { self.pos += 2; TokenKind::ExclamationEqualsToken }

            '\'' | '"' => self.scan_string_literal(ch),

            '0'..='9' => self.scan_number(),

            _ if is_identifier_start(ch) => self.scan_identifier(),

            _ => {
                self.pos += 1;
                self.token_flags |= TokenFlags::IS_INVALID;
                let text = ch.to_string();
                self.error_at(self.token_start, self.pos, &messages::INVALID_CHARACTER, &[&text]);
                TokenKind::Unknown
            }
        };

        self.token
    }

    /// Scan a one-character operator that may be followed by `second` to
    /// form a two-character operator.
    fn scan_pair(&mut self, second: char, single: TokenKind, double: TokenKind) -> TokenKind {
        if self.char_at(1) == Some(second) {
            self.pos += 2;
            double
        } else {
            self.pos += 1;
            single
        }
    }

    fn scan_string_literal(&mut self, quote: char) -> TokenKind {
        if quote == '"' {
            self.token_flags |= TokenFlags::DOUBLE_QUOTED;
        }
        self.pos += 1;
        loop {
            let Some(ch) = self.current_char() else {
                self.unterminated_string();
                break;
            };
            if ch == quote {
                self.pos += 1;
                break;
            }
            if ch == '\\' {
                self.pos += 1;
                if self.current_char().map_or(false, |c| !is_line_break(c)) {
                    self.pos += 1;
                }
                continue;
            }
            if is_line_break(ch) {
                self.unterminated_string();
                break;
            }
            self.pos += 1;
        }
        TokenKind::StringLiteral
    }

    fn unterminated_string(&mut self) {
        self.token_flags |= TokenFlags::UNTERMINATED;
        self.error_at(self.token_start, self.pos, &messages::UNTERMINATED_STRING_LITERAL, &[]);
    }

    fn scan_digits(&mut self) -> usize {
        let start = self.pos;
        while self.current_char().map_or(false, is_digit) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn scan_number(&mut self) -> TokenKind {
        self.scan_digits();
        if self.current_char() == Some('.') && self.char_at(1).map_or(true, |c| !is_identifier_start(c)) {
            self.token_flags |= TokenFlags::DECIMAL_POINT;
            self.pos += 1;
            self.scan_digits();
        }
        if matches!(self.current_char(), Some('e') | Some('E')) {
            let sign = matches!(self.char_at(1), Some('+') | Some('-'));
            let digit_offset = if sign { 2 } else { 1 };
            let has_digits = self.char_at(digit_offset).map_or(false, is_digit);
            // `e` directly after the mantissa always starts an exponent.
            self.token_flags |= TokenFlags::SCIENTIFIC;
            self.pos += digit_offset;
            if has_digits {
                self.scan_digits();
            } else {
                self.token_flags |= TokenFlags::IS_INVALID;
                let text = self.slice(self.token_start, self.pos);
                self.error_at(self.token_start, self.pos, &messages::MALFORMED_NUMERIC_LITERAL, &[&text]);
            }
        }
        TokenKind::NumberLiteral
    }

    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        self.pos += 1;
        while self.current_char().map_or(false, is_identifier_part) {
            self.pos += 1;
        }
        let length = self.pos - start;
        // Keywords are ASCII and short; skip the lookup for anything else.
        if length <= 16 {
            let text = self.slice(start, self.pos);
            if let Some(keyword) = TokenKind::from_keyword(&text) {
                return keyword;
            }
        }
        TokenKind::Identifier
    }
}

/// Scan `text` to the end and return every token, always ending with an
/// `EndOfFile` token at `text.len()` (in characters).
#[tracing::instrument(level = "debug", skip_all, fields(chars = text.len()))]
pub fn tokenize(text: &str, mode: ScanMode) -> (Vec<Token>, DiagnosticCollection) {
    let mut scanner = Scanner::with_mode(text, mode);
    let mut tokens: Vec<Token> = Vec::new();
    while tokens.last().map_or(true, |last| last.kind != TokenKind::EndOfFile) {
        tokens.push(scanner.next_token());
    }
    tracing::debug!(tokens = tokens.len(), "tokenized");
    (tokens, scanner.take_diagnostics())
}
