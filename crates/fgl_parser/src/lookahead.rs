//! Lookahead buffer over the scanner.
//!
//! `TokenQueue` lets the parser inspect any number of upcoming significant
//! tokens without consuming them. Trivia produced by a verbatim scanner is
//! diverted to a side list and never enters the queue.

use fgl_ast::TokenKind;
use fgl_diagnostics::DiagnosticCollection;
use fgl_scanner::{ScanMode, Scanner, Token};
use std::collections::VecDeque;

pub struct TokenQueue {
    scanner: Scanner,
    /// Upcoming significant tokens with the number of scanner errors raised
    /// while scanning each one (and any trivia before it). The front is
    /// depth 1.
    queue: VecDeque<(Token, usize)>,
    /// Scanner errors raised by trivia not yet attached to a token.
    pending_errors: usize,
    /// Scanner errors attached to consumed tokens.
    consumed_errors: usize,
    /// Whitespace, newline and comment tokens, in source order.
    trivia: Vec<Token>,
    /// The most recently consumed token.
    current: Token,
    /// Number of tokens consumed so far (EOF is never counted).
    consumed: usize,
}

impl TokenQueue {
    pub fn new(text: &str, mode: ScanMode) -> Self {
        Self {
            scanner: Scanner::with_mode(text, mode),
            queue: VecDeque::new(),
            pending_errors: 0,
            consumed_errors: 0,
            trivia: Vec::new(),
            current: Token::end_of_file(0),
            consumed: 0,
        }
    }

    /// Ensure at least `depth` significant tokens are buffered.
    fn fill(&mut self, depth: usize) {
        while self.queue.len() < depth {
            let before = self.scanner.error_count();
            let token = self.scanner.next_token();
            self.pending_errors += self.scanner.error_count() - before;
            if token.kind.is_trivia() {
                self.trivia.push(token);
            } else {
                let errors = std::mem::take(&mut self.pending_errors);
                self.queue.push_back((token, errors));
            }
        }
    }

    /// The significant token `depth` positions ahead, where depth 1 is the
    /// next token to be consumed. Never consumes.
    pub fn peek_token(&mut self, depth: usize) -> &Token {
        let depth = depth.max(1);
        self.fill(depth);
        &self.queue[depth - 1].0
    }

    /// Whether the next token has the given kind.
    pub fn peek(&mut self, kind: TokenKind) -> bool {
        self.peek_token(1).kind == kind
    }

    /// Whether the token `depth` positions ahead has the given kind.
    pub fn peek_at(&mut self, kind: TokenKind, depth: usize) -> bool {
        self.peek_token(depth).kind == kind
    }

    /// Consume the next token and return its kind. At end of input this keeps
    /// returning `EndOfFile`.
    pub fn next_token(&mut self) -> TokenKind {
        self.fill(1);
        if let Some((token, errors)) = self.queue.pop_front() {
            if token.kind != TokenKind::EndOfFile {
                self.consumed += 1;
            }
            self.consumed_errors += errors;
            self.current = token;
        }
        self.current.kind
    }

    /// The most recently consumed token.
    pub fn token(&self) -> &Token {
        &self.current
    }

    /// Whether the next token is the end of input.
    pub fn eof(&mut self) -> bool {
        self.peek(TokenKind::EndOfFile)
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Scanner errors raised by the tokens consumed so far. Errors from
    /// tokens that are only peeked are not counted until they are consumed.
    pub fn consumed_errors(&self) -> usize {
        self.consumed_errors
    }

    /// Finish scanning and return the diverted trivia and scanner diagnostics.
    pub fn into_parts(self) -> (Vec<Token>, DiagnosticCollection) {
        let mut scanner = self.scanner;
        (self.trivia, scanner.take_diagnostics())
    }
}
