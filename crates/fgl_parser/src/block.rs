//! The shared block-body protocol.
//!
//! Every block construct parses its header, then hands its body to
//! [`parse_block_body`] with a derived context, then closes itself with
//! [`finish_block`]. The body loop stops without consuming anything when it
//! sees the block's own terminator, an ancestor's `END <keyword>`, one of the
//! context's stop tokens, or end of input.

use crate::context::ParseContext;
use crate::parser::Parser;
use crate::registry::{dispatch_statement, StatementProduction};
use fgl_ast::{AstNode, NodeChildren, NodeKind, TokenKind};
use fgl_core::text::{TextPos, TextSpan};
use fgl_diagnostics::messages;

/// Why a block body stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyStop {
    /// `END <terminator>` is next.
    Terminator,
    /// `END <keyword>` of an enclosing block is next.
    AncestorEnd,
    /// A stop token of the context is next.
    StopToken(TokenKind),
    EndOfFile,
}

/// Whether `END keyword` is next.
pub fn peek_end(parser: &mut Parser, keyword: TokenKind) -> bool {
    parser.peek(TokenKind::EndKeyword) && parser.peek_at(keyword, 2)
}

/// Check the shared stop conditions, in protocol order.
fn check_stop(
    parser: &mut Parser,
    ctx: &ParseContext<'_>,
    terminator: Option<TokenKind>,
) -> Option<BodyStop> {
    if parser.eof() {
        return Some(BodyStop::EndOfFile);
    }
    if parser.peek(TokenKind::EndKeyword) {
        let keyword = parser.peek_token(2).kind;
        if Some(keyword) == terminator {
            return Some(BodyStop::Terminator);
        }
        if ctx.is_end_keyword(keyword) {
            return Some(BodyStop::AncestorEnd);
        }
    }
    None
}

/// Parse statements into `children` until the body stops.
pub fn parse_block_body(
    parser: &mut Parser,
    ctx: &ParseContext<'_>,
    terminator: Option<TokenKind>,
    productions: &'static [StatementProduction],
    children: &mut NodeChildren,
) -> BodyStop {
    let mut reported_unexpected = false;
    loop {
        if let Some(stop) = check_stop(parser, ctx, terminator) {
            return stop;
        }
        let kind = parser.peek_kind();
        if ctx.is_stop_token(kind) {
            return BodyStop::StopToken(kind);
        }

        let before = parser.consumed();
        match dispatch_statement(parser, ctx, productions) {
            Some(node) => {
                validate_exit_target(parser, ctx, &node);
                children.insert(node.start_index(), node);
                reported_unexpected = false;
            }
            None if parser.consumed() != before => {}
            None => {
                skip_unexpected_token(parser, &messages::UNEXPECTED_TOKEN_0, !reported_unexpected);
                reported_unexpected = true;
            }
        }
    }
}

/// Parse a list of clauses (`WHEN`, menu options) until the body stops.
/// `try_clause` returns `None` without consuming when no clause starts at
/// the next token.
pub fn parse_clause_list(
    parser: &mut Parser,
    ctx: &ParseContext<'_>,
    terminator: TokenKind,
    children: &mut NodeChildren,
    try_clause: &mut dyn FnMut(&mut Parser) -> Option<AstNode>,
) -> BodyStop {
    let mut reported_unexpected = false;
    loop {
        if let Some(stop) = check_stop(parser, ctx, Some(terminator)) {
            return stop;
        }
        if let Some(clause) = try_clause(parser) {
            children.insert(clause.start_index(), clause);
            reported_unexpected = false;
            continue;
        }
        let kind = parser.peek_kind();
        if ctx.is_stop_token(kind) {
            return BodyStop::StopToken(kind);
        }
        skip_unexpected_token(parser, &messages::UNEXPECTED_TOKEN_0, !reported_unexpected);
        reported_unexpected = true;
    }
}

/// Skip one token that no production accepted. A stray `END <keyword>` on
/// one line is skipped as a unit and always reported; other tokens are
/// reported when `report` is set.
pub fn skip_unexpected_token(
    parser: &mut Parser,
    message: &fgl_diagnostics::DiagnosticMessage,
    report: bool,
) {
    if parser.peek(TokenKind::EndKeyword) {
        let next = parser.peek_token(2);
        if next.kind.is_keyword() && !next.has_preceding_line_break() {
            let keyword = next.kind.text();
            let start = parser.next_pos();
            parser.next_token();
            parser.next_token();
            let span = TextSpan::from_bounds(start, parser.last_end());
            parser.report_syntax_error(&messages::UNEXPECTED_END_0, &[keyword], span);
            return;
        }
    }
    if report {
        let text = parser.peek_token(1).text.clone();
        parser.error_at_next(message, &[&text]);
    }
    parser.next_token();
}

/// Report `EXIT`/`CONTINUE` statements whose target block does not enclose
/// them.
fn validate_exit_target(parser: &mut Parser, ctx: &ParseContext<'_>, node: &AstNode) {
    let (keyword, target, valid) = match &node.kind {
        NodeKind::Exit(exit) => match exit.exit_type {
            Some(TokenKind::ProgramKeyword) | None => return,
            Some(target) => ("exit", target, ctx.valid_exit_keywords.contains(&target)),
        },
        NodeKind::Continue(cont) => match cont.continue_type {
            None => return,
            Some(target) => (
                "continue",
                target,
                crate::utilities::is_continue_type(target)
                    && ctx.valid_exit_keywords.contains(&target),
            ),
        },
        _ => return,
    };
    if !valid {
        parser.report_syntax_error(
            &messages::_0_1_IS_NOT_VALID_OUTSIDE_A_1_BLOCK,
            &[keyword, target.text()],
            node.span(),
        );
    }
}

/// Start a node at the next token. Call before consuming the introducer.
pub fn start_node(parser: &mut Parser, kind: NodeKind) -> AstNode {
    let start = parser.next_pos();
    AstNode::new(kind, start)
}

/// Close a single-line statement: its header is the whole statement.
pub fn finish_statement(parser: &Parser, mut node: AstNode, errors_before: usize) -> AstNode {
    let end = parser.last_end().max(node.start_index());
    node.data.end_index = end;
    node.data.decorator_end = end;
    node.data.is_complete = parser.error_count() == errors_before;
    node
}

/// Mark the end of a block header.
pub fn end_header(parser: &Parser, node: &mut AstNode) {
    let end = parser.last_end().max(node.start_index());
    node.data.decorator_end = end;
    node.data.end_index = end;
}

/// Close a block after its body stopped with `stop`. Consumes
/// `END <keyword>` on [`BodyStop::Terminator`]; otherwise reports the
/// missing terminator once at the block header and leaves the node ending
/// at the last consumed token.
pub fn finish_block(
    parser: &mut Parser,
    mut node: AstNode,
    stop: BodyStop,
    keyword: TokenKind,
    errors_before: usize,
) -> AstNode {
    if stop == BodyStop::Terminator {
        parser.next_token();
        parser.next_token();
    } else {
        let header = TextSpan::from_bounds(node.start_index(), node.decorator_end());
        let terminator = format!("end {}", keyword.text());
        parser.report_syntax_error(
            &messages::A_0_STATEMENT_MUST_BE_TERMINATED_WITH_1,
            &[keyword.text(), &terminator],
            header,
        );
    }
    close_node(parser, &mut node, errors_before);
    node
}

/// Set the end of a node to the last consumed token and record whether
/// any error was reported while it was parsed.
pub fn close_node(parser: &Parser, node: &mut AstNode, errors_before: usize) {
    let end: TextPos = parser.last_end().max(node.decorator_end());
    node.data.end_index = end;
    node.data.is_complete = parser.error_count() == errors_before;
}
