//! Single-line statements.
//!
//! Every production here consumes its introducing keyword, parses the rest
//! of the statement with placeholders for anything missing, and closes the
//! node at the last consumed token.

use crate::block::{finish_statement, start_node};
use crate::context::ParseContext;
use crate::expressions::{
    expect_expression, parse_expression, parse_expression_list, parse_name_expression,
    parse_name_list,
};
use crate::parser::Parser;
use crate::utilities::{can_start_expression, is_exit_type};
use fgl_ast::{
    AstNode, CallStatement, ContinueStatement, CursorDef, CursorKind, CursorStatement,
    DeclareStatement, ExitStatement, Expression, InitializeStatement, LetStatement,
    MenuOptionControl, NodeKind, OutputStatement, PrepareStatement, ReturnStatement, RunStatement,
    SleepStatement, TokenKind, WheneverStatement,
};
use fgl_core::text::TextSpan;
use fgl_diagnostics::messages;

/// `LET target = expr {, expr}`
pub fn parse_let(parser: &mut Parser, _ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let node = start_node(parser, NodeKind::Let(LetStatement { target: None, values: Vec::new() }));
    parser.next_token();

    let target = parse_name_expression(parser);
    if target.is_none() {
        parser.error_at_next(&messages::IDENTIFIER_EXPECTED, &[]);
    }
    let values = if parser.expect(TokenKind::EqualsToken) {
        parse_expression_list(parser)
    } else {
        Vec::new()
    };

    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::Let(LetStatement { target, values });
    Some(node)
}

/// `CALL name(args) [RETURNING v {, v}]`
pub fn parse_call(parser: &mut Parser, _ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let node = start_node(parser, NodeKind::Call(CallStatement { call: None, returning: Vec::new() }));
    parser.next_token();

    let call = match parse_expression(parser) {
        Some(expr @ Expression::Call(_)) => Some(expr),
        Some(other) => {
            // `CALL f` without parentheses
            parser.error_at_next(&messages::_0_EXPECTED, &["("]);
            Some(other)
        }
        None => {
            parser.error_at_next(&messages::IDENTIFIER_EXPECTED, &[]);
            None
        }
    };
    let returning = if parser.optional(TokenKind::ReturningKeyword) {
        parse_name_list(parser)
    } else {
        Vec::new()
    };

    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::Call(CallStatement { call, returning });
    Some(node)
}

/// `RETURN [expr {, expr}]`
pub fn parse_return(parser: &mut Parser, ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let node = start_node(parser, NodeKind::Return(ReturnStatement::default()));
    parser.next_token();

    let values = if can_start_expression(parser.peek_kind()) {
        parse_expression_list(parser)
    } else {
        Vec::new()
    };
    match ctx.return_binder {
        Some(binder) => binder.bind_return(values.len()),
        None if !values.is_empty() => {
            let span = TextSpan::from_bounds(node.start_index(), parser.last_end());
            parser.report_syntax_error(&messages::RETURN_VALUES_ARE_ONLY_ALLOWED_INSIDE_A_FUNCTION, &[], span);
        }
        None => {}
    }

    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::Return(ReturnStatement { values });
    Some(node)
}

/// `DISPLAY`, `MESSAGE` or `ERROR` followed by values, an optional
/// `AT row, column` and an optional `ATTRIBUTES(...)` list, which is skipped.
pub fn parse_output(parser: &mut Parser, _ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let keyword = parser.peek_kind();
    let node = start_node(parser, NodeKind::Output(OutputStatement { keyword, values: Vec::new() }));
    parser.next_token();

    let mut values = if can_start_expression(parser.peek_kind()) {
        parse_expression_list(parser)
    } else {
        Vec::new()
    };
    // `AT row, column` positions the output; the coordinates are kept as
    // trailing values.
    if parser.optional(TokenKind::AtKeyword) {
        values.extend(parse_expression_list(parser));
    }
    if parser.peek(TokenKind::AttributesKeyword) && parser.peek_at(TokenKind::OpenParenToken, 2) {
        parser.next_token();
        skip_parenthesized(parser);
    }

    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::Output(OutputStatement { keyword, values });
    Some(node)
}

/// Skip a balanced `( ... )` group starting at the next token.
fn skip_parenthesized(parser: &mut Parser) {
    let mut depth = 0usize;
    loop {
        match parser.peek_kind() {
            TokenKind::EndOfFile => {
                parser.error_at_next(&messages::_0_EXPECTED, &[")"]);
                return;
            }
            TokenKind::OpenParenToken => depth += 1,
            TokenKind::CloseParenToken => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    parser.next_token();
                    return;
                }
            }
            _ => {}
        }
        parser.next_token();
    }
}

/// `SLEEP seconds`
pub fn parse_sleep(parser: &mut Parser, _ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let node = start_node(parser, NodeKind::Sleep(SleepStatement { seconds: None }));
    parser.next_token();
    let seconds = Some(expect_expression(parser));
    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::Sleep(SleepStatement { seconds });
    Some(node)
}

/// `INITIALIZE v {, v} TO NULL`
pub fn parse_initialize(parser: &mut Parser, _ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let node = start_node(parser, NodeKind::Initialize(InitializeStatement::default()));
    parser.next_token();
    let targets = parse_name_list(parser);
    if parser.expect(TokenKind::ToKeyword) {
        parser.expect(TokenKind::NullKeyword);
    }
    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::Initialize(InitializeStatement { targets });
    Some(node)
}

/// `EXIT <block>` or `EXIT PROGRAM [code]`. Whether the target encloses the
/// statement is checked by the enclosing block body.
pub fn parse_exit(parser: &mut Parser, _ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let node = start_node(parser, NodeKind::Exit(ExitStatement { exit_type: None, value: None }));
    parser.next_token();

    let mut exit_type = None;
    let mut value = None;
    if is_exit_type(parser.peek_kind()) {
        let kind = parser.next_token();
        exit_type = Some(kind);
        if kind == TokenKind::ProgramKeyword
            && can_start_expression(parser.peek_kind())
            && !parser.peek_token(1).has_preceding_line_break()
        {
            value = parse_expression(parser);
        }
    } else {
        parser.error_at_next(&messages::BLOCK_KEYWORD_EXPECTED_AFTER_0, &["exit"]);
    }

    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::Exit(ExitStatement { exit_type, value });
    Some(node)
}

/// `CONTINUE <block>`
pub fn parse_continue(parser: &mut Parser, _ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let node = start_node(parser, NodeKind::Continue(ContinueStatement { continue_type: None }));
    parser.next_token();

    let continue_type = if is_exit_type(parser.peek_kind()) && !parser.peek(TokenKind::ProgramKeyword) {
        Some(parser.next_token())
    } else {
        parser.error_at_next(&messages::BLOCK_KEYWORD_EXPECTED_AFTER_0, &["continue"]);
        None
    };

    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::Continue(ContinueStatement { continue_type });
    Some(node)
}

/// Offer a PREPARE or DECLARE name to the enclosing binders; report it when
/// none takes it.
fn bind_cursor(parser: &mut Parser, ctx: &ParseContext<'_>, name: &Option<(String, TextSpan)>, kind: CursorKind) {
    let Some((name, span)) = name else {
        return;
    };
    let cursor = CursorDef {
        name: name.clone(),
        span: *span,
        kind,
    };
    if !ctx.bind_cursor(cursor) {
        parser.report_syntax_error(&messages::CURSOR_0_CANNOT_BE_DECLARED_HERE, &[name.as_str()], *span);
    }
}

/// `PREPARE name FROM expr`
pub fn parse_prepare(parser: &mut Parser, ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let node = start_node(parser, NodeKind::Prepare(PrepareStatement { name: None, source: None }));
    parser.next_token();

    let name = parser.expect_identifier();
    bind_cursor(parser, ctx, &name, CursorKind::Prepared);
    let source = if parser.expect(TokenKind::FromKeyword) {
        Some(expect_expression(parser))
    } else {
        None
    };

    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::Prepare(PrepareStatement {
        name: name.map(|(n, _)| n),
        source,
    });
    Some(node)
}

/// `DECLARE name [SCROLL] CURSOR [WITH HOLD] FOR prepared | FROM expr`
pub fn parse_declare(parser: &mut Parser, ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let mut statement = DeclareStatement {
        name: None,
        scroll: false,
        with_hold: false,
        prepared: None,
        source: None,
    };
    let node = start_node(parser, NodeKind::Declare(statement.clone()));
    parser.next_token();

    let name = parser.expect_identifier();
    bind_cursor(parser, ctx, &name, CursorKind::Declared);
    statement.name = name.map(|(n, _)| n);
    statement.scroll = parser.optional(TokenKind::ScrollKeyword);
    parser.expect(TokenKind::CursorKeyword);
    if parser.optional(TokenKind::WithKeyword) {
        statement.with_hold = parser.expect(TokenKind::HoldKeyword);
    }
    if parser.optional(TokenKind::ForKeyword) {
        statement.prepared = parser.expect_identifier().map(|(n, _)| n);
    } else if parser.optional(TokenKind::FromKeyword) {
        statement.source = Some(expect_expression(parser));
    } else {
        parser.error_at_next(&messages::_0_EXPECTED, &[TokenKind::ForKeyword.text()]);
    }

    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::Declare(statement);
    Some(node)
}

/// `OPEN c [USING ...]`, `CLOSE c`, `FREE c`,
/// `FETCH [NEXT|PREVIOUS|FIRST|LAST] c [INTO ...]`,
/// `EXECUTE p [USING ...] [INTO ...]`
pub fn parse_cursor_statement(parser: &mut Parser, _ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let operation = parser.peek_kind();
    let mut statement = CursorStatement {
        operation,
        name: None,
        fetch_direction: None,
        using: Vec::new(),
        into: Vec::new(),
    };
    let node = start_node(parser, NodeKind::Cursor(statement.clone()));
    parser.next_token();

    if operation == TokenKind::FetchKeyword
        && matches!(
            parser.peek_kind(),
            TokenKind::NextKeyword | TokenKind::PreviousKeyword | TokenKind::FirstKeyword | TokenKind::LastKeyword
        )
        && parser.peek_token(2).kind.can_be_identifier()
    {
        statement.fetch_direction = Some(parser.next_token());
    }
    statement.name = parser.expect_identifier().map(|(n, _)| n);

    let takes_using = matches!(operation, TokenKind::OpenKeyword | TokenKind::ExecuteKeyword);
    let takes_into = matches!(operation, TokenKind::FetchKeyword | TokenKind::ExecuteKeyword);
    if takes_using && parser.optional(TokenKind::UsingKeyword) {
        statement.using = parse_expression_list(parser);
    }
    if takes_into && parser.optional(TokenKind::IntoKeyword) {
        statement.into = parse_name_list(parser);
    }

    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::Cursor(statement);
    Some(node)
}

/// `WHENEVER [ANY] ERROR | SQLERROR | WARNING | NOT FOUND`
/// `CONTINUE | STOP | RAISE | CALL name | GOTO name`
pub fn parse_whenever(parser: &mut Parser, _ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let node = start_node(
        parser,
        NodeKind::Whenever(WheneverStatement {
            condition: String::new(),
            action: String::new(),
        }),
    );
    parser.next_token();

    let condition = match parser.peek_kind() {
        TokenKind::AnyKeyword => {
            parser.next_token();
            parser.expect(TokenKind::ErrorKeyword);
            "any error".to_string()
        }
        TokenKind::NotKeyword => {
            parser.next_token();
            parser.expect(TokenKind::FoundKeyword);
            "not found".to_string()
        }
        kind @ (TokenKind::ErrorKeyword | TokenKind::SqlerrorKeyword | TokenKind::WarningKeyword) => {
            parser.next_token();
            kind.text().to_string()
        }
        _ => {
            parser.error_at_next(&messages::_0_EXPECTED, &[TokenKind::ErrorKeyword.text()]);
            String::new()
        }
    };

    let action = match parser.peek_kind() {
        kind @ (TokenKind::ContinueKeyword | TokenKind::StopKeyword | TokenKind::RaiseKeyword) => {
            parser.next_token();
            kind.text().to_string()
        }
        kind @ (TokenKind::CallKeyword | TokenKind::GotoKeyword) => {
            parser.next_token();
            match parser.expect_identifier() {
                Some((name, _)) => format!("{} {}", kind.text(), name),
                None => kind.text().to_string(),
            }
        }
        _ => {
            parser.error_at_next(&messages::_0_EXPECTED, &[TokenKind::ContinueKeyword.text()]);
            String::new()
        }
    };

    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::Whenever(WheneverStatement { condition, action });
    Some(node)
}

/// `RUN command [RETURNING v] [WITHOUT WAITING]`
pub fn parse_run(parser: &mut Parser, _ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let mut statement = RunStatement {
        command: None,
        returning: None,
        without_waiting: false,
    };
    let node = start_node(parser, NodeKind::Run(statement.clone()));
    parser.next_token();

    statement.command = Some(expect_expression(parser));
    if parser.optional(TokenKind::ReturningKeyword) {
        statement.returning = parse_name_expression(parser);
        if statement.returning.is_none() {
            parser.error_at_next(&messages::IDENTIFIER_EXPECTED, &[]);
        }
    }
    if parser.optional(TokenKind::WithoutKeyword) {
        statement.without_waiting = parser.expect(TokenKind::WaitingKeyword);
    }

    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::Run(statement);
    Some(node)
}

/// `NEXT OPTION name`, `SHOW OPTION ALL | names`, `HIDE OPTION ALL | names`.
/// Only contributed inside menu bodies.
pub fn parse_menu_option_control(parser: &mut Parser, _ctx: &ParseContext<'_>) -> Option<AstNode> {
    if !parser.peek_at(TokenKind::OptionKeyword, 2) {
        return None;
    }
    let errors = parser.error_count();
    let action = parser.peek_kind();
    let mut control = MenuOptionControl {
        action,
        options: Vec::new(),
        all: false,
    };
    let node = start_node(parser, NodeKind::MenuOptionControl(control.clone()));
    parser.next_token();
    parser.next_token();

    if action != TokenKind::NextKeyword && parser.optional(TokenKind::AllKeyword) {
        control.all = true;
    } else if action == TokenKind::NextKeyword {
        control.options.push(expect_expression(parser));
    } else {
        control.options = parse_expression_list(parser);
    }

    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::MenuOptionControl(control);
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{LoopCursorBinder, ModuleScope};
    use crate::parser::ParseOptions;

    #[test]
    fn test_unbound_prepare_is_reported() {
        let module = ModuleScope::new();
        let foreach = LoopCursorBinder::new("c1");
        let mut root = ParseContext::root(&module);
        root.prepare_binders.clear();
        let ctx = root.with_prepare_binder(&foreach);

        let mut parser = Parser::new("PREPARE st FROM \"select 1\"", &ParseOptions::default());
        let node = parse_prepare(&mut parser, &ctx).unwrap();
        assert!(!node.is_complete());
        let (diagnostics, _) = parser.finish();
        let reported: Vec<_> = diagnostics.iter().map(|d| (d.code, d.span)).collect();
        assert_eq!(reported, vec![(2021, Some(TextSpan::new(8, 2)))]);
        assert!(module.scope.into_summary().cursors.is_empty());
    }
}
