//! Block statements: IF, WHILE, FOR, FOREACH, CASE, TRY and MENU.
//!
//! Each production parses its header, records the header end as the node's
//! decorator end, parses its body with a derived context and closes itself
//! through `finish_block`.

use crate::block::{
    close_node, end_header, finish_block, parse_block_body, parse_clause_list, start_node,
    BodyStop,
};
use crate::context::{LoopCursorBinder, ParseContext};
use crate::expressions::{
    expect_expression, parse_expression, parse_expression_list, parse_name_expression,
    parse_name_list,
};
use crate::parser::Parser;
use crate::registry::{MENU_STATEMENTS, STATEMENTS};
use crate::utilities::can_start_expression;
use fgl_ast::{
    AstNode, CaseStatement, ForStatement, ForeachStatement, IfStatement, MenuClause, MenuOption,
    MenuStatement, NodeKind, TokenKind, WhenClause, WhileStatement,
};
use fgl_core::text::TextSpan;
use fgl_diagnostics::messages;

/// `IF cond THEN ... [ELSE ...] END IF`
pub fn parse_if(parser: &mut Parser, ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let mut node = start_node(parser, NodeKind::If(IfStatement { condition: None }));
    parser.next_token();
    let condition = Some(expect_expression(parser));
    parser.expect(TokenKind::ThenKeyword);
    node.kind = NodeKind::If(IfStatement { condition });
    end_header(parser, &mut node);

    let body_ctx = ctx.with_end_keyword(TokenKind::IfKeyword);
    let then_ctx = body_ctx.with_stop_tokens(&[TokenKind::ElseKeyword]);
    let mut stop = parse_block_body(parser, &then_ctx, Some(TokenKind::IfKeyword), STATEMENTS, &mut node.children);

    if stop == BodyStop::StopToken(TokenKind::ElseKeyword) {
        let else_errors = parser.error_count();
        let mut else_node = start_node(parser, NodeKind::Else);
        parser.next_token();
        end_header(parser, &mut else_node);
        stop = parse_block_body(parser, &body_ctx, Some(TokenKind::IfKeyword), STATEMENTS, &mut else_node.children);
        close_node(parser, &mut else_node, else_errors);
        node.add_child(else_node);
    }

    Some(finish_block(parser, node, stop, TokenKind::IfKeyword, errors))
}

/// `WHILE cond ... END WHILE`
pub fn parse_while(parser: &mut Parser, ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let mut node = start_node(parser, NodeKind::While(WhileStatement { condition: None }));
    parser.next_token();
    let condition = Some(expect_expression(parser));
    node.kind = NodeKind::While(WhileStatement { condition });
    end_header(parser, &mut node);

    let body_ctx = ctx
        .with_end_keyword(TokenKind::WhileKeyword)
        .with_valid_exit(TokenKind::WhileKeyword);
    let stop = parse_block_body(parser, &body_ctx, Some(TokenKind::WhileKeyword), STATEMENTS, &mut node.children);
    Some(finish_block(parser, node, stop, TokenKind::WhileKeyword, errors))
}

/// `FOR counter = start TO end [STEP step] ... END FOR`
pub fn parse_for(parser: &mut Parser, ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let mut statement = ForStatement {
        counter_variable: None,
        start_value: None,
        end_value: None,
        step_value: None,
    };
    let mut node = start_node(parser, NodeKind::For(statement.clone()));
    parser.next_token();

    statement.counter_variable = parse_name_expression(parser);
    if statement.counter_variable.is_none() {
        parser.error_at_next(&messages::MISSING_COUNTER_VARIABLE_IN_FOR_STATEMENT, &[]);
    }
    if parser.expect(TokenKind::EqualsToken) {
        statement.start_value = Some(expect_expression(parser));
    }
    if parser.expect(TokenKind::ToKeyword) {
        statement.end_value = Some(expect_expression(parser));
    }
    if parser.optional(TokenKind::StepKeyword) {
        statement.step_value = Some(expect_expression(parser));
    }
    node.kind = NodeKind::For(statement);
    end_header(parser, &mut node);

    let body_ctx = ctx
        .with_end_keyword(TokenKind::ForKeyword)
        .with_valid_exit(TokenKind::ForKeyword);
    let stop = parse_block_body(parser, &body_ctx, Some(TokenKind::ForKeyword), STATEMENTS, &mut node.children);
    Some(finish_block(parser, node, stop, TokenKind::ForKeyword, errors))
}

/// `FOREACH cursor [USING ...] [INTO ...] [WITH REOPTIMIZATION] ... END FOREACH`
pub fn parse_foreach(parser: &mut Parser, ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let mut statement = ForeachStatement {
        cursor: None,
        using: Vec::new(),
        into: Vec::new(),
        reoptimization: false,
        redeclarations: Vec::new(),
    };
    let mut node = start_node(parser, NodeKind::Foreach(statement.clone()));
    parser.next_token();

    statement.cursor = parser.expect_identifier().map(|(name, _)| name);
    if parser.optional(TokenKind::UsingKeyword) {
        statement.using = parse_expression_list(parser);
    }
    if parser.optional(TokenKind::IntoKeyword) {
        statement.into = parse_name_list(parser);
    }
    if parser.peek(TokenKind::WithKeyword) && parser.peek_at(TokenKind::ReoptimizationKeyword, 2) {
        parser.next_token();
        parser.next_token();
        statement.reoptimization = true;
    }
    node.kind = NodeKind::Foreach(statement.clone());
    end_header(parser, &mut node);

    let binder = LoopCursorBinder::new(statement.cursor.clone().unwrap_or_default());
    let stop = {
        let body_ctx = ctx
            .with_end_keyword(TokenKind::ForeachKeyword)
            .with_valid_exit(TokenKind::ForeachKeyword)
            .with_prepare_binder(&binder);
        parse_block_body(parser, &body_ctx, Some(TokenKind::ForeachKeyword), STATEMENTS, &mut node.children)
    };
    statement.redeclarations = binder.into_redeclarations();
    for cursor in &statement.redeclarations {
        parser.report_syntax_error(
            &messages::CURSOR_0_IS_REDECLARED_INSIDE_THE_FOREACH_THAT_ITERATES_IT,
            &[cursor.name.as_str()],
            cursor.span,
        );
    }
    node.kind = NodeKind::Foreach(statement);
    Some(finish_block(parser, node, stop, TokenKind::ForeachKeyword, errors))
}

/// `CASE [subject] {WHEN values ...} [OTHERWISE ...] END CASE`
pub fn parse_case(parser: &mut Parser, ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let mut node = start_node(parser, NodeKind::Case(CaseStatement { subject: None }));
    parser.next_token();
    let subject = if can_start_expression(parser.peek_kind()) {
        parse_expression(parser)
    } else {
        None
    };
    node.kind = NodeKind::Case(CaseStatement { subject });
    end_header(parser, &mut node);

    let case_ctx = ctx.with_end_keyword(TokenKind::CaseKeyword);
    let clause_ctx = case_ctx
        .with_valid_exit(TokenKind::CaseKeyword)
        .with_stop_tokens(&[TokenKind::WhenKeyword, TokenKind::OtherwiseKeyword]);
    let mut seen_otherwise = false;
    let stop = parse_clause_list(parser, &case_ctx, TokenKind::CaseKeyword, &mut node.children, &mut |parser: &mut Parser| {
        parse_case_clause(parser, &clause_ctx, &mut seen_otherwise)
    });
    Some(finish_block(parser, node, stop, TokenKind::CaseKeyword, errors))
}

fn parse_case_clause(parser: &mut Parser, ctx: &ParseContext<'_>, seen_otherwise: &mut bool) -> Option<AstNode> {
    let errors = parser.error_count();
    let mut clause = match parser.peek_kind() {
        TokenKind::WhenKeyword => {
            let mut clause = start_node(parser, NodeKind::When(WhenClause { conditions: Vec::new() }));
            parser.next_token();
            let conditions = parse_expression_list(parser);
            clause.kind = NodeKind::When(WhenClause { conditions });
            clause
        }
        TokenKind::OtherwiseKeyword => {
            let clause = start_node(parser, NodeKind::Otherwise);
            parser.next_token();
            if *seen_otherwise {
                let span = TextSpan::from_bounds(clause.start_index(), parser.last_end());
                parser.report_syntax_error(&messages::A_CASE_STATEMENT_CAN_ONLY_HAVE_ONE_OTHERWISE_CLAUSE, &[], span);
            }
            *seen_otherwise = true;
            clause
        }
        _ => return None,
    };
    end_header(parser, &mut clause);
    parse_block_body(parser, ctx, None, STATEMENTS, &mut clause.children);
    close_node(parser, &mut clause, errors);
    Some(clause)
}

/// `TRY ... [CATCH ...] END TRY`
pub fn parse_try(parser: &mut Parser, ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let mut node = start_node(parser, NodeKind::Try);
    parser.next_token();
    end_header(parser, &mut node);

    let body_ctx = ctx.with_end_keyword(TokenKind::TryKeyword);
    let try_ctx = body_ctx.with_stop_tokens(&[TokenKind::CatchKeyword]);
    let mut stop = parse_block_body(parser, &try_ctx, Some(TokenKind::TryKeyword), STATEMENTS, &mut node.children);

    if stop == BodyStop::StopToken(TokenKind::CatchKeyword) {
        let catch_errors = parser.error_count();
        let mut catch_node = start_node(parser, NodeKind::Catch);
        parser.next_token();
        end_header(parser, &mut catch_node);
        stop = parse_block_body(parser, &body_ctx, Some(TokenKind::TryKeyword), STATEMENTS, &mut catch_node.children);
        close_node(parser, &mut catch_node, catch_errors);
        node.add_child(catch_node);
    }

    Some(finish_block(parser, node, stop, TokenKind::TryKeyword, errors))
}

/// Keywords that start a menu clause; they end the previous clause body.
const MENU_CLAUSE_KEYWORDS: &[TokenKind] = &[
    TokenKind::BeforeKeyword,
    TokenKind::CommandKeyword,
    TokenKind::OnKeyword,
];

/// `MENU [title] {clause ...} END MENU`
pub fn parse_menu(parser: &mut Parser, ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let mut node = start_node(parser, NodeKind::Menu(MenuStatement { title: None }));
    parser.next_token();
    let title = if MENU_CLAUSE_KEYWORDS.contains(&parser.peek_kind()) {
        None
    } else {
        parse_expression(parser)
    };
    node.kind = NodeKind::Menu(MenuStatement { title });
    end_header(parser, &mut node);

    let menu_ctx = ctx.with_end_keyword(TokenKind::MenuKeyword);
    let option_ctx = menu_ctx
        .with_valid_exit(TokenKind::MenuKeyword)
        .with_stop_tokens(MENU_CLAUSE_KEYWORDS)
        .with_context_statements(MENU_STATEMENTS);
    let mut selectable_options = 0usize;
    let stop = parse_clause_list(parser, &menu_ctx, TokenKind::MenuKeyword, &mut node.children, &mut |parser: &mut Parser| {
        parse_menu_clause(parser, &option_ctx, &mut selectable_options)
    });

    if selectable_options == 0 {
        let header = TextSpan::from_bounds(node.start_index(), node.decorator_end());
        parser.report_syntax_error(&messages::A_MENU_MUST_HAVE_AT_LEAST_ONE_OPTION, &[], header);
    }
    Some(finish_block(parser, node, stop, TokenKind::MenuKeyword, errors))
}

fn parse_menu_clause(parser: &mut Parser, ctx: &ParseContext<'_>, selectable_options: &mut usize) -> Option<AstNode> {
    let errors = parser.error_count();
    let start = parser.next_pos();
    let clause = match parser.peek_kind() {
        TokenKind::BeforeKeyword if parser.peek_at(TokenKind::MenuKeyword, 2) => {
            parser.next_token();
            parser.next_token();
            MenuClause::BeforeMenu
        }
        TokenKind::CommandKeyword => {
            parser.next_token();
            *selectable_options += 1;
            parse_command_clause(parser)
        }
        TokenKind::OnKeyword if parser.peek_at(TokenKind::ActionKeyword, 2) => {
            parser.next_token();
            parser.next_token();
            *selectable_options += 1;
            let name = parser
                .expect_identifier()
                .map(|(name, _)| name)
                .unwrap_or_default();
            MenuClause::Action { name }
        }
        TokenKind::OnKeyword if parser.peek_at(TokenKind::IdleKeyword, 2) => {
            parser.next_token();
            parser.next_token();
            MenuClause::Idle {
                seconds: Some(expect_expression(parser)),
            }
        }
        _ => return None,
    };

    let mut option = AstNode::new(NodeKind::MenuOption(MenuOption { clause }), start);
    end_header(parser, &mut option);
    parse_block_body(parser, ctx, None, STATEMENTS, &mut option.children);
    close_node(parser, &mut option, errors);
    Some(option)
}

/// `COMMAND [KEY (k {, k})] [name [help]]` after the `COMMAND` keyword.
fn parse_command_clause(parser: &mut Parser) -> MenuClause {
    let mut key = Vec::new();
    if parser.optional(TokenKind::KeyKeyword) && parser.expect(TokenKind::OpenParenToken) {
        loop {
            let token = parser.peek_token(1);
            let is_key = token.kind.can_be_identifier() || token.kind.is_keyword() || token.kind.is_literal();
            if !is_key {
                parser.error_at_next(&messages::IDENTIFIER_EXPECTED, &[]);
                break;
            }
            parser.next_token();
            key.push(parser.token().value().into_owned());
            if !parser.optional(TokenKind::CommaToken) {
                break;
            }
        }
        parser.expect(TokenKind::CloseParenToken);
    }

    let name = if can_start_expression(parser.peek_kind()) {
        parse_expression(parser)
    } else {
        None
    };
    let help = if name.is_some()
        && can_start_expression(parser.peek_kind())
        && !parser.peek_token(1).has_preceding_line_break()
    {
        parse_expression(parser)
    } else {
        None
    };
    MenuClause::Command { key, name, help }
}
