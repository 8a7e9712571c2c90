//! Module-level productions: IMPORT, SCHEMA/DATABASE, GLOBALS, MAIN and
//! FUNCTION, plus the module loop itself.

use crate::block::{
    end_header, finish_block, finish_statement, parse_block_body, skip_unexpected_token,
    start_node,
};
use crate::context::{DeclarationScope, ModuleScope, ParseContext, VariableAdder};
use crate::declarations::parse_access_modifier;
use crate::parser::Parser;
use crate::registry::{dispatch_statement, GLOBALS_MEMBERS, MODULE_MEMBERS, STATEMENTS};
use fgl_ast::{
    AccessModifier, AstNode, DatabaseStatement, FunctionBlock, FunctionSignature, GlobalsBlock,
    GlobalsInclude, ImportKind, ImportStatement, MainBlock, ModuleNode, NodeKind, ScopeSummary, TokenKind,
};
use fgl_core::text::TextSpan;
use fgl_diagnostics::messages;

/// Parse a whole module. The module node always spans the entire text.
pub fn parse_module_node(parser: &mut Parser) -> AstNode {
    let module = ModuleScope::new();
    let ctx = ParseContext::root(&module);
    let mut node = AstNode::new(NodeKind::Module(ModuleNode::default()), 0);

    let mut reported_unexpected = false;
    while !parser.eof() {
        let before = parser.consumed();
        match dispatch_statement(parser, &ctx, MODULE_MEMBERS) {
            Some(member) => {
                node.add_child(member);
                reported_unexpected = false;
            }
            None if parser.consumed() != before => {}
            None => {
                skip_unexpected_token(parser, &messages::UNEXPECTED_TOKEN_0_AT_MODULE_LEVEL, !reported_unexpected);
                reported_unexpected = true;
            }
        }
    }

    // Trailing scanner errors (an unterminated comment) ride on EndOfFile.
    parser.next_token();

    let (scope, globals, functions, imports) = module.into_parts();
    node.kind = NodeKind::Module(ModuleNode {
        scope,
        globals,
        functions,
        imports,
    });
    node.data.end_index = parser.text_len();
    node.data.decorator_end = 0;
    node.data.is_complete = parser.error_count() == 0;
    node
}

/// `IMPORT [FGL | JAVA] name {. name}`
pub fn parse_import(parser: &mut Parser, ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let mut statement = ImportStatement {
        import_kind: ImportKind::Extension,
        path: String::new(),
    };
    let node = start_node(parser, NodeKind::Import(statement.clone()));
    parser.next_token();

    if parser.optional(TokenKind::FglKeyword) {
        statement.import_kind = ImportKind::Fgl;
    } else if parser.optional(TokenKind::JavaKeyword) {
        statement.import_kind = ImportKind::Java;
    }
    if let Some((name, _)) = parser.expect_identifier() {
        statement.path = name;
        while parser.peek(TokenKind::DotToken) && !parser.peek_token(2).has_preceding_line_break() {
            parser.next_token();
            match parser.expect_identifier() {
                Some((part, _)) => {
                    statement.path.push('.');
                    statement.path.push_str(&part);
                }
                None => break,
            }
        }
        ctx.containing_module.add_import(statement.path.clone());
    }

    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::Import(statement);
    Some(node)
}

/// `SCHEMA name` or `DATABASE name`
pub fn parse_database(parser: &mut Parser, _ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let keyword = parser.peek_kind();
    let node = start_node(
        parser,
        NodeKind::Database(DatabaseStatement {
            keyword,
            name: String::new(),
        }),
    );
    parser.next_token();
    let name = parser
        .expect_identifier()
        .map(|(name, _)| name)
        .unwrap_or_default();
    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::Database(DatabaseStatement { keyword, name });
    Some(node)
}

/// `GLOBALS "file"` or `GLOBALS declarations END GLOBALS`
pub fn parse_globals(parser: &mut Parser, ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    if parser.peek_at(TokenKind::StringLiteral, 2) {
        let node = start_node(parser, NodeKind::GlobalsInclude(GlobalsInclude { file: String::new() }));
        parser.next_token();
        parser.next_token();
        let file = parser.token().value().into_owned();
        let mut node = finish_statement(parser, node, errors);
        node.kind = NodeKind::GlobalsInclude(GlobalsInclude { file });
        return Some(node);
    }

    let mut node = start_node(parser, NodeKind::Globals(GlobalsBlock::default()));
    parser.next_token();
    end_header(parser, &mut node);

    let scope = DeclarationScope::new();
    let body_ctx = ctx
        .with_variable_adder(&scope)
        .with_end_keyword(TokenKind::GlobalsKeyword)
        .with_stop_tokens(&[TokenKind::FunctionKeyword, TokenKind::MainKeyword, TokenKind::GlobalsKeyword]);
    let stop = parse_block_body(parser, &body_ctx, Some(TokenKind::GlobalsKeyword), GLOBALS_MEMBERS, &mut node.children);
    drop(body_ctx);

    let mut node = finish_block(parser, node, stop, TokenKind::GlobalsKeyword, errors);
    let summary = scope.into_summary();
    merge_globals(&ctx.containing_module.globals, &summary);
    node.kind = NodeKind::Globals(GlobalsBlock { scope: summary });
    Some(node)
}

/// Fold one GLOBALS block into the module-wide globals. A name declared by
/// an earlier block keeps its first declaration.
fn merge_globals(globals: &DeclarationScope, block: &ScopeSummary) {
    for variable in &block.variables {
        globals.add_variable(variable.clone());
    }
    for constant in &block.constants {
        globals.add_constant(constant.clone());
    }
    for type_def in &block.types {
        globals.add_type(type_def.clone());
    }
}

/// `MAIN ... END MAIN`
pub fn parse_main(parser: &mut Parser, ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let start = parser.next_pos();
    let access = parse_access_modifier(parser, TokenKind::MainKeyword)?;
    if access != AccessModifier::Default {
        let span = parser.token().span();
        parser.report_syntax_error(
            &messages::_0_MODIFIER_CANNOT_BE_APPLIED_TO_1,
            &[&access.to_string(), "main"],
            span,
        );
    }
    parser.next_token();

    let mut node = AstNode::new(NodeKind::Main(MainBlock::default()), start);
    end_header(parser, &mut node);
    let header = TextSpan::from_bounds(start, node.decorator_end());
    if !ctx.containing_module.set_main(header) {
        parser.report_syntax_error(&messages::A_MODULE_CAN_ONLY_CONTAIN_ONE_MAIN_BLOCK, &[], header);
    }

    let scope = DeclarationScope::new();
    let body_ctx = ctx.for_routine(&scope, TokenKind::MainKeyword, false);
    let stop = parse_block_body(parser, &body_ctx, Some(TokenKind::MainKeyword), STATEMENTS, &mut node.children);
    drop(body_ctx);

    let mut node = finish_block(parser, node, stop, TokenKind::MainKeyword, errors);
    node.kind = NodeKind::Main(MainBlock {
        scope: scope.into_summary(),
    });
    Some(node)
}

/// `[PUBLIC|PRIVATE] FUNCTION name([param {, param}]) ... END FUNCTION`
pub fn parse_function(parser: &mut Parser, ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let start = parser.next_pos();
    let access = parse_access_modifier(parser, TokenKind::FunctionKeyword)?;
    parser.next_token();

    let (name, name_span) = parser
        .expect_identifier()
        .unwrap_or_else(|| (String::new(), TextSpan::empty(parser.last_end())));
    let mut parameters = Vec::new();
    if parser.expect(TokenKind::OpenParenToken) {
        if !parser.peek(TokenKind::CloseParenToken) {
            loop {
                match parser.expect_identifier() {
                    Some((param, _)) => parameters.push(param),
                    None => break,
                }
                if !parser.optional(TokenKind::CommaToken) {
                    break;
                }
            }
        }
        parser.expect(TokenKind::CloseParenToken);
    }

    let mut node = AstNode::new(NodeKind::Function(FunctionBlock::default()), start);
    end_header(parser, &mut node);
    if !name.is_empty() {
        ctx.containing_module.add_function(FunctionSignature {
            name: name.clone(),
            span: name_span,
            access,
            parameters: parameters.clone(),
        });
    }

    let scope = DeclarationScope::new();
    let body_ctx = ctx.for_routine(&scope, TokenKind::FunctionKeyword, true);
    let stop = parse_block_body(parser, &body_ctx, Some(TokenKind::FunctionKeyword), STATEMENTS, &mut node.children);
    drop(body_ctx);

    let mut node = finish_block(parser, node, stop, TokenKind::FunctionKeyword, errors);
    let return_arities = scope.return_arities();
    node.kind = NodeKind::Function(FunctionBlock {
        access,
        name,
        name_span,
        parameters,
        scope: scope.into_summary(),
        return_arities,
    });
    Some(node)
}
