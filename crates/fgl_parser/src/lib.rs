//! fgl_parser: Recursive descent parser for 4GL modules.
//!
//! Parses the scanner's token stream into an [`AstNode`] tree. Statements are
//! dispatched through a table of productions keyed by their leading tokens,
//! gated by the active language version. Blocks share one body protocol
//! (see [`block`]) so that a missing `END <keyword>` is reported once and
//! never swallows the enclosing block's terminator.

pub mod block;
mod blocks;
pub mod context;
mod declarations;
mod expressions;
mod lookahead;
mod module;
mod parser;
mod precedence;
pub mod registry;
mod statements;
mod utilities;

pub use block::BodyStop;
pub use context::{
    DeclarationScope, ModuleScope, ParseContext, PrepareBinder, ReturnBinder, VariableAdder,
};
pub use expressions::{expect_expression, parse_expression};
pub use lookahead::TokenQueue;
pub use parser::{ParseOptions, Parser};
pub use precedence::{get_binary_operator_precedence, OperatorPrecedence};
pub use registry::{StatementProduction, MODULE_MEMBERS, STATEMENTS};

use fgl_ast::{AstNode, NodeChildren, ScopeSummary};
use fgl_diagnostics::DiagnosticCollection;
use fgl_scanner::Token;

/// The outcome of parsing a whole module.
#[derive(Debug)]
pub struct ParseResult {
    pub module: AstNode,
    /// Scanner and parser diagnostics in source order.
    pub diagnostics: DiagnosticCollection,
    /// Whitespace and comment tokens, in verbatim mode only.
    pub trivia: Vec<Token>,
}

/// The outcome of parsing a free-standing run of statements.
#[derive(Debug)]
pub struct SnippetResult {
    pub statements: Vec<AstNode>,
    pub diagnostics: DiagnosticCollection,
    pub trivia: Vec<Token>,
    /// Declarations and cursors introduced by the statements.
    pub scope: ScopeSummary,
}

/// Parse a complete source module.
#[tracing::instrument(level = "debug", skip_all, fields(len = source_text.len()))]
pub fn parse_module(source_text: &str, options: &ParseOptions) -> ParseResult {
    let mut parser = Parser::new(source_text, options);
    let module = module::parse_module_node(&mut parser);
    let (mut diagnostics, trivia) = parser.finish();
    if let Some(file) = &options.file_name {
        diagnostics.set_file(file);
    }
    tracing::debug!(errors = diagnostics.error_count(), "parsed module");
    ParseResult {
        module,
        diagnostics,
        trivia,
    }
}

/// Parse statements as they would appear inside a function body. `RETURN`
/// values and declarations are accepted; `END <keyword>` of any block is
/// reported as stray.
#[tracing::instrument(level = "debug", skip_all, fields(len = source_text.len()))]
pub fn parse_statements(source_text: &str, options: &ParseOptions) -> SnippetResult {
    let mut parser = Parser::new(source_text, options);
    let module = ModuleScope::new();
    let scope = DeclarationScope::new();
    let mut children = NodeChildren::new();
    {
        let ctx = ParseContext::root(&module)
            .with_prepare_binder(&scope)
            .with_return_binder(&scope)
            .with_variable_adder(&scope);
        block::parse_block_body(&mut parser, &ctx, None, STATEMENTS, &mut children);
    }
    let (mut diagnostics, trivia) = parser.finish();
    if let Some(file) = &options.file_name {
        diagnostics.set_file(file);
    }
    SnippetResult {
        statements: children.into_values().collect(),
        diagnostics,
        trivia,
        scope: scope.into_summary(),
    }
}
