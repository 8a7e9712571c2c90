//! Statement productions, keyed by their leading tokens.
//!
//! Each production is a plain function tried in table order. A production
//! is only called when the next token is in its `leading` set; it returns
//! `None` without consuming anything when the construct turns out not to
//! apply, so the next candidate can be tried.

use crate::blocks;
use crate::context::ParseContext;
use crate::declarations;
use crate::module;
use crate::parser::Parser;
use crate::statements;
use fgl_ast::{AstNode, TokenKind};
use fgl_core::version::LanguageVersion;
use fgl_diagnostics::messages;

pub type ParseFn = fn(&mut Parser, &ParseContext<'_>) -> Option<AstNode>;

pub struct StatementProduction {
    pub name: &'static str,
    /// Tokens that can introduce the construct. The first entry is its
    /// primary keyword, which is what version gating reports on.
    pub leading: &'static [TokenKind],
    pub min_version: LanguageVersion,
    pub parse: ParseFn,
}

impl StatementProduction {
    const fn new(
        name: &'static str,
        leading: &'static [TokenKind],
        min_version: LanguageVersion,
        parse: ParseFn,
    ) -> Self {
        Self {
            name,
            leading,
            min_version,
            parse,
        }
    }

    fn starts_with(&self, kind: TokenKind) -> bool {
        self.leading.contains(&kind)
    }
}

impl std::fmt::Debug for StatementProduction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementProduction")
            .field("name", &self.name)
            .field("min_version", &self.min_version)
            .finish()
    }
}

use LanguageVersion as V;
use TokenKind as K;

/// Statements allowed in function, MAIN and nested block bodies.
pub static STATEMENTS: &[StatementProduction] = &[
    StatementProduction::new("define", &[K::DefineKeyword], V::BASELINE, declarations::parse_define),
    StatementProduction::new("constant", &[K::ConstantKeyword], V::BASELINE, declarations::parse_constant),
    StatementProduction::new("type", &[K::TypeKeyword], V::V2_20, declarations::parse_type_statement),
    StatementProduction::new("let", &[K::LetKeyword], V::BASELINE, statements::parse_let),
    StatementProduction::new("call", &[K::CallKeyword], V::BASELINE, statements::parse_call),
    StatementProduction::new("return", &[K::ReturnKeyword], V::BASELINE, statements::parse_return),
    StatementProduction::new(
        "display",
        &[K::DisplayKeyword, K::MessageKeyword, K::ErrorKeyword],
        V::BASELINE,
        statements::parse_output,
    ),
    StatementProduction::new("sleep", &[K::SleepKeyword], V::BASELINE, statements::parse_sleep),
    StatementProduction::new("initialize", &[K::InitializeKeyword], V::BASELINE, statements::parse_initialize),
    StatementProduction::new("exit", &[K::ExitKeyword], V::BASELINE, statements::parse_exit),
    StatementProduction::new("continue", &[K::ContinueKeyword], V::BASELINE, statements::parse_continue),
    StatementProduction::new("prepare", &[K::PrepareKeyword], V::BASELINE, statements::parse_prepare),
    StatementProduction::new("declare", &[K::DeclareKeyword], V::BASELINE, statements::parse_declare),
    StatementProduction::new(
        "cursor",
        &[K::OpenKeyword, K::CloseKeyword, K::FreeKeyword, K::FetchKeyword, K::ExecuteKeyword],
        V::BASELINE,
        statements::parse_cursor_statement,
    ),
    StatementProduction::new("whenever", &[K::WheneverKeyword], V::BASELINE, statements::parse_whenever),
    StatementProduction::new("run", &[K::RunKeyword], V::BASELINE, statements::parse_run),
    StatementProduction::new("if", &[K::IfKeyword], V::BASELINE, blocks::parse_if),
    StatementProduction::new("while", &[K::WhileKeyword], V::BASELINE, blocks::parse_while),
    StatementProduction::new("for", &[K::ForKeyword], V::BASELINE, blocks::parse_for),
    StatementProduction::new("foreach", &[K::ForeachKeyword], V::BASELINE, blocks::parse_foreach),
    StatementProduction::new("case", &[K::CaseKeyword], V::BASELINE, blocks::parse_case),
    StatementProduction::new("try", &[K::TryKeyword], V::V2_10, blocks::parse_try),
    StatementProduction::new("menu", &[K::MenuKeyword], V::BASELINE, blocks::parse_menu),
];

/// Declarations and routines allowed at module level.
pub static MODULE_MEMBERS: &[StatementProduction] = &[
    StatementProduction::new("import", &[K::ImportKeyword], V::V2_30, module::parse_import),
    StatementProduction::new(
        "database",
        &[K::SchemaKeyword, K::DatabaseKeyword],
        V::BASELINE,
        module::parse_database,
    ),
    StatementProduction::new("globals", &[K::GlobalsKeyword], V::BASELINE, module::parse_globals),
    StatementProduction::new(
        "define",
        &[K::DefineKeyword, K::PublicKeyword, K::PrivateKeyword],
        V::BASELINE,
        declarations::parse_define,
    ),
    StatementProduction::new(
        "constant",
        &[K::ConstantKeyword, K::PublicKeyword, K::PrivateKeyword],
        V::BASELINE,
        declarations::parse_constant,
    ),
    StatementProduction::new(
        "type",
        &[K::TypeKeyword, K::PublicKeyword, K::PrivateKeyword],
        V::V2_20,
        declarations::parse_type_statement,
    ),
    StatementProduction::new(
        "main",
        &[K::MainKeyword, K::PublicKeyword, K::PrivateKeyword],
        V::BASELINE,
        module::parse_main,
    ),
    StatementProduction::new(
        "function",
        &[K::FunctionKeyword, K::PublicKeyword, K::PrivateKeyword],
        V::BASELINE,
        module::parse_function,
    ),
];

/// Declarations allowed inside `GLOBALS ... END GLOBALS`.
pub static GLOBALS_MEMBERS: &[StatementProduction] = &[
    StatementProduction::new("define", &[K::DefineKeyword], V::BASELINE, declarations::parse_define),
    StatementProduction::new("constant", &[K::ConstantKeyword], V::BASELINE, declarations::parse_constant),
    StatementProduction::new("type", &[K::TypeKeyword], V::V2_20, declarations::parse_type_statement),
];

/// Statements contributed by a MENU to the bodies of its clauses.
pub static MENU_STATEMENTS: &[StatementProduction] = &[StatementProduction::new(
    "option",
    &[K::NextKeyword, K::ShowKeyword, K::HideKeyword],
    V::BASELINE,
    statements::parse_menu_option_control,
)];

/// Try the context statements, then `table`, against the next token.
///
/// Returns the parsed node, or `None` when nothing applied. `None` after
/// tokens were consumed means a production recovered without producing a
/// node; callers detect that through `Parser::consumed`.
pub fn dispatch_statement(
    parser: &mut Parser,
    ctx: &ParseContext<'_>,
    table: &'static [StatementProduction],
) -> Option<AstNode> {
    let kind = parser.peek_kind();
    let candidates = ctx
        .context_statements
        .iter()
        .copied()
        .chain(table.iter())
        .filter(|production| production.starts_with(kind));

    for production in candidates {
        if !production.min_version.is_available_in(parser.language_version()) {
            // A modifier alone does not commit to a gated production.
            if production.leading.first() != Some(&kind) {
                continue;
            }
            tracing::debug!(
                production = production.name,
                min_version = %production.min_version,
                "statement not available in active language version"
            );
            let min_version = production.min_version.to_string();
            parser.error_at_next(
                &messages::_0_REQUIRES_LANGUAGE_VERSION_1_OR_LATER,
                &[production.name, &min_version],
            );
            parser.next_token();
            return None;
        }

        let before = parser.consumed();
        if !parser.enter_nested() {
            parser.next_token();
            return None;
        }
        tracing::trace!(production = production.name, "trying statement production");
        let result = (production.parse)(parser, ctx);
        parser.exit_nested();

        if result.is_some() || parser.consumed() != before {
            return result;
        }
    }
    None
}
