//! DEFINE, CONSTANT and TYPE declarations and type references.

use crate::block::{finish_statement, peek_end, start_node};
use crate::context::ParseContext;
use crate::expressions::expect_expression;
use crate::parser::Parser;
use crate::utilities::{is_datetime_qualifier, is_simple_type_keyword};
use fgl_ast::{
    AccessModifier, AstNode, ConstantDef, ConstantStatement, DefineStatement, NodeKind, TokenKind,
    TypeDef, TypeReference, TypeStatement, VariableDef,
};
use fgl_core::text::TextSpan;
use fgl_diagnostics::messages;

/// Consume an optional `PUBLIC`/`PRIVATE` modifier when `keyword` follows
/// it. Returns `None`, consuming nothing, when `keyword` is not next.
pub fn parse_access_modifier(parser: &mut Parser, keyword: TokenKind) -> Option<AccessModifier> {
    let modifier = match parser.peek_kind() {
        TokenKind::PublicKeyword => AccessModifier::Public,
        TokenKind::PrivateKeyword => AccessModifier::Private,
        kind if kind == keyword => return Some(AccessModifier::Default),
        _ => return None,
    };
    if !parser.peek_at(keyword, 2) {
        return None;
    }
    parser.next_token();
    Some(modifier)
}

fn report_duplicate(parser: &mut Parser, name: &str, span: TextSpan) {
    parser.report_syntax_error(&messages::_0_IS_ALREADY_DEFINED_IN_THIS_SCOPE, &[name], span);
}

/// `[PUBLIC|PRIVATE] DEFINE a, b type [, c type ...]`
pub fn parse_define(parser: &mut Parser, ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let node = start_node(parser, NodeKind::Define(DefineStatement::default()));
    let access = parse_access_modifier(parser, TokenKind::DefineKeyword)?;
    parser.next_token();

    let variables = parse_variable_groups(parser);
    if let Some(adder) = ctx.variable_adder {
        for variable in &variables {
            if !adder.add_variable(variable.clone()) {
                report_duplicate(parser, &variable.name, variable.span);
            }
        }
    }

    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::Define(DefineStatement { access, variables });
    Some(node)
}

/// `a, b type {, c type}`. Names separated by commas share the type that
/// follows the last of them.
fn parse_variable_groups(parser: &mut Parser) -> Vec<VariableDef> {
    let mut variables = Vec::new();
    loop {
        let mut names = Vec::new();
        loop {
            match parser.expect_identifier() {
                Some(name) => names.push(name),
                None => return variables,
            }
            if !(parser.peek(TokenKind::CommaToken) && parser.peek_token(2).kind.can_be_identifier()) {
                break;
            }
            parser.next_token();
        }
        let type_ref = parse_type(parser);
        for (name, span) in names {
            variables.push(VariableDef {
                name,
                span,
                type_ref: type_ref.clone(),
            });
        }
        if !parser.optional(TokenKind::CommaToken) {
            return variables;
        }
    }
}

/// `[PUBLIC|PRIVATE] CONSTANT name [type] = value [, ...]`
pub fn parse_constant(parser: &mut Parser, ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let node = start_node(parser, NodeKind::Constant(ConstantStatement::default()));
    let access = parse_access_modifier(parser, TokenKind::ConstantKeyword)?;
    parser.next_token();

    let mut constants = Vec::new();
    loop {
        let Some((name, span)) = parser.expect_identifier() else {
            break;
        };
        let type_ref = if parser.peek(TokenKind::EqualsToken) {
            None
        } else {
            Some(parse_type(parser))
        };
        let value = if parser.expect(TokenKind::EqualsToken) {
            Some(expect_expression(parser))
        } else {
            None
        };
        let constant = ConstantDef {
            name,
            span,
            type_ref,
            value,
        };
        if let Some(adder) = ctx.variable_adder {
            if !adder.add_constant(constant.clone()) {
                report_duplicate(parser, &constant.name, constant.span);
            }
        }
        constants.push(constant);
        if !parser.optional(TokenKind::CommaToken) {
            break;
        }
    }

    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::Constant(ConstantStatement { access, constants });
    Some(node)
}

/// `[PUBLIC|PRIVATE] TYPE name type [, ...]`
pub fn parse_type_statement(parser: &mut Parser, ctx: &ParseContext<'_>) -> Option<AstNode> {
    let errors = parser.error_count();
    let node = start_node(parser, NodeKind::TypeDef(TypeStatement::default()));
    let access = parse_access_modifier(parser, TokenKind::TypeKeyword)?;
    parser.next_token();

    let mut types = Vec::new();
    loop {
        let Some((name, span)) = parser.expect_identifier() else {
            break;
        };
        let type_def = TypeDef {
            name,
            span,
            type_ref: parse_type(parser),
        };
        if let Some(adder) = ctx.variable_adder {
            if !adder.add_type(type_def.clone()) {
                report_duplicate(parser, &type_def.name, type_def.span);
            }
        }
        types.push(type_def);
        if !parser.optional(TokenKind::CommaToken) {
            break;
        }
    }

    let mut node = finish_statement(parser, node, errors);
    node.kind = NodeKind::TypeDef(TypeStatement { access, types });
    Some(node)
}

// ============================================================================
// Type references
// ============================================================================

/// Parse a type reference, reporting `Type expected` when none follows.
pub fn parse_type(parser: &mut Parser) -> TypeReference {
    let kind = parser.peek_kind();
    match kind {
        TokenKind::RecordKeyword => parse_record_type(parser),
        TokenKind::DynamicKeyword => parse_dynamic_array_type(parser),
        TokenKind::ArrayKeyword => parse_static_array_type(parser),
        TokenKind::LikeKeyword => {
            parser.next_token();
            let (table, column) = parse_table_column(parser);
            TypeReference::Like { table, column }
        }
        TokenKind::CharKeyword
        | TokenKind::VarcharKeyword
        | TokenKind::DecimalKeyword
        | TokenKind::MoneyKeyword
        | TokenKind::FloatKeyword => {
            parser.next_token();
            let arguments = parse_type_arguments(parser);
            named(kind, arguments)
        }
        TokenKind::DatetimeKeyword | TokenKind::IntervalKeyword => parse_datetime_type(parser),
        _ if is_simple_type_keyword(kind) => {
            parser.next_token();
            named(kind, Vec::new())
        }
        _ if kind.can_be_identifier() => {
            // User type, possibly qualified by an imported module name.
            parser.next_token();
            let mut name = parser.token().text.clone();
            while parser.peek(TokenKind::DotToken) && parser.peek_token(2).kind.can_be_identifier() {
                parser.next_token();
                parser.next_token();
                name.push('.');
                name.push_str(&parser.token().text);
            }
            TypeReference::Named {
                name,
                arguments: Vec::new(),
            }
        }
        _ => {
            parser.error_at_next(&messages::TYPE_EXPECTED, &[]);
            TypeReference::Missing
        }
    }
}

fn named(kind: TokenKind, arguments: Vec<String>) -> TypeReference {
    TypeReference::Named {
        name: kind.text().to_string(),
        arguments,
    }
}

/// `(n [, m])` after a sized type.
fn parse_type_arguments(parser: &mut Parser) -> Vec<String> {
    let mut arguments = Vec::new();
    if !parser.optional(TokenKind::OpenParenToken) {
        return arguments;
    }
    loop {
        if parser.optional(TokenKind::NumberLiteral) {
            arguments.push(parser.token().text.clone());
        } else {
            parser.error_at_next(&messages::_0_EXPECTED, &[TokenKind::NumberLiteral.text()]);
            break;
        }
        if !parser.optional(TokenKind::CommaToken) {
            break;
        }
    }
    parser.expect(TokenKind::CloseParenToken);
    arguments
}

/// `table.column`, or `table.*` (column `*`).
fn parse_table_column(parser: &mut Parser) -> (String, String) {
    let table = parser
        .expect_identifier()
        .map(|(name, _)| name)
        .unwrap_or_default();
    let mut column = String::new();
    if parser.expect(TokenKind::DotToken) {
        if parser.optional(TokenKind::AsteriskToken) {
            column.push('*');
        } else if let Some((name, _)) = parser.expect_identifier() {
            column = name;
        }
    }
    (table, column)
}

/// `RECORD LIKE table.*` or `RECORD name type, ... END RECORD`
fn parse_record_type(parser: &mut Parser) -> TypeReference {
    parser.next_token();
    if parser.optional(TokenKind::LikeKeyword) {
        let (table, _) = parse_table_column(parser);
        return TypeReference::RecordLike { table };
    }
    let mut fields = Vec::new();
    loop {
        if peek_end(parser, TokenKind::RecordKeyword) {
            parser.next_token();
            parser.next_token();
            break;
        }
        if !parser.peek_kind().can_be_identifier() {
            parser.error_at_next(&messages::_0_EXPECTED, &["end record"]);
            break;
        }
        let before = fields.len();
        fields.extend(parse_variable_groups(parser));
        if fields.len() == before {
            break;
        }
    }
    TypeReference::Record { fields }
}

/// `DYNAMIC ARRAY [WITH DIMENSION n] OF type`
fn parse_dynamic_array_type(parser: &mut Parser) -> TypeReference {
    parser.next_token();
    parser.expect(TokenKind::ArrayKeyword);
    let mut dimensions = Vec::new();
    if parser.optional(TokenKind::WithKeyword) {
        parser.expect(TokenKind::DimensionKeyword);
        if parser.expect(TokenKind::NumberLiteral) {
            dimensions.push(parser.token().text.clone());
        }
    }
    parser.expect(TokenKind::OfKeyword);
    TypeReference::Array {
        dynamic: true,
        dimensions,
        element: Box::new(parse_type(parser)),
    }
}

/// `ARRAY [n {, m}] OF type`
fn parse_static_array_type(parser: &mut Parser) -> TypeReference {
    parser.next_token();
    let mut dimensions = Vec::new();
    if parser.expect(TokenKind::OpenBracketToken) {
        loop {
            if parser.expect(TokenKind::NumberLiteral) {
                dimensions.push(parser.token().text.clone());
            }
            if !parser.optional(TokenKind::CommaToken) {
                break;
            }
        }
        parser.expect(TokenKind::CloseBracketToken);
    }
    parser.expect(TokenKind::OfKeyword);
    TypeReference::Array {
        dynamic: false,
        dimensions,
        element: Box::new(parse_type(parser)),
    }
}

/// `DATETIME q1 TO q2` or `INTERVAL q1[(n)] TO q2[(n)]`
fn parse_datetime_type(parser: &mut Parser) -> TypeReference {
    let kind = parser.next_token();
    let mut arguments = Vec::new();
    if is_datetime_qualifier(parser.peek_kind()) {
        arguments.push(parse_qualifier(parser));
        if parser.expect(TokenKind::ToKeyword) {
            if is_datetime_qualifier(parser.peek_kind()) {
                arguments.push(parse_qualifier(parser));
            } else {
                parser.error_at_next(&messages::_0_EXPECTED, &[TokenKind::SecondKeyword.text()]);
            }
        }
    }
    named(kind, arguments)
}

fn parse_qualifier(parser: &mut Parser) -> String {
    let mut text = parser.next_token().text().to_string();
    if parser.optional(TokenKind::OpenParenToken) {
        if parser.expect(TokenKind::NumberLiteral) {
            text.push('(');
            text.push_str(&parser.token().text);
            text.push(')');
        }
        parser.expect(TokenKind::CloseParenToken);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseOptions;

    fn type_of(source: &str) -> (String, usize) {
        let mut parser = Parser::new(source, &ParseOptions::default());
        let type_ref = parse_type(&mut parser);
        let (diagnostics, _) = parser.finish();
        (type_ref.to_string(), diagnostics.error_count())
    }

    #[test]
    fn test_type_references() {
        assert_eq!(type_of("DECIMAL(10,2)"), ("decimal(10,2)".to_string(), 0));
        assert_eq!(type_of("LIKE customer.cust_id"), ("like customer.cust_id".to_string(), 0));
        assert_eq!(type_of("RECORD LIKE customer.*"), ("record like customer.*".to_string(), 0));
        assert_eq!(
            type_of("DYNAMIC ARRAY WITH DIMENSION 2 OF STRING"),
            ("dynamic array with dimension 2 of string".to_string(), 0)
        );
        assert_eq!(type_of("ARRAY[10] OF INTEGER"), ("array[10] of integer".to_string(), 0));
        assert_eq!(
            type_of("DATETIME YEAR TO FRACTION(3)"),
            ("datetime(year,fraction(3))".to_string(), 0)
        );
        assert_eq!(type_of("util.Point"), ("util.Point".to_string(), 0));
    }

    #[test]
    fn test_record_fields_share_types() {
        let mut parser = Parser::new("RECORD a, b INTEGER, c STRING END RECORD", &ParseOptions::default());
        let TypeReference::Record { fields } = parse_type(&mut parser) else {
            panic!("expected record");
        };
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(fields[1].type_ref.to_string(), "integer");
        assert!(parser.eof());
    }

    #[test]
    fn test_missing_type() {
        assert_eq!(type_of("= 1"), ("?".to_string(), 1));
    }
}
