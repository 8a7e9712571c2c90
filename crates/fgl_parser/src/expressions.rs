//! Expression parsing by precedence climbing.

use crate::parser::Parser;
use crate::precedence::{get_binary_operator_precedence, OperatorPrecedence};
use crate::utilities::can_start_expression;
use fgl_ast::{
    BinaryExpression, CallExpression, ClippedExpression, Expression, IsNullExpression,
    LiteralExpression, LiteralKind, MissingExpression, NameAccessor, NameExpression,
    ParenthesizedExpression, TokenKind, UnaryExpression,
};
use fgl_core::text::{TextPos, TextSpan};
use fgl_diagnostics::messages;

/// Parse an expression if one can start at the next token.
pub fn parse_expression(parser: &mut Parser) -> Option<Expression> {
    if !can_start_expression(parser.peek_kind()) {
        return None;
    }
    Some(parse_binary_expression(parser, OperatorPrecedence::Lowest))
}

/// Parse an expression, reporting `Expression expected` and returning a
/// placeholder when none starts at the next token.
pub fn expect_expression(parser: &mut Parser) -> Expression {
    match parse_expression(parser) {
        Some(expr) => expr,
        None => parse_missing_expression(parser),
    }
}

/// Parse `expr {, expr}`.
pub fn parse_expression_list(parser: &mut Parser) -> Vec<Expression> {
    let mut list = vec![expect_expression(parser)];
    while parser.optional(TokenKind::CommaToken) {
        list.push(expect_expression(parser));
    }
    list
}

/// Parse `name {, name}` where every item is a variable reference.
pub fn parse_name_list(parser: &mut Parser) -> Vec<NameExpression> {
    let mut list = Vec::new();
    loop {
        match parse_name_expression(parser) {
            Some(name) => list.push(name),
            None => {
                parser.error_at_next(&messages::IDENTIFIER_EXPECTED, &[]);
                break;
            }
        }
        if !parser.optional(TokenKind::CommaToken) {
            break;
        }
    }
    list
}

fn parse_missing_expression(parser: &mut Parser) -> Expression {
    parser.error_at_next(&messages::EXPRESSION_EXPECTED, &[]);
    let pos = parser.next_pos();
    Expression::Missing(MissingExpression {
        span: TextSpan::empty(pos),
    })
}

fn span_from(parser: &Parser, start: TextPos) -> TextSpan {
    TextSpan::from_bounds(start, parser.last_end().max(start))
}

fn parse_binary_expression(parser: &mut Parser, min_precedence: OperatorPrecedence) -> Expression {
    if !parser.enter_nested() {
        let pos = parser.next_pos();
        parser.next_token();
        return Expression::Missing(MissingExpression {
            span: span_from(parser, pos),
        });
    }
    let start = parser.next_pos();
    let mut left = parse_unary_expression(parser);

    loop {
        let kind = parser.peek_kind();

        // Postfix forms
        if kind == TokenKind::IsKeyword && OperatorPrecedence::Comparison >= min_precedence {
            parser.next_token();
            let negated = parser.optional(TokenKind::NotKeyword);
            parser.expect(TokenKind::NullKeyword);
            left = Expression::IsNull(IsNullExpression {
                span: span_from(parser, start),
                operand: Box::new(left),
                negated,
            });
            continue;
        }
        if kind == TokenKind::ClippedKeyword && OperatorPrecedence::Format >= min_precedence {
            parser.next_token();
            left = Expression::Clipped(ClippedExpression {
                span: span_from(parser, start),
                operand: Box::new(left),
            });
            continue;
        }

        let negated = kind == TokenKind::NotKeyword
            && (parser.peek_at(TokenKind::LikeKeyword, 2) || parser.peek_at(TokenKind::MatchesKeyword, 2));
        let operator = if negated {
            parser.peek_token(2).kind
        } else {
            kind
        };
        let precedence = get_binary_operator_precedence(operator);
        if precedence == OperatorPrecedence::Invalid || precedence < min_precedence {
            break;
        }
        if negated {
            parser.next_token();
        }
        parser.next_token();

        // `**` is right-associative; everything else associates left.
        let right_precedence = if operator == TokenKind::AsteriskAsteriskToken {
            precedence
        } else {
            precedence.next()
        };
        let right = parse_binary_expression(parser, right_precedence);
        left = Expression::Binary(BinaryExpression {
            span: span_from(parser, start),
            left: Box::new(left),
            operator,
            negated,
            right: Box::new(right),
        });
    }

    parser.exit_nested();
    left
}

fn parse_unary_expression(parser: &mut Parser) -> Expression {
    let kind = parser.peek_kind();
    let operand_precedence = match kind {
        TokenKind::NotKeyword => OperatorPrecedence::Not,
        TokenKind::MinusToken | TokenKind::PlusToken => OperatorPrecedence::Unary,
        _ => return parse_primary_expression(parser),
    };
    let start = parser.next_pos();
    parser.next_token();
    let operand = if can_start_expression(parser.peek_kind()) {
        parse_binary_expression(parser, operand_precedence)
    } else {
        parse_missing_expression(parser)
    };
    Expression::Unary(UnaryExpression {
        span: span_from(parser, start),
        operator: kind,
        operand: Box::new(operand),
    })
}

fn parse_primary_expression(parser: &mut Parser) -> Expression {
    let start = parser.next_pos();
    let literal_kind = match parser.peek_kind() {
        TokenKind::NumberLiteral => Some(LiteralKind::Number),
        TokenKind::StringLiteral => Some(LiteralKind::String),
        TokenKind::TrueKeyword => Some(LiteralKind::True),
        TokenKind::FalseKeyword => Some(LiteralKind::False),
        TokenKind::NullKeyword => Some(LiteralKind::Null),
        _ => None,
    };
    if let Some(literal_kind) = literal_kind {
        parser.next_token();
        return Expression::Literal(LiteralExpression {
            span: span_from(parser, start),
            literal_kind,
            text: parser.token().text.clone(),
        });
    }

    if parser.optional(TokenKind::OpenParenToken) {
        let inner = expect_expression(parser);
        parser.expect(TokenKind::CloseParenToken);
        return Expression::Parenthesized(ParenthesizedExpression {
            span: span_from(parser, start),
            inner: Box::new(inner),
        });
    }

    match parse_name_expression(parser) {
        Some(name) => {
            if parser.peek(TokenKind::OpenParenToken) {
                parse_call_arguments(parser, name)
            } else {
                Expression::Name(name)
            }
        }
        None => parse_missing_expression(parser),
    }
}

fn parse_call_arguments(parser: &mut Parser, callee: NameExpression) -> Expression {
    let start = callee.span.start;
    parser.next_token();
    let arguments = if parser.peek(TokenKind::CloseParenToken) {
        Vec::new()
    } else {
        parse_expression_list(parser)
    };
    parser.expect(TokenKind::CloseParenToken);
    Expression::Call(CallExpression {
        span: span_from(parser, start),
        callee,
        arguments,
    })
}

/// Parse a possibly qualified name: `x`, `rec.field`, `arr[i, j].name`,
/// `rec.*`. Keywords are accepted as member names when they follow the dot
/// on the same line.
pub fn parse_name_expression(parser: &mut Parser) -> Option<NameExpression> {
    let (name, span) = parser.parse_identifier()?;
    let start = span.start;
    let mut accessors = Vec::new();
    loop {
        if parser.peek(TokenKind::DotToken) {
            if parser.peek_at(TokenKind::AsteriskToken, 2) {
                parser.next_token();
                parser.next_token();
                accessors.push(NameAccessor::AllMembers);
                continue;
            }
            let member = parser.peek_token(2);
            let is_member = member.kind.can_be_identifier()
                || (member.kind.is_keyword() && !member.has_preceding_line_break());
            if !is_member {
                break;
            }
            parser.next_token();
            parser.next_token();
            accessors.push(NameAccessor::Member {
                name: parser.token().text.clone(),
            });
        } else if parser.optional(TokenKind::OpenBracketToken) {
            let indices = parse_expression_list(parser);
            parser.expect(TokenKind::CloseBracketToken);
            accessors.push(NameAccessor::Index { indices });
        } else {
            break;
        }
    }
    Some(NameExpression {
        span: span_from(parser, start),
        name,
        accessors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseOptions;

    fn parse(source: &str) -> (Expression, usize) {
        let mut parser = Parser::new(source, &ParseOptions::default());
        let expr = expect_expression(&mut parser);
        let (diagnostics, _) = parser.finish();
        (expr, diagnostics.error_count())
    }

    #[test]
    fn test_precedence() {
        let (expr, errors) = parse("a + b * c ** 2 ** 3");
        assert_eq!(errors, 0);
        let Expression::Binary(sum) = &expr else {
            panic!("expected binary expression");
        };
        assert_eq!(sum.operator, TokenKind::PlusToken);
        let Expression::Binary(product) = sum.right.as_ref() else {
            panic!("expected product");
        };
        assert_eq!(product.operator, TokenKind::AsteriskToken);
        let Expression::Binary(power) = product.right.as_ref() else {
            panic!("expected power");
        };
        assert_eq!(power.right.to_string(), "2 ** 3");
    }

    #[test]
    fn test_not_binds_looser_than_comparison() {
        let (expr, _) = parse("NOT a = b AND c");
        let Expression::Binary(and) = &expr else {
            panic!("expected and");
        };
        assert_eq!(and.operator, TokenKind::AndKeyword);
        assert_eq!(and.left.to_string(), "not a = b");
    }

    #[test]
    fn test_postfix_forms() {
        assert_eq!(parse("x IS NOT NULL").0.to_string(), "x is not null");
        assert_eq!(parse("a || b CLIPPED").0.to_string(), "a || b clipped");
        assert_eq!(parse("name NOT LIKE 'A%'").0.to_string(), "name not like 'A%'");
    }

    #[test]
    fn test_names_and_calls() {
        let (expr, errors) = parse("arr[i + 1].code");
        assert_eq!(errors, 0);
        assert_eq!(expr.to_string(), "arr[i + 1].code");
        let (expr, _) = parse("rec.*");
        assert_eq!(expr.to_string(), "rec.*");
        let (expr, _) = parse("util.trim(s, 2)");
        assert!(matches!(expr, Expression::Call(ref c) if c.arguments.len() == 2));
    }

    #[test]
    fn test_keyword_member_must_stay_on_line() {
        let mut parser = Parser::new("rec.\nend for", &ParseOptions::default());
        let name = parse_name_expression(&mut parser).unwrap();
        assert!(name.is_simple());
        assert!(parser.peek(TokenKind::DotToken));
    }

    #[test]
    fn test_missing_operand_is_reported() {
        let (expr, errors) = parse("1 +");
        assert_eq!(errors, 1);
        let Expression::Binary(sum) = &expr else {
            panic!("expected binary expression");
        };
        assert!(sum.right.is_missing());
    }
}
