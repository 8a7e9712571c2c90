//! Expression nodes.
//!
//! Expressions are leaves of the statement tree: they carry their own span
//! but are not entries in a node's children map. `Display` renders an
//! expression back to normalized source text.

use crate::token_kind::TokenKind;
use fgl_core::text::TextSpan;
use serde::Serialize;
use std::fmt;

/// An expression in statement position (assignment value, condition, bound).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Expression {
    Literal(LiteralExpression),
    Name(NameExpression),
    Call(CallExpression),
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    IsNull(IsNullExpression),
    Clipped(ClippedExpression),
    Parenthesized(ParenthesizedExpression),
    /// Placeholder for an operand that could not be parsed.
    Missing(MissingExpression),
}

impl Expression {
    pub fn span(&self) -> TextSpan {
        match self {
            Expression::Literal(n) => n.span,
            Expression::Name(n) => n.span,
            Expression::Call(n) => n.span,
            Expression::Unary(n) => n.span,
            Expression::Binary(n) => n.span,
            Expression::IsNull(n) => n.span,
            Expression::Clipped(n) => n.span,
            Expression::Parenthesized(n) => n.span,
            Expression::Missing(n) => n.span,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Expression::Missing(_))
    }

    /// The name expression, when this expression is a plain name.
    pub fn as_name(&self) -> Option<&NameExpression> {
        match self {
            Expression::Name(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralKind {
    Number,
    String,
    True,
    False,
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiteralExpression {
    pub span: TextSpan,
    pub literal_kind: LiteralKind,
    /// Source text of the literal. String literals keep their quotes.
    pub text: String,
}

/// A possibly qualified variable or function name: `x`, `rec.field`,
/// `arr[i].name`, `rec.*`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameExpression {
    pub span: TextSpan,
    pub name: String,
    pub accessors: Vec<NameAccessor>,
}

impl NameExpression {
    pub fn simple(name: impl Into<String>, span: TextSpan) -> Self {
        Self {
            span,
            name: name.into(),
            accessors: Vec::new(),
        }
    }

    /// Whether this is a bare name with no member or index access.
    pub fn is_simple(&self) -> bool {
        self.accessors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NameAccessor {
    Member { name: String },
    Index { indices: Vec<Expression> },
    AllMembers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallExpression {
    pub span: TextSpan,
    pub callee: NameExpression,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnaryExpression {
    pub span: TextSpan,
    pub operator: TokenKind,
    pub operand: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryExpression {
    pub span: TextSpan,
    pub left: Box<Expression>,
    pub operator: TokenKind,
    /// Set for `NOT LIKE` and `NOT MATCHES`.
    pub negated: bool,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsNullExpression {
    pub span: TextSpan,
    pub operand: Box<Expression>,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClippedExpression {
    pub span: TextSpan,
    pub operand: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParenthesizedExpression {
    pub span: TextSpan,
    pub inner: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingExpression {
    pub span: TextSpan,
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for NameExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for accessor in &self.accessors {
            match accessor {
                NameAccessor::Member { name } => write!(f, ".{}", name)?,
                NameAccessor::Index { indices } => {
                    write!(f, "[")?;
                    write_list(f, indices)?;
                    write!(f, "]")?;
                }
                NameAccessor::AllMembers => write!(f, ".*")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(n) => write!(f, "{}", n.text),
            Expression::Name(n) => write!(f, "{}", n),
            Expression::Call(n) => {
                write!(f, "{}(", n.callee)?;
                write_list(f, &n.arguments)?;
                write!(f, ")")
            }
            Expression::Unary(n) => match n.operator {
                TokenKind::NotKeyword => write!(f, "not {}", n.operand),
                op => write!(f, "{}{}", op, n.operand),
            },
            Expression::Binary(n) => {
                if n.negated {
                    write!(f, "{} not {} {}", n.left, n.operator, n.right)
                } else {
                    write!(f, "{} {} {}", n.left, n.operator, n.right)
                }
            }
            Expression::IsNull(n) => {
                if n.negated {
                    write!(f, "{} is not null", n.operand)
                } else {
                    write!(f, "{} is null", n.operand)
                }
            }
            Expression::Clipped(n) => write!(f, "{} clipped", n.operand),
            Expression::Parenthesized(n) => write!(f, "({})", n.inner),
            Expression::Missing(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(text: &str) -> NameExpression {
        NameExpression::simple(text, TextSpan::new(0, text.len() as u32))
    }

    #[test]
    fn test_display_qualified_name() {
        let mut n = name("arr");
        n.accessors.push(NameAccessor::Index {
            indices: vec![Expression::Name(name("i"))],
        });
        n.accessors.push(NameAccessor::Member {
            name: "code".to_string(),
        });
        assert_eq!(n.to_string(), "arr[i].code");
        n.accessors.push(NameAccessor::AllMembers);
        assert_eq!(n.to_string(), "arr[i].code.*");
    }

    #[test]
    fn test_display_binary_and_postfix() {
        let left = Expression::Name(name("x"));
        let right = Expression::Literal(LiteralExpression {
            span: TextSpan::new(4, 1),
            literal_kind: LiteralKind::Number,
            text: "1".to_string(),
        });
        let binary = Expression::Binary(BinaryExpression {
            span: TextSpan::new(0, 5),
            left: Box::new(left.clone()),
            operator: TokenKind::PlusToken,
            negated: false,
            right: Box::new(right),
        });
        assert_eq!(binary.to_string(), "x + 1");
        let clipped = Expression::Clipped(ClippedExpression {
            span: TextSpan::new(0, 9),
            operand: Box::new(left),
        });
        assert_eq!(clipped.to_string(), "x clipped");
    }
}
