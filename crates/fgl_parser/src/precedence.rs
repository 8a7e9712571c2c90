//! Operator precedence for binary and unary operators.

use fgl_ast::TokenKind;

/// Operator precedence levels, from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum OperatorPrecedence {
    Lowest = 0,
    Or = 1,
    And = 2,
    Not = 3,
    Comparison = 4,
    Concatenation = 5,
    /// `USING` and postfix `CLIPPED`.
    Format = 6,
    Additive = 7,
    Multiplicative = 8,
    Exponentiation = 9,
    Unary = 10,
    Invalid = 255,
}

impl OperatorPrecedence {
    /// The next tighter level, used for the right operand of a
    /// left-associative operator.
    pub fn next(self) -> OperatorPrecedence {
        match self {
            OperatorPrecedence::Lowest => OperatorPrecedence::Or,
            OperatorPrecedence::Or => OperatorPrecedence::And,
            OperatorPrecedence::And => OperatorPrecedence::Not,
            OperatorPrecedence::Not => OperatorPrecedence::Comparison,
            OperatorPrecedence::Comparison => OperatorPrecedence::Concatenation,
            OperatorPrecedence::Concatenation => OperatorPrecedence::Format,
            OperatorPrecedence::Format => OperatorPrecedence::Additive,
            OperatorPrecedence::Additive => OperatorPrecedence::Multiplicative,
            OperatorPrecedence::Multiplicative => OperatorPrecedence::Exponentiation,
            OperatorPrecedence::Exponentiation => OperatorPrecedence::Unary,
            OperatorPrecedence::Unary | OperatorPrecedence::Invalid => OperatorPrecedence::Invalid,
        }
    }
}

/// Get the binary operator precedence for a given token kind.
pub fn get_binary_operator_precedence(kind: TokenKind) -> OperatorPrecedence {
    match kind {
        TokenKind::OrKeyword => OperatorPrecedence::Or,
        TokenKind::AndKeyword => OperatorPrecedence::And,
        TokenKind::EqualsToken
        | TokenKind::EqualsEqualsToken
        | TokenKind::ExclamationEqualsToken
        | TokenKind::LessThanGreaterThanToken
        | TokenKind::LessThanToken
        | TokenKind::LessThanEqualsToken
        | TokenKind::GreaterThanToken
        | TokenKind::GreaterThanEqualsToken
        | TokenKind::LikeKeyword
        | TokenKind::MatchesKeyword => OperatorPrecedence::Comparison,
        TokenKind::BarBarToken => OperatorPrecedence::Concatenation,
        TokenKind::UsingKeyword => OperatorPrecedence::Format,
        TokenKind::PlusToken | TokenKind::MinusToken => OperatorPrecedence::Additive,
        TokenKind::AsteriskToken | TokenKind::SlashToken | TokenKind::ModKeyword => {
            OperatorPrecedence::Multiplicative
        }
        TokenKind::AsteriskAsteriskToken => OperatorPrecedence::Exponentiation,
        _ => OperatorPrecedence::Invalid,
    }
}
