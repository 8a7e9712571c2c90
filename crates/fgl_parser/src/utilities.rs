//! Parser utility functions.

use fgl_ast::TokenKind;

/// Check if a token kind can start an expression.
pub fn can_start_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::NumberLiteral
            | TokenKind::StringLiteral
            | TokenKind::TrueKeyword
            | TokenKind::FalseKeyword
            | TokenKind::NullKeyword
            | TokenKind::OpenParenToken
            | TokenKind::PlusToken
            | TokenKind::MinusToken
            | TokenKind::NotKeyword
    ) || kind.can_be_identifier()
}

/// Block keywords that may follow `EXIT`.
pub fn is_exit_type(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::ForKeyword
            | TokenKind::ForeachKeyword
            | TokenKind::WhileKeyword
            | TokenKind::CaseKeyword
            | TokenKind::MenuKeyword
            | TokenKind::ProgramKeyword
            | TokenKind::DialogKeyword
            | TokenKind::InputKeyword
            | TokenKind::DisplayKeyword
    )
}

/// Block keywords that may follow `CONTINUE`.
pub fn is_continue_type(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::ForKeyword
            | TokenKind::ForeachKeyword
            | TokenKind::WhileKeyword
            | TokenKind::MenuKeyword
            | TokenKind::DialogKeyword
            | TokenKind::InputKeyword
    )
}

/// Built-in type keywords that take no further syntax.
pub fn is_simple_type_keyword(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::IntegerKeyword
            | TokenKind::IntKeyword
            | TokenKind::SmallintKeyword
            | TokenKind::TinyintKeyword
            | TokenKind::BigintKeyword
            | TokenKind::StringKeyword
            | TokenKind::DateKeyword
            | TokenKind::BooleanKeyword
            | TokenKind::TextKeyword
            | TokenKind::ByteKeyword
    )
}

/// Datetime and interval qualifier keywords.
pub fn is_datetime_qualifier(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::YearKeyword
            | TokenKind::MonthKeyword
            | TokenKind::DayKeyword
            | TokenKind::HourKeyword
            | TokenKind::MinuteKeyword
            | TokenKind::SecondKeyword
            | TokenKind::FractionKeyword
    )
}
