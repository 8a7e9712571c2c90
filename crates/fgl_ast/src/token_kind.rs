//! TokenKind enum - every token kind produced by the scanner.
//!
//! Keywords are case-insensitive in source; their canonical text here is
//! lowercase. The enum, the keyword table and the punctuation table are all
//! generated from one list so they cannot drift apart.

use std::fmt;

macro_rules! token_kinds {
    (
        special { $($sv:ident),* $(,)? }
        punctuation { $($pv:ident => $pt:literal),* $(,)? }
        keywords { $($kv:ident => $kt:literal),* $(,)? }
    ) => {
        /// The kind of a scanned token.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum TokenKind {
            $($sv,)*
            $($pv,)*
            $($kv,)*
        }

        impl TokenKind {
            /// All punctuation and operator kinds, in declaration order.
            pub const PUNCTUATION: &'static [TokenKind] = &[$(TokenKind::$pv),*];
            /// All keyword kinds, in declaration order.
            pub const KEYWORDS: &'static [TokenKind] = &[$(TokenKind::$kv),*];

            /// Get the source text of a punctuation or operator kind.
            pub fn punctuation_text(self) -> Option<&'static str> {
                match self {
                    $(TokenKind::$pv => Some($pt),)*
                    _ => None,
                }
            }

            /// Get the canonical (lowercase) text of a keyword kind.
            pub fn keyword_text(self) -> Option<&'static str> {
                match self {
                    $(TokenKind::$kv => Some($kt),)*
                    _ => None,
                }
            }

            fn from_lowercase_keyword(text: &str) -> Option<TokenKind> {
                match text {
                    $($kt => Some(TokenKind::$kv),)*
                    _ => None,
                }
            }

            fn from_punctuation(text: &str) -> Option<TokenKind> {
                match text {
                    $($pt => Some(TokenKind::$pv),)*
                    _ => None,
                }
            }
        }
    };
}

token_kinds! {
    special {
        Unknown,
        EndOfFile,
        Whitespace,
        NewLine,
        Comment,
        Identifier,
        NumberLiteral,
        StringLiteral,
    }
    punctuation {
        PlusToken => "+",
        MinusToken => "-",
        AsteriskToken => "*",
        SlashToken => "/",
        AsteriskAsteriskToken => "**",
        BarBarToken => "||",
        EqualsToken => "=",
        EqualsEqualsToken => "==",
        ExclamationEqualsToken => "!=",
        LessThanGreaterThanToken => "<>",
        LessThanToken => "<",
        LessThanEqualsToken => "<=",
        GreaterThanToken => ">",
        GreaterThanEqualsToken => ">=",
        OpenParenToken => "(",
        CloseParenToken => ")",
        OpenBracketToken => "[",
        CloseBracketToken => "]",
        CommaToken => ",",
        DotToken => ".",
        ColonToken => ":",
        SemicolonToken => ";",
    }
    keywords {
        ActionKeyword => "action",
        AfterKeyword => "after",
        AllKeyword => "all",
        AndKeyword => "and",
        AnyKeyword => "any",
        ArrayKeyword => "array",
        AtKeyword => "at",
        AttributesKeyword => "attributes",
        BeforeKeyword => "before",
        BigintKeyword => "bigint",
        BooleanKeyword => "boolean",
        ByKeyword => "by",
        ByteKeyword => "byte",
        CallKeyword => "call",
        CaseKeyword => "case",
        CatchKeyword => "catch",
        CharKeyword => "char",
        ClippedKeyword => "clipped",
        CloseKeyword => "close",
        CommandKeyword => "command",
        ConstantKeyword => "constant",
        ContinueKeyword => "continue",
        CurrentKeyword => "current",
        CursorKeyword => "cursor",
        DatabaseKeyword => "database",
        DateKeyword => "date",
        DatetimeKeyword => "datetime",
        DayKeyword => "day",
        DecimalKeyword => "decimal",
        DeclareKeyword => "declare",
        DefineKeyword => "define",
        DialogKeyword => "dialog",
        DimensionKeyword => "dimension",
        DisplayKeyword => "display",
        DynamicKeyword => "dynamic",
        ElseKeyword => "else",
        EndKeyword => "end",
        ErrorKeyword => "error",
        ExecuteKeyword => "execute",
        ExitKeyword => "exit",
        FalseKeyword => "false",
        FetchKeyword => "fetch",
        FglKeyword => "fgl",
        FirstKeyword => "first",
        FloatKeyword => "float",
        ForKeyword => "for",
        ForeachKeyword => "foreach",
        FoundKeyword => "found",
        FractionKeyword => "fraction",
        FreeKeyword => "free",
        FromKeyword => "from",
        FunctionKeyword => "function",
        GlobalsKeyword => "globals",
        GotoKeyword => "goto",
        HelpKeyword => "help",
        HideKeyword => "hide",
        HoldKeyword => "hold",
        HourKeyword => "hour",
        IdleKeyword => "idle",
        IfKeyword => "if",
        ImportKeyword => "import",
        InitializeKeyword => "initialize",
        InputKeyword => "input",
        IntKeyword => "int",
        IntegerKeyword => "integer",
        IntervalKeyword => "interval",
        IntoKeyword => "into",
        IsKeyword => "is",
        JavaKeyword => "java",
        KeyKeyword => "key",
        LastKeyword => "last",
        LetKeyword => "let",
        LikeKeyword => "like",
        MainKeyword => "main",
        MatchesKeyword => "matches",
        MenuKeyword => "menu",
        MessageKeyword => "message",
        MinuteKeyword => "minute",
        ModKeyword => "mod",
        MoneyKeyword => "money",
        MonthKeyword => "month",
        NextKeyword => "next",
        NotKeyword => "not",
        NullKeyword => "null",
        OfKeyword => "of",
        OnKeyword => "on",
        OpenKeyword => "open",
        OptionKeyword => "option",
        OrKeyword => "or",
        OtherwiseKeyword => "otherwise",
        PrepareKeyword => "prepare",
        PreviousKeyword => "previous",
        PrivateKeyword => "private",
        ProgramKeyword => "program",
        PublicKeyword => "public",
        RaiseKeyword => "raise",
        RecordKeyword => "record",
        ReoptimizationKeyword => "reoptimization",
        ReturnKeyword => "return",
        ReturningKeyword => "returning",
        RunKeyword => "run",
        SchemaKeyword => "schema",
        ScrollKeyword => "scroll",
        SecondKeyword => "second",
        ShowKeyword => "show",
        SleepKeyword => "sleep",
        SmallintKeyword => "smallint",
        SqlerrorKeyword => "sqlerror",
        StepKeyword => "step",
        StopKeyword => "stop",
        StringKeyword => "string",
        TextKeyword => "text",
        ThenKeyword => "then",
        TinyintKeyword => "tinyint",
        ToKeyword => "to",
        TrueKeyword => "true",
        TryKeyword => "try",
        TypeKeyword => "type",
        UsingKeyword => "using",
        VarcharKeyword => "varchar",
        WaitingKeyword => "waiting",
        WarningKeyword => "warning",
        WhenKeyword => "when",
        WheneverKeyword => "whenever",
        WhileKeyword => "while",
        WithKeyword => "with",
        WithoutKeyword => "without",
        YearKeyword => "year",
    }
}

/// The coarse category of a token. Completion rules may be keyed by a
/// category instead of a concrete kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenCategory {
    Keyword,
    Identifier,
    NumericLiteral,
    StringLiteral,
    Operator,
    Punctuation,
    Whitespace,
    Comment,
    EndOfFile,
    Unknown,
}

impl TokenCategory {
    pub const ALL: &'static [TokenCategory] = &[
        TokenCategory::Keyword,
        TokenCategory::Identifier,
        TokenCategory::NumericLiteral,
        TokenCategory::StringLiteral,
        TokenCategory::Operator,
        TokenCategory::Punctuation,
        TokenCategory::Whitespace,
        TokenCategory::Comment,
        TokenCategory::EndOfFile,
        TokenCategory::Unknown,
    ];

    /// The name used for this category in rule files.
    pub fn name(self) -> &'static str {
        match self {
            TokenCategory::Keyword => "keyword",
            TokenCategory::Identifier => "identifier",
            TokenCategory::NumericLiteral => "numericLiteral",
            TokenCategory::StringLiteral => "stringLiteral",
            TokenCategory::Operator => "operator",
            TokenCategory::Punctuation => "punctuation",
            TokenCategory::Whitespace => "whitespace",
            TokenCategory::Comment => "comment",
            TokenCategory::EndOfFile => "endOfFile",
            TokenCategory::Unknown => "unknown",
        }
    }

    /// Look up a category by its rule-file name (case-insensitive).
    pub fn from_name(name: &str) -> Option<TokenCategory> {
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Longest keyword text, used to lowercase candidates without allocating.
const MAX_KEYWORD_LEN: usize = 16;

impl TokenKind {
    /// Look up a keyword by its source text, ignoring ASCII case.
    pub fn from_keyword(text: &str) -> Option<TokenKind> {
        if text.len() > MAX_KEYWORD_LEN || !text.is_ascii() {
            return None;
        }
        let mut buf = [0u8; MAX_KEYWORD_LEN];
        let lowered = &mut buf[..text.len()];
        lowered.copy_from_slice(text.as_bytes());
        lowered.make_ascii_lowercase();
        std::str::from_utf8(lowered)
            .ok()
            .and_then(Self::from_lowercase_keyword)
    }

    /// Resolve a token name as written in completion rule files: one of the
    /// special names `identifier`, `numberLiteral`, `stringLiteral` and
    /// `eof`, a keyword, or a punctuation string.
    pub fn from_rule_name(name: &str) -> Option<TokenKind> {
        let special = match name.to_ascii_lowercase().as_str() {
            "identifier" => Some(TokenKind::Identifier),
            "numberliteral" => Some(TokenKind::NumberLiteral),
            "stringliteral" => Some(TokenKind::StringLiteral),
            "eof" => Some(TokenKind::EndOfFile),
            _ => None,
        };
        special
            .or_else(|| Self::from_keyword(name))
            .or_else(|| Self::from_punctuation(name))
    }

    /// Whether this is a keyword kind.
    #[inline]
    pub fn is_keyword(self) -> bool {
        self.keyword_text().is_some()
    }

    /// Whether this is a punctuation or operator kind.
    #[inline]
    pub fn is_punctuation(self) -> bool {
        self.punctuation_text().is_some()
    }

    /// Whether this is trivia (whitespace, newline or comment).
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::NewLine | TokenKind::Comment
        )
    }

    /// Whether this is a literal kind.
    #[inline]
    pub fn is_literal(self) -> bool {
        matches!(self, TokenKind::NumberLiteral | TokenKind::StringLiteral)
    }

    /// Reserved keywords can never be used as names. All other keywords are
    /// contextual and double as identifiers.
    pub fn is_reserved(self) -> bool {
        matches!(
            self,
            TokenKind::AndKeyword
                | TokenKind::BeforeKeyword
                | TokenKind::CallKeyword
                | TokenKind::CaseKeyword
                | TokenKind::CatchKeyword
                | TokenKind::CloseKeyword
                | TokenKind::ClippedKeyword
                | TokenKind::CommandKeyword
                | TokenKind::ConstantKeyword
                | TokenKind::ContinueKeyword
                | TokenKind::DatabaseKeyword
                | TokenKind::DeclareKeyword
                | TokenKind::DefineKeyword
                | TokenKind::DisplayKeyword
                | TokenKind::ElseKeyword
                | TokenKind::EndKeyword
                | TokenKind::ErrorKeyword
                | TokenKind::ExecuteKeyword
                | TokenKind::ExitKeyword
                | TokenKind::FalseKeyword
                | TokenKind::FetchKeyword
                | TokenKind::ForKeyword
                | TokenKind::ForeachKeyword
                | TokenKind::FreeKeyword
                | TokenKind::FromKeyword
                | TokenKind::FunctionKeyword
                | TokenKind::GlobalsKeyword
                | TokenKind::IfKeyword
                | TokenKind::ImportKeyword
                | TokenKind::InitializeKeyword
                | TokenKind::IntoKeyword
                | TokenKind::IsKeyword
                | TokenKind::LetKeyword
                | TokenKind::LikeKeyword
                | TokenKind::MainKeyword
                | TokenKind::MatchesKeyword
                | TokenKind::MenuKeyword
                | TokenKind::MessageKeyword
                | TokenKind::ModKeyword
                | TokenKind::NotKeyword
                | TokenKind::NullKeyword
                | TokenKind::OnKeyword
                | TokenKind::OpenKeyword
                | TokenKind::OrKeyword
                | TokenKind::OtherwiseKeyword
                | TokenKind::PrepareKeyword
                | TokenKind::PrivateKeyword
                | TokenKind::PublicKeyword
                | TokenKind::ReturnKeyword
                | TokenKind::ReturningKeyword
                | TokenKind::RunKeyword
                | TokenKind::SchemaKeyword
                | TokenKind::SleepKeyword
                | TokenKind::StepKeyword
                | TokenKind::ThenKeyword
                | TokenKind::ToKeyword
                | TokenKind::TrueKeyword
                | TokenKind::TryKeyword
                | TokenKind::TypeKeyword
                | TokenKind::UsingKeyword
                | TokenKind::WhenKeyword
                | TokenKind::WheneverKeyword
                | TokenKind::WhileKeyword
        )
    }

    /// Whether a token of this kind may be used where a name is expected.
    #[inline]
    pub fn can_be_identifier(self) -> bool {
        self == TokenKind::Identifier || (self.is_keyword() && !self.is_reserved())
    }

    /// The coarse category of this kind.
    pub fn category(self) -> TokenCategory {
        match self {
            TokenKind::Unknown => TokenCategory::Unknown,
            TokenKind::EndOfFile => TokenCategory::EndOfFile,
            TokenKind::Whitespace | TokenKind::NewLine => TokenCategory::Whitespace,
            TokenKind::Comment => TokenCategory::Comment,
            TokenKind::Identifier => TokenCategory::Identifier,
            TokenKind::NumberLiteral => TokenCategory::NumericLiteral,
            TokenKind::StringLiteral => TokenCategory::StringLiteral,
            TokenKind::OpenParenToken
            | TokenKind::CloseParenToken
            | TokenKind::OpenBracketToken
            | TokenKind::CloseBracketToken
            | TokenKind::CommaToken
            | TokenKind::DotToken
            | TokenKind::ColonToken
            | TokenKind::SemicolonToken => TokenCategory::Punctuation,
            kind if kind.is_punctuation() => TokenCategory::Operator,
            _ => TokenCategory::Keyword,
        }
    }

    /// Text used for this kind in messages: the keyword or punctuation text,
    /// or a descriptive name for the special kinds.
    pub fn text(self) -> &'static str {
        if let Some(text) = self.keyword_text().or_else(|| self.punctuation_text()) {
            return text;
        }
        match self {
            TokenKind::Unknown => "unknown",
            TokenKind::EndOfFile => "end of file",
            TokenKind::Whitespace => "whitespace",
            TokenKind::NewLine => "newline",
            TokenKind::Comment => "comment",
            TokenKind::Identifier => "identifier",
            TokenKind::NumberLiteral => "number",
            TokenKind::StringLiteral => "string",
            _ => "token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl serde::Serialize for TokenKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup_ignores_case() {
        assert_eq!(TokenKind::from_keyword("FOR"), Some(TokenKind::ForKeyword));
        assert_eq!(TokenKind::from_keyword("For"), Some(TokenKind::ForKeyword));
        assert_eq!(
            TokenKind::from_keyword("reoptimization"),
            Some(TokenKind::ReoptimizationKeyword)
        );
        assert_eq!(TokenKind::from_keyword("customer"), None);
        assert_eq!(TokenKind::from_keyword("é"), None);
    }

    #[test]
    fn test_keyword_table_round_trips() {
        for &kind in TokenKind::KEYWORDS {
            let text = kind.keyword_text().unwrap();
            assert!(text.len() <= MAX_KEYWORD_LEN);
            assert_eq!(TokenKind::from_keyword(text), Some(kind));
        }
    }

    #[test]
    fn test_rule_names() {
        assert_eq!(TokenKind::from_rule_name("End"), Some(TokenKind::EndKeyword));
        assert_eq!(TokenKind::from_rule_name("("), Some(TokenKind::OpenParenToken));
        assert_eq!(TokenKind::from_rule_name("identifier"), Some(TokenKind::Identifier));
        assert_eq!(TokenKind::from_rule_name("string"), Some(TokenKind::StringKeyword));
        assert_eq!(TokenKind::from_rule_name("stringLiteral"), Some(TokenKind::StringLiteral));
        assert_eq!(TokenKind::from_rule_name("nonsense"), None);
    }

    #[test]
    fn test_categories() {
        assert_eq!(TokenKind::ForKeyword.category(), TokenCategory::Keyword);
        assert_eq!(TokenKind::PlusToken.category(), TokenCategory::Operator);
        assert_eq!(TokenKind::CommaToken.category(), TokenCategory::Punctuation);
        assert_eq!(TokenKind::Identifier.category(), TokenCategory::Identifier);
        assert_eq!(TokenCategory::from_name("KEYWORD"), Some(TokenCategory::Keyword));
    }

    #[test]
    fn test_contextual_keywords_are_names() {
        assert!(TokenKind::ActionKeyword.can_be_identifier());
        assert!(TokenKind::TextKeyword.can_be_identifier());
        assert!(!TokenKind::EndKeyword.can_be_identifier());
        assert!(!TokenKind::CommaToken.can_be_identifier());
    }
}
