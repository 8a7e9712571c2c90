//! fgl_diagnostics: syntax diagnostics.
//!
//! Problems found by the scanner and parser never abort a parse. Each one is
//! recorded as a [`Diagnostic`] with a span, a severity and a stable code,
//! and callers decide how to present them.

use fgl_core::text::TextSpan;
use serde::Serialize;
use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Error,
    Warning,
}

impl DiagnosticCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
        }
    }
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message template. `{0}`, `{1}`... are filled from the arguments given
/// when the diagnostic is created.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

impl DiagnosticMessage {
    /// Substitute `args` into the template.
    pub fn format(&self, args: &[&str]) -> String {
        args.iter()
            .enumerate()
            .fold(self.message.to_string(), |text, (i, arg)| {
                text.replace(&format!("{{{i}}}"), arg)
            })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub file: Option<String>,
    pub span: Option<TextSpan>,
    #[serde(rename = "message")]
    pub message_text: String,
    pub code: u32,
    #[serde(rename = "severity")]
    pub category: DiagnosticCategory,
}

impl Diagnostic {
    /// A diagnostic with no location.
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            file: None,
            span: None,
            message_text: message.format(args),
            code: message.code,
            category: message.category,
        }
    }

    /// A diagnostic covering `span` of the current file.
    pub fn at(span: TextSpan, message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            span: Some(span),
            ..Self::new(message, args)
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }

    fn sort_key(&self) -> (Option<&str>, u32) {
        (self.file.as_deref(), self.span.map_or(0, |span| span.start))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.span) {
            (Some(file), Some(span)) => write!(f, "{file}({}): ", span.start)?,
            (Some(file), None) => write!(f, "{file}: ")?,
            _ => {}
        }
        write!(f, "{} FGL{}: {}", self.category, self.code, self.message_text)
    }
}

/// Diagnostics gathered while scanning and parsing one file.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Fill in `file` wherever a diagnostic has none.
    pub fn set_file(&mut self, file: &str) {
        for diagnostic in self.diagnostics.iter_mut().filter(|d| d.file.is_none()) {
            diagnostic.file = Some(file.to_string());
        }
    }

    /// Order by file, then start offset. Stable, so diagnostics at the same
    /// offset keep the order they were reported in.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    }
}

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Error, message: $msg }
        };
        ($code:expr, Warning, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Warning, message: $msg }
        };
    }

    // Scanner (1000-1099)
    pub const UNTERMINATED_STRING_LITERAL: DiagnosticMessage = diag!(1001, Error, "Unterminated string literal.");
    pub const UNTERMINATED_BLOCK_COMMENT: DiagnosticMessage = diag!(1002, Error, "Unterminated comment; '}' expected.");
    pub const INVALID_CHARACTER: DiagnosticMessage = diag!(1003, Error, "Invalid character '{0}'.");
    pub const MALFORMED_NUMERIC_LITERAL: DiagnosticMessage = diag!(1004, Error, "Malformed numeric literal '{0}'.");


    // Parser (2000-2099)
    pub const _0_EXPECTED: DiagnosticMessage = diag!(2001, Error, "'{0}' expected.");
    pub const EXPRESSION_EXPECTED: DiagnosticMessage = diag!(2002, Error, "Expression expected.");
    pub const IDENTIFIER_EXPECTED: DiagnosticMessage = diag!(2003, Error, "Identifier expected.");
    pub const A_0_STATEMENT_MUST_BE_TERMINATED_WITH_1: DiagnosticMessage = diag!(2004, Error, "A {0} statement must be terminated with '{1}'.");
    pub const _0_1_IS_NOT_VALID_OUTSIDE_A_1_BLOCK: DiagnosticMessage = diag!(2005, Error, "'{0} {1}' is not valid here: there is no enclosing {1} block.");
    pub const UNEXPECTED_TOKEN_0: DiagnosticMessage = diag!(2006, Error, "Unexpected token '{0}'.");
    pub const UNEXPECTED_END_0: DiagnosticMessage = diag!(2007, Error, "Unexpected 'end {0}'.");
    pub const MISSING_COUNTER_VARIABLE_IN_FOR_STATEMENT: DiagnosticMessage = diag!(2008, Error, "Missing counter variable in for statement.");
    pub const TYPE_EXPECTED: DiagnosticMessage = diag!(2009, Error, "Type expected.");
    pub const RETURN_VALUES_ARE_ONLY_ALLOWED_INSIDE_A_FUNCTION: DiagnosticMessage = diag!(2010, Error, "Return values are only allowed inside a function.");
    pub const _0_REQUIRES_LANGUAGE_VERSION_1_OR_LATER: DiagnosticMessage = diag!(2011, Error, "'{0}' requires language version {1} or later.");
    pub const MAXIMUM_NESTING_DEPTH_EXCEEDED: DiagnosticMessage = diag!(2012, Error, "Maximum nesting depth exceeded.");
    pub const A_CASE_STATEMENT_CAN_ONLY_HAVE_ONE_OTHERWISE_CLAUSE: DiagnosticMessage = diag!(2013, Error, "A case statement can only have one 'otherwise' clause.");
    pub const UNEXPECTED_TOKEN_0_AT_MODULE_LEVEL: DiagnosticMessage = diag!(2014, Error, "Unexpected token '{0}' at module level; a function, main block or declaration was expected.");
    pub const A_MODULE_CAN_ONLY_CONTAIN_ONE_MAIN_BLOCK: DiagnosticMessage = diag!(2015, Error, "A module can only contain one main block.");
    pub const _0_MODIFIER_CANNOT_BE_APPLIED_TO_1: DiagnosticMessage = diag!(2016, Error, "'{0}' modifier cannot be applied to {1}.");
    pub const A_MENU_MUST_HAVE_AT_LEAST_ONE_OPTION: DiagnosticMessage = diag!(2018, Warning, "A menu should define at least one command or action.");
    pub const _0_IS_ALREADY_DEFINED_IN_THIS_SCOPE: DiagnosticMessage = diag!(2019, Error, "'{0}' is already defined in this scope.");
    pub const BLOCK_KEYWORD_EXPECTED_AFTER_0: DiagnosticMessage = diag!(2020, Error, "A block keyword was expected after '{0}'.");
    pub const CURSOR_0_CANNOT_BE_DECLARED_HERE: DiagnosticMessage = diag!(2021, Error, "Cursor '{0}' cannot be declared here: no enclosing scope accepts it.");
    pub const CURSOR_0_IS_REDECLARED_INSIDE_THE_FOREACH_THAT_ITERATES_IT: DiagnosticMessage = diag!(2022, Warning, "Cursor '{0}' is redeclared inside the foreach that iterates it.");
}
