//! Flag types shared by tokens and declarations.

use serde::Serialize;
use std::fmt;

bitflags::bitflags! {
    /// Flags attached to a scanned token.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TokenFlags: u16 {
        const NONE                  = 0;
        const PRECEDING_LINE_BREAK  = 1 << 0;
        const UNTERMINATED          = 1 << 1;
        const SCIENTIFIC            = 1 << 2;
        const DECIMAL_POINT         = 1 << 3;
        const DOUBLE_QUOTED         = 1 << 4;
        const IS_INVALID            = 1 << 5;

        const NUMERIC_LITERAL_FLAGS = Self::SCIENTIFIC.bits() | Self::DECIMAL_POINT.bits();
    }
}

/// Visibility of a module-level declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessModifier {
    /// No modifier written. Functions default to public, variables to
    /// module-private.
    #[default]
    Default,
    Public,
    Private,
}

impl fmt::Display for AccessModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessModifier::Default => Ok(()),
            AccessModifier::Public => write!(f, "public"),
            AccessModifier::Private => write!(f, "private"),
        }
    }
}
