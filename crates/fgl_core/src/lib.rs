//! fgl_core: Core utilities shared by the 4GL front end.
//!
//! Provides character-offset text spans, line maps and the language
//! version marker that gates grammar productions and completion rules.

pub mod text;
pub mod version;

// Re-export commonly used types
pub use text::{LineAndColumn, LineMap, TextPos, TextSpan};
pub use version::{LanguageVersion, VersionParseError};
