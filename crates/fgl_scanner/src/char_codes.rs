//! Character classification helpers.

/// `\n`, `\r` and the Unicode line and paragraph separators.
#[inline]
pub fn is_line_break(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Blanks that do not end a line. A byte order mark counts as one.
#[inline]
pub fn is_white_space_single_line(ch: char) -> bool {
    match ch {
        ' ' | '\t' | '\u{0B}' | '\u{0C}' | '\u{FEFF}' => true,
        _ if is_line_break(ch) || ch.is_ascii() => false,
        _ => ch.is_whitespace(),
    }
}

#[inline]
pub fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

/// Letters and `_`, plus non-ASCII XID start characters.
#[inline]
pub fn is_identifier_start(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic() || (ch as u32 > 0x7F && unicode_xid::UnicodeXID::is_xid_start(ch))
}

/// Anything that may start an identifier, digits, and XID continue
/// characters.
#[inline]
pub fn is_identifier_part(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphanumeric() || (ch as u32 > 0x7F && unicode_xid::UnicodeXID::is_xid_continue(ch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_chars() {
        assert!(is_identifier_start('_'));
        assert!(is_identifier_start('é'));
        assert!(!is_identifier_start('1'));
        assert!(is_identifier_part('1'));
        assert!(!is_identifier_part('$'));
    }

    #[test]
    fn test_single_line_white_space() {
        assert!(is_white_space_single_line('\t'));
        assert!(is_white_space_single_line('\u{00A0}'));
        assert!(is_white_space_single_line('\u{FEFF}'));
        assert!(!is_white_space_single_line('\n'));
        assert!(!is_white_space_single_line('\u{2028}'));
        assert!(!is_white_space_single_line('x'));
    }
}
