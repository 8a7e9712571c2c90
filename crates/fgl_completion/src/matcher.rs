//! Backward matching of search items against the tokens before a trigger.
//!
//! `backward` holds the significant tokens preceding the trigger, nearest
//! first: `backward[0]` is the token immediately before the trigger.

use crate::rules::{BackwardSearchItem, ContextPossibility, OrderedTarget, SearchPattern};
use fgl_ast::TokenKind;
use fgl_core::version::LanguageVersion;

/// Whether `pattern` is found scanning `backward`.
pub fn pattern_found(pattern: &SearchPattern, backward: &[TokenKind]) -> bool {
    match pattern {
        SearchPattern::Token(kind) => backward.first() == Some(kind),
        SearchPattern::Ordered(targets) => ordered_found(targets, backward),
    }
}

/// Scan for the required targets of an ordered set, in order. A
/// `fail_if_match` target is armed once the required targets listed before
/// it are found, and disarmed once the next required target after it is
/// found; hitting an armed target fails the whole set. Targets after the
/// last required one stay armed until the scan runs out.
fn ordered_found(targets: &[OrderedTarget], backward: &[TokenKind]) -> bool {
    let mut cursor = 0;
    for &kind in backward {
        let segment = &targets[cursor..];
        let required = segment.iter().position(|target| !target.fail_if_match);
        let armed = &segment[..required.unwrap_or(segment.len())];
        if armed.iter().any(|target| target.kind == kind) {
            return false;
        }
        if let Some(offset) = required {
            if segment[offset].kind == kind {
                cursor += offset + 1;
                if cursor == targets.len() {
                    return true;
                }
            }
        }
    }
    targets[cursor..].iter().all(|target| target.fail_if_match)
}

/// Whether one search item holds: found when it must match, absent when it
/// must not. Items newer than `version` always hold.
pub fn item_holds(item: &BackwardSearchItem, backward: &[TokenKind], version: LanguageVersion) -> bool {
    if !item.min_version.is_available_in(version) {
        return true;
    }
    pattern_found(&item.pattern, backward) == item.must_match
}

/// Whether a possibility qualifies: available in `version` and every search
/// item holds.
pub fn possibility_qualifies(
    possibility: &ContextPossibility,
    backward: &[TokenKind],
    version: LanguageVersion,
) -> bool {
    possibility.min_version.is_available_in(version)
        && possibility
            .backward_search
            .iter()
            .all(|item| item_holds(item, backward, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgl_ast::TokenKind as K;

    fn target(kind: TokenKind) -> OrderedTarget {
        OrderedTarget {
            kind,
            fail_if_match: false,
        }
    }

    fn fail(kind: TokenKind) -> OrderedTarget {
        OrderedTarget {
            kind,
            fail_if_match: true,
        }
    }

    fn item(pattern: SearchPattern, must_match: bool) -> BackwardSearchItem {
        BackwardSearchItem {
            pattern,
            must_match,
            min_version: LanguageVersion::BASELINE,
        }
    }

    #[test]
    fn test_single_token_is_adjacent_only() {
        let pattern = SearchPattern::Token(K::EndKeyword);
        assert!(pattern_found(&pattern, &[K::EndKeyword, K::LetKeyword]));
        assert!(!pattern_found(&pattern, &[K::LetKeyword, K::EndKeyword]));
        assert!(!pattern_found(&pattern, &[]));
    }

    #[test]
    fn test_negative_item() {
        let no_end = item(SearchPattern::Token(K::EndKeyword), false);
        let version = LanguageVersion::LATEST;
        assert!(!item_holds(&no_end, &[K::EndKeyword], version));
        assert!(item_holds(&no_end, &[K::Identifier, K::EndKeyword], version));
    }

    #[test]
    fn test_ordered_targets_in_sequence() {
        let pattern = SearchPattern::Ordered(vec![target(K::ToKeyword), target(K::ForKeyword)]);
        assert!(pattern_found(&pattern, &[K::NumberLiteral, K::ToKeyword, K::Identifier, K::ForKeyword]));
        assert!(!pattern_found(&pattern, &[K::ForKeyword, K::ToKeyword]));
    }

    #[test]
    fn test_fail_target_guards_until_next_required() {
        // Find PREPARE without crossing an END.
        let pattern = SearchPattern::Ordered(vec![fail(K::EndKeyword), target(K::PrepareKeyword)]);
        assert!(pattern_found(&pattern, &[K::Identifier, K::PrepareKeyword, K::EndKeyword]));
        assert!(!pattern_found(&pattern, &[K::Identifier, K::EndKeyword, K::PrepareKeyword]));
    }

    #[test]
    fn test_trailing_fail_target_stays_armed() {
        let pattern = SearchPattern::Ordered(vec![target(K::IntoKeyword), fail(K::FetchKeyword)]);
        assert!(pattern_found(&pattern, &[K::IntoKeyword, K::Identifier]));
        assert!(!pattern_found(&pattern, &[K::IntoKeyword, K::Identifier, K::FetchKeyword]));
    }

    #[test]
    fn test_possibility_version_gate() {
        let possibility = ContextPossibility {
            min_version: LanguageVersion::V3_00,
            ..ContextPossibility::default()
        };
        assert!(!possibility_qualifies(&possibility, &[], LanguageVersion::V2_50));
        assert!(possibility_qualifies(&possibility, &[], LanguageVersion::V3_00));
    }

    #[test]
    fn test_newer_item_is_ignored() {
        let newer = BackwardSearchItem {
            min_version: LanguageVersion::V4_00,
            ..item(SearchPattern::Token(K::EndKeyword), true)
        };
        assert!(item_holds(&newer, &[], LanguageVersion::V3_20));
        assert!(!item_holds(&newer, &[], LanguageVersion::V4_00));
    }
}
