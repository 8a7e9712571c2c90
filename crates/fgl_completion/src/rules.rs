//! The in-memory completion rule table.
//!
//! A table maps a trigger (the token just before the word being completed)
//! to an ordered list of possibilities. Tables are immutable once built; the
//! registry replaces them wholesale on reload.

use crate::providers::MemberKinds;
use fgl_ast::{TokenCategory, TokenKind};
use fgl_core::version::LanguageVersion;
use rustc_hash::FxHashMap;
use std::fmt;

/// What a context entry is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKey {
    Token(TokenKind),
    Category(TokenCategory),
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerKey::Token(kind) => write!(f, "token '{}'", kind.text()),
            TriggerKey::Category(category) => write!(f, "category '{}'", category),
        }
    }
}

/// All possibilities for one trigger.
#[derive(Debug, Clone)]
pub struct ContextEntry {
    pub trigger: TriggerKey,
    pub min_version: LanguageVersion,
    /// Evaluated in order; the first one that qualifies wins.
    pub possibilities: Vec<ContextPossibility>,
}

/// One alternative set of candidates, guarded by backward conditions.
#[derive(Debug, Clone)]
pub struct ContextPossibility {
    pub min_version: LanguageVersion,
    pub single_tokens: Vec<SingleToken>,
    pub set_providers: Vec<ProviderRef>,
    pub backward_search: Vec<BackwardSearchItem>,
}

impl Default for ContextPossibility {
    fn default() -> Self {
        Self {
            min_version: LanguageVersion::BASELINE,
            single_tokens: Vec::new(),
            set_providers: Vec::new(),
            backward_search: Vec::new(),
        }
    }
}

/// A token offered verbatim as a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleToken {
    pub kind: TokenKind,
    pub min_version: LanguageVersion,
}

/// A reference to a registered candidate provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRef {
    pub provider: String,
    /// Member kinds this provider may contribute in this context.
    pub member_kinds: MemberKinds,
    pub min_version: LanguageVersion,
}

/// A condition checked by scanning tokens backward from the trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackwardSearchItem {
    pub pattern: SearchPattern,
    /// True: the pattern must be found. False: finding it disqualifies the
    /// possibility.
    pub must_match: bool,
    pub min_version: LanguageVersion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPattern {
    /// The token immediately before the trigger.
    Token(TokenKind),
    /// Targets found in order while scanning backward.
    Ordered(Vec<OrderedTarget>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderedTarget {
    pub kind: TokenKind,
    /// Seeing this target before the next required one fails the pattern.
    pub fail_if_match: bool,
}

/// An immutable, published set of context entries.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    /// The `version` tag of the document the table was built from.
    pub version: String,
    entries: FxHashMap<TriggerKey, ContextEntry>,
}

impl RuleTable {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            entries: FxHashMap::default(),
        }
    }

    /// Insert an entry. Returns false, leaving the table unchanged, when the
    /// trigger already has an entry.
    pub fn insert(&mut self, entry: ContextEntry) -> bool {
        if self.entries.contains_key(&entry.trigger) {
            return false;
        }
        self.entries.insert(entry.trigger, entry);
        true
    }

    pub fn get(&self, trigger: TriggerKey) -> Option<&ContextEntry> {
        self.entries.get(&trigger)
    }

    /// The entry for a trigger token: its kind first, then its category.
    /// Entries newer than `version` are ignored.
    pub fn lookup(&self, kind: TokenKind, version: LanguageVersion) -> Option<&ContextEntry> {
        [TriggerKey::Token(kind), TriggerKey::Category(kind.category())]
            .into_iter()
            .filter_map(|key| self.entries.get(&key))
            .find(|entry| entry.min_version.is_available_in(version))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(trigger: TriggerKey, min_version: LanguageVersion) -> ContextEntry {
        ContextEntry {
            trigger,
            min_version,
            possibilities: Vec::new(),
        }
    }

    #[test]
    fn test_lookup_prefers_kind_over_category() {
        let mut table = RuleTable::new("1.0");
        assert!(table.insert(entry(TriggerKey::Category(TokenCategory::Keyword), LanguageVersion::BASELINE)));
        assert!(table.insert(entry(TriggerKey::Token(TokenKind::ForKeyword), LanguageVersion::BASELINE)));
        assert!(!table.insert(entry(TriggerKey::Token(TokenKind::ForKeyword), LanguageVersion::V3_00)));

        let found = table.lookup(TokenKind::ForKeyword, LanguageVersion::LATEST).unwrap();
        assert_eq!(found.trigger, TriggerKey::Token(TokenKind::ForKeyword));
        let found = table.lookup(TokenKind::WhileKeyword, LanguageVersion::LATEST).unwrap();
        assert_eq!(found.trigger, TriggerKey::Category(TokenCategory::Keyword));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_lookup_skips_newer_entries() {
        let mut table = RuleTable::new("1.0");
        table.insert(entry(TriggerKey::Token(TokenKind::TryKeyword), LanguageVersion::V3_00));
        assert!(table.lookup(TokenKind::TryKeyword, LanguageVersion::V2_50).is_none());
        assert!(table.lookup(TokenKind::TryKeyword, LanguageVersion::V3_00).is_some());
    }
}
