//! fgl_completion: Context-driven completion for 4GL source.
//!
//! A [`RuleTable`] maps the token before the cursor to candidate
//! possibilities. The [`CompletionEngine`] walks the text backward from the
//! cursor, picks the first possibility whose backward conditions hold for
//! the active language version, and collects keyword candidates plus
//! whatever the referenced providers contribute from the parsed module.
//!
//! Rule tables are loaded from a JSON document through a [`RuleRegistry`],
//! which validates the whole document before publishing it and swaps tables
//! atomically so readers never observe a partial table.

pub mod document;
pub mod engine;
pub mod matcher;
pub mod providers;
pub mod registry;
pub mod rules;
pub mod walker;

pub use document::{parse_rule_document, RuleLoadError};
pub use engine::CompletionEngine;
pub use providers::{MemberKinds, ProviderContext, ProviderFn, ProviderRegistry};
pub use registry::{
    spawn_reload, FileRuleSource, MemoryRuleSource, RuleRegistry, RuleSource, BUNDLED_RULES,
};
pub use rules::{
    BackwardSearchItem, ContextEntry, ContextPossibility, OrderedTarget, ProviderRef, RuleTable,
    SearchPattern, SingleToken, TriggerKey,
};
pub use walker::{CursorContext, ReverseTokenWalker};

use indexmap::IndexSet;
use serde::Serialize;
use std::hash::{Hash, Hasher};

/// A completion candidate.
///
/// Two items are the same candidate when label and kind match; the detail
/// is informational only.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionItemKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CompletionItem {
    pub fn new(label: impl Into<String>, kind: CompletionItemKind) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl PartialEq for CompletionItem {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && self.kind == other.kind
    }
}

impl Eq for CompletionItem {}

impl Hash for CompletionItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
        self.kind.hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionItemKind {
    Keyword,
    Operator,
    Variable,
    Function,
    Constant,
    Type,
    Cursor,
}

/// Completion candidates in insertion order, without duplicates.
#[derive(Debug, Clone, Default)]
pub struct CompletionSet {
    items: IndexSet<CompletionItem>,
}

impl CompletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item. Returns false if an equal item is already present; the
    /// first occurrence keeps its position and detail.
    pub fn insert(&mut self, item: CompletionItem) -> bool {
        self.items.insert(item)
    }

    pub fn contains(&self, label: &str, kind: CompletionItemKind) -> bool {
        self.items.contains(&CompletionItem::new(label, kind))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompletionItem> {
        self.items.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.label.as_str()).collect()
    }

    /// Keep only items whose label starts with `prefix`, ignoring ASCII case.
    pub fn retain_prefix(&mut self, prefix: &str) {
        if prefix.is_empty() {
            return;
        }
        let prefix = prefix.to_ascii_lowercase();
        self.items
            .retain(|item| item.label.to_ascii_lowercase().starts_with(&prefix));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<CompletionItem> {
        self.items.into_iter().collect()
    }
}

impl Extend<CompletionItem> for CompletionSet {
    fn extend<I: IntoIterator<Item = CompletionItem>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}
