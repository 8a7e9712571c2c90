//! Resolving completion candidates.

use crate::document::RuleLoadError;
use crate::matcher::possibility_qualifies;
use crate::providers::{MemberKinds, ProviderContext, ProviderRegistry};
use crate::registry::RuleRegistry;
use crate::walker::ReverseTokenWalker;
use crate::{CompletionItem, CompletionItemKind, CompletionSet};
use fgl_ast::TokenKind;
use fgl_core::text::TextPos;
use fgl_core::version::LanguageVersion;
use fgl_parser::{parse_module, ParseOptions};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves candidates against the registry's current rule table.
pub struct CompletionEngine {
    rules: Arc<RuleRegistry>,
    providers: Arc<ProviderRegistry>,
}

impl CompletionEngine {
    pub fn new(rules: Arc<RuleRegistry>, providers: Arc<ProviderRegistry>) -> Self {
        Self { rules, providers }
    }

    /// An engine over the bundled rules and the built-in providers.
    pub fn bundled() -> Result<Self, RuleLoadError> {
        let providers = Arc::new(ProviderRegistry::with_builtins());
        let rules = Arc::new(RuleRegistry::bundled(&providers)?);
        Ok(Self::new(rules, providers))
    }

    pub fn rules(&self) -> &Arc<RuleRegistry> {
        &self.rules
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Candidates for `trigger`, given the tokens before it (nearest first).
    ///
    /// The entry for the trigger's kind is used if there is one, otherwise
    /// the entry for its category. The first possibility that qualifies
    /// supplies the candidates; later ones are not consulted. Keyword and
    /// punctuation candidates are only added when `kinds` asks for
    /// keywords, and providers only run for the member kinds both the rule
    /// and the request allow. An empty set means nothing qualified.
    pub fn resolve(
        &self,
        trigger: TokenKind,
        backward: &[TokenKind],
        version: LanguageVersion,
        kinds: MemberKinds,
        ctx: &ProviderContext<'_>,
    ) -> CompletionSet {
        let mut out = CompletionSet::new();
        let table = self.rules.current();
        let Some(entry) = table.lookup(trigger, version) else {
            debug!(%trigger, "no completion entry");
            return out;
        };
        let Some((index, possibility)) = entry
            .possibilities
            .iter()
            .enumerate()
            .find(|(_, possibility)| possibility_qualifies(possibility, backward, version))
        else {
            debug!(trigger = %entry.trigger, "no qualifying possibility");
            return out;
        };
        debug!(trigger = %entry.trigger, possibility = index, "resolved completion context");

        if kinds.contains(MemberKinds::KEYWORDS) {
            for single in &possibility.single_tokens {
                if !single.min_version.is_available_in(version) {
                    continue;
                }
                let kind = if single.kind.is_keyword() {
                    CompletionItemKind::Keyword
                } else if single.kind.is_punctuation() {
                    CompletionItemKind::Operator
                } else {
                    continue;
                };
                out.insert(CompletionItem::new(single.kind.text(), kind));
            }
        }

        for provider in &possibility.set_providers {
            if !provider.min_version.is_available_in(version) {
                continue;
            }
            let Some(registered) = self.providers.kinds(&provider.provider) else {
                warn!(provider = %provider.provider, "rule references an unregistered provider");
                continue;
            };
            if (provider.member_kinds & kinds & registered).is_empty() {
                continue;
            }
            self.providers.provide(&provider.provider, ctx, &mut out);
        }
        out
    }

    /// Complete at a character offset in `text`: walk back from the cursor,
    /// parse the module for the providers, resolve, then keep only the
    /// candidates matching the word being typed.
    #[tracing::instrument(level = "debug", skip_all, fields(offset = offset))]
    pub fn complete_at(
        &self,
        text: &str,
        offset: TextPos,
        version: LanguageVersion,
        kinds: MemberKinds,
    ) -> CompletionSet {
        let context = ReverseTokenWalker::new(text, offset).into_context();
        let parsed = parse_module(text, &ParseOptions::with_version(version));
        let ctx = ProviderContext::new(Some(&parsed.module), context.prefix_start);
        let mut candidates = self.resolve(context.trigger, &context.backward, version, kinds, &ctx);
        candidates.retain_prefix(&context.prefix);
        candidates
    }
}
