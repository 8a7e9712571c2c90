//! Loading rule tables from JSON documents.
//!
//! A document is deserialized into raw serde structs first, then every
//! entry is validated and converted. Any invalid entry fails the whole load;
//! a partially valid table is never produced.

use crate::providers::MemberKinds;
use crate::rules::{
    BackwardSearchItem, ContextEntry, ContextPossibility, OrderedTarget, ProviderRef, RuleTable,
    SearchPattern, SingleToken, TriggerKey,
};
use fgl_ast::{TokenCategory, TokenKind};
use fgl_core::version::{LanguageVersion, VersionParseError};
use serde::Deserialize;
use std::path::PathBuf;

/// Why a rule document could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum RuleLoadError {
    #[error("failed to access rule document '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed rule document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{at}: entry must name a 'token' or a 'category'")]
    MissingTrigger { at: String },

    #[error("{at}: entry names both a 'token' and a 'category'")]
    AmbiguousTrigger { at: String },

    #[error("{at}: unknown token '{name}'")]
    UnknownToken { at: String, name: String },

    #[error("{at}: unknown token category '{name}'")]
    UnknownCategory { at: String, name: String },

    #[error("{at}: unknown provider '{name}'")]
    UnknownProvider { at: String, name: String },

    #[error("{at}: unknown member kind '{name}'")]
    UnknownMemberKind { at: String, name: String },

    #[error("{at}: duplicate entry for {trigger}")]
    DuplicateTrigger { at: String, trigger: TriggerKey },

    #[error("{at}: {source}")]
    InvalidVersion {
        at: String,
        #[source]
        source: VersionParseError,
    },

    #[error("{at}: search item must have either a 'token' or a non-empty 'ordered' list")]
    InvalidPattern { at: String },

    #[error("rule document version '{found}' does not match the expected version '{expected}'")]
    VersionMismatch { expected: String, found: String },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawDocument {
    version: String,
    #[serde(default)]
    entries: Vec<RawEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawEntry {
    token: Option<String>,
    category: Option<String>,
    min_version: Option<String>,
    #[serde(default)]
    possibilities: Vec<RawPossibility>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawPossibility {
    min_version: Option<String>,
    #[serde(default)]
    single_tokens: Vec<RawSingleToken>,
    #[serde(default)]
    set_providers: Vec<RawProviderRef>,
    #[serde(default)]
    backward_search: Vec<RawSearchItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawSingleToken {
    token: String,
    min_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawProviderRef {
    provider: String,
    member_kinds: Option<Vec<String>>,
    min_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawSearchItem {
    token: Option<String>,
    ordered: Option<Vec<RawOrderedTarget>>,
    #[serde(default = "default_must_match")]
    must_match: bool,
    min_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawOrderedTarget {
    token: String,
    #[serde(default)]
    fail_if_match: bool,
}

fn default_must_match() -> bool {
    true
}

#[derive(Deserialize)]
struct RawHeader {
    version: String,
}

/// Read only the `version` tag of a document, without validating entries.
pub fn document_version(text: &str) -> Result<String, RuleLoadError> {
    let header: RawHeader = serde_json::from_str(text)?;
    Ok(header.version)
}

/// Parse and validate a rule document. `is_provider` decides which provider
/// ids are known.
pub fn parse_rule_document(
    text: &str,
    is_provider: impl Fn(&str) -> bool,
) -> Result<RuleTable, RuleLoadError> {
    let raw: RawDocument = serde_json::from_str(text)?;
    let mut table = RuleTable::new(raw.version);
    for (index, raw_entry) in raw.entries.into_iter().enumerate() {
        let at = format!("entries[{index}]");
        let entry = convert_entry(raw_entry, &at, &is_provider)?;
        let trigger = entry.trigger;
        if !table.insert(entry) {
            return Err(RuleLoadError::DuplicateTrigger { at, trigger });
        }
    }
    Ok(table)
}

fn convert_entry(
    raw: RawEntry,
    at: &str,
    is_provider: &impl Fn(&str) -> bool,
) -> Result<ContextEntry, RuleLoadError> {
    let trigger = match (raw.token, raw.category) {
        (Some(_), Some(_)) => return Err(RuleLoadError::AmbiguousTrigger { at: at.to_string() }),
        (None, None) => return Err(RuleLoadError::MissingTrigger { at: at.to_string() }),
        (Some(name), None) => TriggerKey::Token(token_kind(&name, at)?),
        (None, Some(name)) => match TokenCategory::from_name(&name) {
            Some(category) => TriggerKey::Category(category),
            None => return Err(RuleLoadError::UnknownCategory { at: at.to_string(), name }),
        },
    };
    let possibilities = raw
        .possibilities
        .into_iter()
        .enumerate()
        .map(|(index, possibility)| {
            convert_possibility(possibility, &format!("{at}.possibilities[{index}]"), is_provider)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ContextEntry {
        trigger,
        min_version: version(raw.min_version, at)?,
        possibilities,
    })
}

fn convert_possibility(
    raw: RawPossibility,
    at: &str,
    is_provider: &impl Fn(&str) -> bool,
) -> Result<ContextPossibility, RuleLoadError> {
    let mut possibility = ContextPossibility {
        min_version: version(raw.min_version, at)?,
        ..ContextPossibility::default()
    };

    for (index, single) in raw.single_tokens.into_iter().enumerate() {
        let at = format!("{at}.singleTokens[{index}]");
        possibility.single_tokens.push(SingleToken {
            kind: token_kind(&single.token, &at)?,
            min_version: version(single.min_version, &at)?,
        });
    }

    for (index, provider) in raw.set_providers.into_iter().enumerate() {
        let at = format!("{at}.setProviders[{index}]");
        if !is_provider(&provider.provider) {
            return Err(RuleLoadError::UnknownProvider { at, name: provider.provider });
        }
        let member_kinds = match &provider.member_kinds {
            None => MemberKinds::all(),
            Some(names) => MemberKinds::from_names(names.iter().map(String::as_str)).map_err(
                |name| RuleLoadError::UnknownMemberKind {
                    at: at.clone(),
                    name: name.to_string(),
                },
            )?,
        };
        possibility.set_providers.push(ProviderRef {
            provider: provider.provider,
            member_kinds,
            min_version: version(provider.min_version, &at)?,
        });
    }

    for (index, item) in raw.backward_search.into_iter().enumerate() {
        let at = format!("{at}.backwardSearch[{index}]");
        let pattern = match (item.token, item.ordered) {
            (Some(name), None) => SearchPattern::Token(token_kind(&name, &at)?),
            (None, Some(targets)) if !targets.is_empty() => SearchPattern::Ordered(
                targets
                    .into_iter()
                    .map(|target| -> Result<OrderedTarget, RuleLoadError> {
                        Ok(OrderedTarget {
                            kind: token_kind(&target.token, &at)?,
                            fail_if_match: target.fail_if_match,
                        })
                    })
                    .collect::<Result<Vec<_>, RuleLoadError>>()?,
            ),
            _ => return Err(RuleLoadError::InvalidPattern { at }),
        };
        possibility.backward_search.push(BackwardSearchItem {
            pattern,
            must_match: item.must_match,
            min_version: version(item.min_version, &at)?,
        });
    }

    Ok(possibility)
}

fn token_kind(name: &str, at: &str) -> Result<TokenKind, RuleLoadError> {
    TokenKind::from_rule_name(name).ok_or_else(|| RuleLoadError::UnknownToken {
        at: at.to_string(),
        name: name.to_string(),
    })
}

fn version(text: Option<String>, at: &str) -> Result<LanguageVersion, RuleLoadError> {
    match text {
        None => Ok(LanguageVersion::BASELINE),
        Some(text) => text.parse().map_err(|source| RuleLoadError::InvalidVersion {
            at: at.to_string(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<RuleTable, RuleLoadError> {
        parse_rule_document(text, |id| matches!(id, "variables" | "functions"))
    }

    #[test]
    fn test_full_entry() {
        let table = parse(
            r#"{ "version": "1.0", "entries": [
                { "token": "for", "possibilities": [
                    { "minVersion": "2.20",
                      "singleTokens": [ { "token": "to" }, { "token": "step", "minVersion": "3.0" } ],
                      "setProviders": [ { "provider": "variables", "memberKinds": ["variables"] } ],
                      "backwardSearch": [
                        { "token": "end", "mustMatch": false },
                        { "ordered": [ { "token": "end", "failIfMatch": true }, { "token": "prepare" } ] }
                      ] } ] },
                { "category": "identifier" } ] }"#,
        )
        .unwrap();

        assert_eq!(table.version, "1.0");
        assert_eq!(table.len(), 2);
        let entry = table.get(TriggerKey::Token(TokenKind::ForKeyword)).unwrap();
        assert_eq!(entry.min_version, LanguageVersion::BASELINE);
        let possibility = &entry.possibilities[0];
        assert_eq!(possibility.min_version, LanguageVersion::V2_20);
        assert_eq!(possibility.single_tokens[1].min_version, LanguageVersion::V3_00);
        assert_eq!(possibility.set_providers[0].member_kinds, MemberKinds::VARIABLES);
        assert!(!possibility.backward_search[0].must_match);
        assert!(possibility.backward_search[1].must_match);
        assert_eq!(
            possibility.backward_search[1].pattern,
            SearchPattern::Ordered(vec![
                OrderedTarget { kind: TokenKind::EndKeyword, fail_if_match: true },
                OrderedTarget { kind: TokenKind::PrepareKeyword, fail_if_match: false },
            ])
        );
        assert!(table.get(TriggerKey::Category(TokenCategory::Identifier)).is_some());
    }

    #[test]
    fn test_invalid_entries_fail_the_load() {
        let cases = [
            (r#"{ "version": "1", "entries": [ {} ] }"#, "must name a 'token' or a 'category'"),
            (r#"{ "version": "1", "entries": [ { "token": "for", "category": "keyword" } ] }"#, "both"),
            (r#"{ "version": "1", "entries": [ { "token": "forr" } ] }"#, "unknown token 'forr'"),
            (r#"{ "version": "1", "entries": [ { "category": "verb" } ] }"#, "unknown token category"),
            (
                r#"{ "version": "1", "entries": [ { "token": "let", "possibilities": [ { "setProviders": [ { "provider": "widgets" } ] } ] } ] }"#,
                "entries[0].possibilities[0].setProviders[0]: unknown provider 'widgets'",
            ),
            (
                r#"{ "version": "1", "entries": [ { "token": "let", "possibilities": [ { "setProviders": [ { "provider": "variables", "memberKinds": ["widgets"] } ] } ] } ] }"#,
                "unknown member kind 'widgets'",
            ),
            (r#"{ "version": "1", "entries": [ { "token": "for" }, { "token": "FOR" } ] }"#, "entries[1]: duplicate entry"),
            (r#"{ "version": "1", "entries": [ { "token": "for", "minVersion": "three" } ] }"#, "invalid language version"),
            (
                r#"{ "version": "1", "entries": [ { "token": "for", "possibilities": [ { "backwardSearch": [ { "ordered": [] } ] } ] } ] }"#,
                "search item must have",
            ),
        ];
        for (text, expected) in cases {
            let err = parse(text).unwrap_err().to_string();
            assert!(err.contains(expected), "{err:?} should contain {expected:?}");
        }
    }

    #[test]
    fn test_document_version_ignores_entries() {
        let text = r#"{ "version": "0.9", "entries": [ { "token": "forr" } ] }"#;
        assert_eq!(document_version(text).unwrap(), "0.9");
        assert!(parse(text).is_err());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = parse(r#"{ "version": "1", "entries": [ { "token": "for", "possibilites": [] } ] }"#).unwrap_err();
        assert!(matches!(err, RuleLoadError::Json(_)));
    }
}
