use fgl_completion::{
    CompletionEngine, CompletionSet, FileRuleSource, MemberKinds, MemoryRuleSource, ProviderRegistry,
    RuleLoadError, RuleRegistry, BUNDLED_RULES,
};
use fgl_core::text::TextPos;
use fgl_core::version::LanguageVersion;
use std::sync::Arc;
use std::thread;

fn complete(source: &str, version: LanguageVersion, kinds: MemberKinds) -> CompletionSet {
    let engine = CompletionEngine::bundled().unwrap();
    engine.complete_at(source, source.chars().count() as TextPos, version, kinds)
}

fn labels(source: &str) -> Vec<String> {
    complete(source, LanguageVersion::LATEST, MemberKinds::all())
        .labels()
        .into_iter()
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Bundled rules
// ============================================================================

#[test]
fn test_let_offers_variables_matching_prefix() {
    let source = "DEFINE m_count INTEGER\nMAIN\n  DEFINE total INTEGER\n  DEFINE name STRING\n  LET t";
    assert_eq!(labels(source), vec!["total"]);
}

#[test]
fn test_call_offers_functions() {
    let source = "FUNCTION helper(a)\nEND FUNCTION\nFUNCTION go()\n  CALL ";
    assert_eq!(labels(source), vec!["helper", "go"]);
}

#[test]
fn test_end_offers_block_keywords() {
    let found = labels("MAIN\n  IF x THEN\n  END ");
    assert!(found.contains(&"if".to_string()));
    assert!(found.contains(&"function".to_string()));
}

#[test]
fn test_start_of_document_is_version_gated() {
    let at = |version| complete("", version, MemberKinds::all());
    let v2_10 = at(LanguageVersion::V2_10);
    assert!(!v2_10.labels().contains(&"type"));
    assert!(!v2_10.labels().contains(&"import"));

    let v2_20 = at(LanguageVersion::V2_20);
    assert!(v2_20.labels().contains(&"type"));
    assert!(!v2_20.labels().contains(&"import"));

    assert!(at(LanguageVersion::V2_30).labels().contains(&"import"));
}

#[test]
fn test_fetch_direction_offers_cursors() {
    let source = "MAIN\n  PREPARE st FROM \"select 1\"\n  DECLARE c1 CURSOR FOR st\n  FETCH NEXT ";
    assert_eq!(labels(source), vec!["st", "c1"]);
}

#[test]
fn test_next_outside_fetch_offers_option() {
    let source = "MAIN\n  MENU \"m\"\n    COMMAND \"a\"\n      NEXT ";
    assert_eq!(labels(source), vec!["option"]);
}

#[test]
fn test_ordered_search_stops_at_fail_target() {
    let source = "MAIN\n  DECLARE c1 CURSOR FROM \"select 1\"\n  FETCH NEXT c1 ";
    assert_eq!(labels(source), vec!["into"]);

    let source = "MAIN\n  DEFINE a, b INTEGER\n  FETCH c1 INTO a, b ";
    assert!(labels(source).is_empty());
}

#[test]
fn test_if_after_end_starts_a_statement() {
    let source = "MAIN\n  DEFINE n INTEGER\n  IF ";
    let fresh = labels(source);
    assert!(fresh.contains(&"n".to_string()));
    assert!(fresh.contains(&"not".to_string()));

    let closed = labels("MAIN\n  DEFINE n INTEGER\n  IF n THEN\n  END IF ");
    assert!(!closed.contains(&"n".to_string()));
    assert!(closed.contains(&"let".to_string()));
}

#[test]
fn test_member_kind_mask_filters_candidates() {
    let source = "MAIN\n  DEFINE total INTEGER\n  LET ";
    assert!(complete(source, LanguageVersion::LATEST, MemberKinds::KEYWORDS).is_empty());
    let variables = complete(source, LanguageVersion::LATEST, MemberKinds::VARIABLES);
    assert_eq!(variables.labels(), vec!["total"]);
}

// ============================================================================
// Rule sources and reloads
// ============================================================================

#[test]
fn test_file_source_restores_bundled_on_version_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.json");
    std::fs::write(&path, r#"{ "version": "0.5", "entries": [] }"#).unwrap();

    let providers = ProviderRegistry::with_builtins();
    let registry = RuleRegistry::new(FileRuleSource::new(&path), "1.0", &providers);
    assert!(registry.reload().unwrap() > 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), BUNDLED_RULES);
}

#[test]
fn test_missing_file_keeps_published_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.json");
    std::fs::write(&path, r#"{ "version": "1.0", "entries": [ { "token": "let" } ] }"#).unwrap();

    let providers = ProviderRegistry::with_builtins();
    let registry = RuleRegistry::new(FileRuleSource::new(&path), "1.0", &providers);
    registry.reload().unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(registry.reload(), Err(RuleLoadError::Io { .. })));
    assert_eq!(registry.current().len(), 1);
}

#[test]
fn test_readers_see_whole_tables_during_reloads() {
    let one = r#"{ "version": "1.0", "entries": [ { "token": "let" } ] }"#;
    let two = r#"{ "version": "1.0", "entries": [ { "token": "let" }, { "token": "call" } ] }"#;
    let source = Arc::new(MemoryRuleSource::new(one));
    let registry = Arc::new(RuleRegistry::new(
        Arc::clone(&source),
        "1.0",
        &ProviderRegistry::with_builtins(),
    ));
    registry.reload().unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..200 {
                    let len = registry.current().len();
                    assert!(len == 1 || len == 2, "observed a partial table of {len} entries");
                }
            })
        })
        .collect();

    for round in 0..50 {
        source.set(if round % 2 == 0 { two } else { one });
        registry.reload().unwrap();
        // Invalid documents never get published.
        source.set(r#"{ "version": "1.0", "entries": [ { "token": "let" }, {} ] }"#);
        assert!(registry.reload().is_err());
    }

    for reader in readers {
        reader.join().unwrap();
    }
}
