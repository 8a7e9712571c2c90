use fgl_core::version::LanguageVersion;
use fgl_options::{find_options_file, load_options, OptionsError, CONFIG_FILE_NAME};
use std::fs;

#[test]
fn test_options_file_found_in_ancestor() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("src").join("orders");
    fs::create_dir_all(&nested).unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{ "languageVersion": "3.10", "rulesFile": "rules/context.json" }"#,
    )
    .unwrap();

    let found = find_options_file(&nested).unwrap();
    assert_eq!(found, dir.path().join(CONFIG_FILE_NAME));

    let (options, path) = load_options(None, &nested).unwrap();
    assert_eq!(path, Some(found));
    assert_eq!(options.language_version(), LanguageVersion::V3_10);
    assert_eq!(options.rules_file, Some(dir.path().join("rules/context.json")));
}

#[test]
fn test_defaults_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let (options, path) = load_options(None, dir.path()).unwrap();
    assert!(path.is_none());
    assert_eq!(options.language_version(), LanguageVersion::LATEST);
}

#[test]
fn test_explicit_file_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    let err = load_options(Some(&missing), dir.path()).unwrap_err();
    assert!(matches!(err, OptionsError::Io { .. }));
}

#[test]
fn test_malformed_file_names_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "{ \"verbatim\": 3 }").unwrap();
    let err = load_options(Some(&path), dir.path()).unwrap_err();
    assert!(matches!(err, OptionsError::Json { .. }));
    assert!(err.to_string().contains(CONFIG_FILE_NAME));
}
