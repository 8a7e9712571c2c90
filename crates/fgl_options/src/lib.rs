//! fgl_options: fglconfig.json parsing and front-end options.
//!
//! Every field is optional in the file; accessors fill in defaults. Command
//! line flags are applied on top with [`FrontendOptions::merge`].

use fgl_completion::MemberKinds;
use fgl_core::version::LanguageVersion;
use fgl_parser::ParseOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The file name searched for when no options file is given explicitly.
pub const CONFIG_FILE_NAME: &str = "fglconfig.json";

/// Rule document version expected when the file does not say otherwise.
pub const DEFAULT_PRODUCT_VERSION: &str = fgl_completion::registry::DEFAULT_PRODUCT_VERSION;

#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("failed to read options file '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid options file '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid options: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown member kind '{0}' in 'memberKinds'")]
    UnknownMemberKind(String),
}

/// Front-end options, matching the fglconfig.json schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FrontendOptions {
    /// Active language version, e.g. "3.20".
    pub language_version: Option<LanguageVersion>,
    /// Keep whitespace and comments when parsing.
    pub verbatim: Option<bool>,
    /// Completion rule document. Relative paths are resolved against the
    /// options file's directory.
    pub rules_file: Option<PathBuf>,
    /// Rule document version this product expects.
    pub product_version: Option<String>,
    /// Default member kinds for completion requests.
    pub member_kinds: Option<Vec<String>>,
}

impl FrontendOptions {
    pub fn language_version(&self) -> LanguageVersion {
        self.language_version.unwrap_or_default()
    }

    pub fn verbatim(&self) -> bool {
        self.verbatim.unwrap_or(false)
    }

    pub fn product_version(&self) -> &str {
        self.product_version.as_deref().unwrap_or(DEFAULT_PRODUCT_VERSION)
    }

    /// The completion mask; every kind when none are configured.
    pub fn member_kinds(&self) -> Result<MemberKinds, OptionsError> {
        match &self.member_kinds {
            None => Ok(MemberKinds::all()),
            Some(names) => MemberKinds::from_names(names.iter().map(String::as_str))
                .map_err(|name| OptionsError::UnknownMemberKind(name.to_string())),
        }
    }

    /// Parser options for one file.
    pub fn parse_options(&self, file_name: Option<&str>) -> ParseOptions {
        ParseOptions {
            language_version: self.language_version(),
            verbatim: self.verbatim(),
            file_name: file_name.map(str::to_string),
        }
    }

    /// Overlay the fields set in `overrides`.
    pub fn merge(&mut self, overrides: FrontendOptions) {
        if overrides.language_version.is_some() {
            self.language_version = overrides.language_version;
        }
        if overrides.verbatim.is_some() {
            self.verbatim = overrides.verbatim;
        }
        if overrides.rules_file.is_some() {
            self.rules_file = overrides.rules_file;
        }
        if overrides.product_version.is_some() {
            self.product_version = overrides.product_version;
        }
        if overrides.member_kinds.is_some() {
            self.member_kinds = overrides.member_kinds;
        }
    }
}

/// Parse options from a string.
pub fn parse_options(content: &str) -> Result<FrontendOptions, OptionsError> {
    let options: FrontendOptions = serde_json::from_str(content)?;
    options.member_kinds()?;
    Ok(options)
}

/// Parse an options file. A relative `rulesFile` is made relative to the
/// file's directory.
pub fn parse_options_file(path: &Path) -> Result<FrontendOptions, OptionsError> {
    let content = fs::read_to_string(path).map_err(|source| OptionsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut options = parse_options(&content).map_err(|err| match err {
        OptionsError::Parse(source) => OptionsError::Json {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    if let (Some(rules), Some(dir)) = (&options.rules_file, path.parent()) {
        if rules.is_relative() {
            options.rules_file = Some(dir.join(rules));
        }
    }
    Ok(options)
}

/// Find `fglconfig.json` in `start` or the nearest ancestor directory.
pub fn find_options_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Load options from `explicit` if given (it must exist), otherwise from the
/// nearest `fglconfig.json` above `cwd`, otherwise defaults. Returns the file
/// the options came from.
pub fn load_options(
    explicit: Option<&Path>,
    cwd: &Path,
) -> Result<(FrontendOptions, Option<PathBuf>), OptionsError> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_options_file(cwd),
    };
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading options");
            let options = parse_options_file(&path)?;
            Ok((options, Some(path)))
        }
        None => Ok((FrontendOptions::default(), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = FrontendOptions::default();
        assert_eq!(options.language_version(), LanguageVersion::LATEST);
        assert!(!options.verbatim());
        assert_eq!(options.product_version(), "1.0");
        assert_eq!(options.member_kinds().unwrap(), MemberKinds::all());
    }

    #[test]
    fn test_parse_camel_case_fields() {
        let options = parse_options(
            r#"{ "languageVersion": "2.50", "verbatim": true, "productVersion": "1.1",
                 "memberKinds": ["variables", "keywords"] }"#,
        )
        .unwrap();
        assert_eq!(options.language_version(), LanguageVersion::V2_50);
        assert!(options.verbatim());
        assert_eq!(options.product_version(), "1.1");
        assert_eq!(
            options.member_kinds().unwrap(),
            MemberKinds::VARIABLES | MemberKinds::KEYWORDS
        );
        let parse = options.parse_options(Some("a.4gl"));
        assert_eq!(parse.language_version, LanguageVersion::V2_50);
        assert_eq!(parse.file_name.as_deref(), Some("a.4gl"));
    }

    #[test]
    fn test_invalid_options() {
        assert!(matches!(
            parse_options(r#"{ "memberKinds": ["widgets"] }"#),
            Err(OptionsError::UnknownMemberKind(name)) if name == "widgets"
        ));
        assert!(matches!(parse_options(r#"{ "languageVersion": "x" }"#), Err(OptionsError::Parse(_))));
        assert!(matches!(parse_options(r#"{ "target": "es5" }"#), Err(OptionsError::Parse(_))));
    }

    #[test]
    fn test_merge_overrides_only_set_fields() {
        let mut options = parse_options(r#"{ "languageVersion": "3.00", "verbatim": true }"#).unwrap();
        options.merge(FrontendOptions {
            language_version: Some(LanguageVersion::V3_20),
            ..FrontendOptions::default()
        });
        assert_eq!(options.language_version(), LanguageVersion::V3_20);
        assert!(options.verbatim());
    }
}
