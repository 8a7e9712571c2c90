//! Publishing rule tables.
//!
//! The registry owns the currently published [`RuleTable`] behind an
//! `RwLock<Arc<_>>`. Readers clone the `Arc` and keep using that snapshot for
//! as long as they like. A reload builds a complete new table off to the
//! side and only then swaps the pointer, so a failed reload leaves the
//! previous table published.

use crate::document::{document_version, parse_rule_document, RuleLoadError};
use crate::providers::ProviderRegistry;
use crate::rules::RuleTable;
use rustc_hash::FxHashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// The rule document shipped with the crate.
pub const BUNDLED_RULES: &str = include_str!("../rules/context_rules.json");

/// The document version this build of the engine expects.
pub const DEFAULT_PRODUCT_VERSION: &str = "1.0";

/// Where rule documents come from.
pub trait RuleSource: Send + Sync {
    /// Read the current document text.
    fn load(&self) -> Result<String, RuleLoadError>;

    /// Replace the stored document with [`BUNDLED_RULES`].
    fn restore_default(&self) -> Result<(), RuleLoadError>;

    /// A short description for log output.
    fn describe(&self) -> String;
}

impl<T: RuleSource + ?Sized> RuleSource for Arc<T> {
    fn load(&self) -> Result<String, RuleLoadError> {
        (**self).load()
    }

    fn restore_default(&self) -> Result<(), RuleLoadError> {
        (**self).restore_default()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<T: RuleSource + ?Sized> RuleSource for Box<T> {
    fn load(&self) -> Result<String, RuleLoadError> {
        (**self).load()
    }

    fn restore_default(&self) -> Result<(), RuleLoadError> {
        (**self).restore_default()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// A rule document held in memory.
pub struct MemoryRuleSource {
    text: Mutex<String>,
}

impl MemoryRuleSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(text.into()),
        }
    }

    pub fn bundled() -> Self {
        Self::new(BUNDLED_RULES)
    }

    /// Replace the document; takes effect on the next reload.
    pub fn set(&self, text: impl Into<String>) {
        *self.text.lock().unwrap_or_else(PoisonError::into_inner) = text.into();
    }
}

impl RuleSource for MemoryRuleSource {
    fn load(&self) -> Result<String, RuleLoadError> {
        Ok(self.text.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn restore_default(&self) -> Result<(), RuleLoadError> {
        self.set(BUNDLED_RULES);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// A rule document stored in a file. Restoring the default overwrites the
/// file with the bundled document.
pub struct FileRuleSource {
    path: PathBuf,
}

impl FileRuleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> RuleLoadError {
        RuleLoadError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl RuleSource for FileRuleSource {
    fn load(&self) -> Result<String, RuleLoadError> {
        fs::read_to_string(&self.path).map_err(|err| self.io_error(err))
    }

    fn restore_default(&self) -> Result<(), RuleLoadError> {
        fs::write(&self.path, BUNDLED_RULES).map_err(|err| self.io_error(err))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Holds the published rule table and reloads it from a [`RuleSource`].
pub struct RuleRegistry {
    table: RwLock<Arc<RuleTable>>,
    reload_lock: Mutex<()>,
    source: Box<dyn RuleSource>,
    product_version: String,
    providers: FxHashSet<String>,
}

impl RuleRegistry {
    /// A registry with an empty table. Call [`reload`](Self::reload) to
    /// publish the source's document. Provider ids are taken from
    /// `providers` and used to validate documents.
    pub fn new(
        source: impl RuleSource + 'static,
        product_version: impl Into<String>,
        providers: &ProviderRegistry,
    ) -> Self {
        Self {
            table: RwLock::new(Arc::new(RuleTable::default())),
            reload_lock: Mutex::new(()),
            source: Box::new(source),
            product_version: product_version.into(),
            providers: providers.ids().map(str::to_string).collect(),
        }
    }

    /// A registry loaded from the bundled document.
    pub fn bundled(providers: &ProviderRegistry) -> Result<Self, RuleLoadError> {
        let registry = Self::new(MemoryRuleSource::bundled(), DEFAULT_PRODUCT_VERSION, providers);
        registry.reload()?;
        Ok(registry)
    }

    /// The currently published table.
    pub fn current(&self) -> Arc<RuleTable> {
        Arc::clone(&self.table.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn product_version(&self) -> &str {
        &self.product_version
    }

    pub fn source(&self) -> &dyn RuleSource {
        self.source.as_ref()
    }

    /// Load, validate and publish the source's document. Returns the number
    /// of entries published.
    ///
    /// A document tagged with a different version than the product expects
    /// is replaced by the bundled default through the source, which is then
    /// loaded instead. Reloads are serialized; on any error the previously
    /// published table stays in place.
    #[tracing::instrument(level = "debug", skip_all, fields(source = %self.source.describe()))]
    pub fn reload(&self) -> Result<usize, RuleLoadError> {
        let _guard = self.reload_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let table = match self.load_checked() {
            Err(RuleLoadError::VersionMismatch { expected, found }) => {
                warn!(%expected, %found, "rule document version mismatch, restoring bundled rules");
                self.source.restore_default()?;
                self.load_checked()?
            }
            result => result?,
        };

        let count = table.len();
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(table);
        debug!(entries = count, "published rule table");
        Ok(count)
    }

    fn load_checked(&self) -> Result<RuleTable, RuleLoadError> {
        let text = self.source.load()?;
        let found = document_version(&text)?;
        if found != self.product_version {
            return Err(RuleLoadError::VersionMismatch {
                expected: self.product_version.clone(),
                found,
            });
        }
        parse_rule_document(&text, |id| self.providers.contains(id))
    }
}

/// Reload `registry` on a background thread. Failures are logged and also
/// returned through the join handle for callers that wait.
pub fn spawn_reload(
    registry: &Arc<RuleRegistry>,
) -> io::Result<JoinHandle<Result<usize, RuleLoadError>>> {
    let registry = Arc::clone(registry);
    thread::Builder::new()
        .name("fgl-rule-reload".to_string())
        .spawn(move || {
            let result = registry.reload();
            if let Err(err) = &result {
                warn!(error = %err, "background rule reload failed");
            }
            result
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgl_ast::TokenKind;
    use fgl_core::version::LanguageVersion;

    const SMALL: &str = r#"{ "version": "1.0", "entries": [ { "token": "let" } ] }"#;

    fn registry(text: &str) -> RuleRegistry {
        RuleRegistry::new(MemoryRuleSource::new(text), "1.0", &ProviderRegistry::with_builtins())
    }

    #[test]
    fn test_bundled_rules_load() {
        let registry = RuleRegistry::bundled(&ProviderRegistry::with_builtins()).unwrap();
        let table = registry.current();
        assert_eq!(table.version, DEFAULT_PRODUCT_VERSION);
        assert!(table.lookup(TokenKind::ForKeyword, LanguageVersion::LATEST).is_some());
    }

    #[test]
    fn test_failed_reload_keeps_previous_table() {
        let source = Arc::new(MemoryRuleSource::new(SMALL));
        let registry = RuleRegistry::new(
            Arc::clone(&source),
            "1.0",
            &ProviderRegistry::with_builtins(),
        );
        assert_eq!(registry.reload().unwrap(), 1);
        let before = registry.current();

        source.set(r#"{ "version": "1.0", "entries": [ { "token": "let" }, { "token": "bogus" } ] }"#);
        assert!(matches!(registry.reload(), Err(RuleLoadError::UnknownToken { .. })));
        assert!(Arc::ptr_eq(&before, &registry.current()));
    }

    #[test]
    fn test_snapshot_survives_swap() {
        let registry = registry(SMALL);
        registry.reload().unwrap();
        let snapshot = registry.current();
        registry.reload().unwrap();
        assert!(!Arc::ptr_eq(&snapshot, &registry.current()));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_version_mismatch_restores_bundled() {
        let registry = registry(r#"{ "version": "0.1", "entries": [ { "token": "nonsense" } ] }"#);
        let count = registry.reload().unwrap();
        assert!(count > 1);
        assert_eq!(registry.source().load().unwrap(), BUNDLED_RULES);
    }

    #[test]
    fn test_mismatch_with_bundled_is_an_error() {
        let registry = RuleRegistry::new(MemoryRuleSource::new(SMALL), "9.9", &ProviderRegistry::with_builtins());
        let err = registry.reload().unwrap_err();
        assert!(matches!(err, RuleLoadError::VersionMismatch { ref found, .. } if found == "1.0"));
        assert!(registry.current().is_empty());
    }

    #[test]
    fn test_spawn_reload() {
        let registry = Arc::new(registry(SMALL));
        let handle = spawn_reload(&registry).unwrap();
        assert_eq!(handle.join().unwrap().unwrap(), 1);
        assert_eq!(registry.current().len(), 1);
    }
}
