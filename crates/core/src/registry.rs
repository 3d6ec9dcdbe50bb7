//! The keyword registry: immutable definitions looked up by exact name or
//! by wildcard pattern.
//!
//! The registry is built once (programmatically, from JSON, or from a
//! definition directory) and then passed by shared reference into every
//! parse. It is never mutated while a parse is running.

use crate::error::DeckError;
use crate::keyword::KeywordDefinition;
use deckparse_definitions::{from_json_array, from_str, is_valid_name, DefinitionError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const DEFAULT_KEYWORDS: &str = include_str!("../keywords/default_keywords.json");

#[derive(Debug, Clone, Default)]
pub struct KeywordRegistry {
    exact: HashMap<String, KeywordDefinition>,
    /// Wildcard patterns in registration order; the first match wins.
    wildcards: Vec<KeywordDefinition>,
}

/// A definition file that could not be loaded during a directory load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of [`KeywordRegistry::load_directory`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
    pub failures: Vec<LoadFailure>,
}

impl KeywordRegistry {
    pub fn new() -> Self {
        KeywordRegistry::default()
    }

    /// A registry holding the embedded default definition set.
    pub fn with_defaults() -> Result<Self, DeckError> {
        let value: serde_json::Value =
            serde_json::from_str(DEFAULT_KEYWORDS).map_err(DefinitionError::from)?;
        let mut registry = KeywordRegistry::new();
        registry.load_json(&value)?;
        Ok(registry)
    }

    /// Register `def`, replacing any definition of the same name together
    /// with its wildcard entry.
    pub fn register(&mut self, def: KeywordDefinition) {
        self.unregister(def.name());
        if def.is_wildcard() {
            self.wildcards.push(def);
        } else {
            self.exact.insert(def.name().to_owned(), def);
        }
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        if self.exact.remove(name).is_some() {
            return true;
        }
        let before = self.wildcards.len();
        self.wildcards.retain(|def| def.name() != name);
        self.wildcards.len() != before
    }

    /// Lookup among ordinary (non-wildcard) definitions only.
    pub fn exact_lookup(&self, name: &str) -> Option<&KeywordDefinition> {
        self.exact.get(name)
    }

    /// First wildcard pattern, in registration order, matching `name`.
    pub fn wildcard_lookup(&self, name: &str) -> Option<&KeywordDefinition> {
        self.wildcards.iter().find(|def| def.matches(name))
    }

    pub fn resolve(&self, name: &str) -> Option<&KeywordDefinition> {
        self.exact_lookup(name).or_else(|| self.wildcard_lookup(name))
    }

    /// Whether a definition is registered under exactly `name`.
    pub fn has_keyword(&self, name: &str) -> bool {
        self.exact.contains_key(name) || self.has_wildcard_keyword(name)
    }

    /// Whether a wildcard pattern is registered under exactly `name`
    /// (e.g. `"WCONH*"`).
    pub fn has_wildcard_keyword(&self, name: &str) -> bool {
        self.wildcards.iter().any(|def| def.name() == name)
    }

    pub fn can_parse(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.wildcards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered names, ordinary names sorted, then wildcard patterns in
    /// registration order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.exact.keys().map(String::as_str).collect();
        names.sort_unstable();
        names.extend(self.wildcards.iter().map(KeywordDefinition::name));
        names
    }

    // ── Bulk loading ────────────────────────────────────────────────

    /// Register every definition of a JSON array. The set is validated as a
    /// whole before anything is registered.
    pub fn load_json(&mut self, value: &serde_json::Value) -> Result<usize, DeckError> {
        let definitions = from_json_array(value)?
            .into_iter()
            .map(KeywordDefinition::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let count = definitions.len();
        for def in definitions {
            self.register(def);
        }
        tracing::info!(count, "loaded keyword definitions");
        Ok(count)
    }

    /// Register the single definition object stored in `path`.
    pub fn load_file(&mut self, path: &Path) -> Result<(), DeckError> {
        let src =
            std::fs::read_to_string(path).map_err(|e| DeckError::file_system(path, e))?;
        let def = KeywordDefinition::try_from(from_str(&src)?)?;
        self.register(def);
        Ok(())
    }

    /// Load one definition per file under `dir`.
    ///
    /// With `only_all_caps8`, files whose name is not a valid keyword name
    /// are skipped. Files that fail to load are reported in the returned
    /// [`LoadReport`] and do not stop the load; a missing `dir` does.
    pub fn load_directory(
        &mut self,
        dir: &Path,
        recursive: bool,
        only_all_caps8: bool,
    ) -> Result<LoadReport, DeckError> {
        let mut report = LoadReport::default();
        self.load_directory_into(dir, recursive, only_all_caps8, &mut report)?;
        tracing::info!(
            dir = %dir.display(),
            loaded = report.loaded,
            skipped = report.skipped,
            failed = report.failures.len(),
            "loaded keyword definition directory"
        );
        Ok(report)
    }

    fn load_directory_into(
        &mut self,
        dir: &Path,
        recursive: bool,
        only_all_caps8: bool,
        report: &mut LoadReport,
    ) -> Result<(), DeckError> {
        let entries = std::fs::read_dir(dir).map_err(|e| DeckError::file_system(dir, e))?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .collect();
        paths.sort();

        for path in paths {
            if path.is_dir() {
                if recursive {
                    self.load_directory_into(&path, recursive, only_all_caps8, report)?;
                }
                continue;
            }

            let file_name = path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            if only_all_caps8 && !is_valid_name(&file_name) {
                report.skipped += 1;
                continue;
            }

            match self.load_file(&path) {
                Ok(()) => report.loaded += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to load keyword definition");
                    report.failures.push(LoadFailure {
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
