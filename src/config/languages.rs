// src/config/languages.rs
// Target language catalog (code -> display name)

use crate::error::{Result, TranslatorError};
use crate::types::Language;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

const BUILTIN_LANGUAGES: &str = include_str!("../../data/languages.json");

/// Language selected when neither the config nor the CLI names one
pub const DEFAULT_LANGUAGE_CODE: &str = "en";

/// Languages offered as translation targets, ordered by code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageCatalog {
    languages: BTreeMap<String, String>,
}

impl LanguageCatalog {
    /// Built-in catalog
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_LANGUAGES)
    }

    /// Catalog from a JSON file, or the built-in one when `path` is `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                let catalog = Self::from_json(&contents)?;
                debug!(path = %path.display(), count = catalog.len(), "Loaded language catalog");
                Ok(catalog)
            }
            None => Self::builtin(),
        }
    }

    /// Parse a `{"code": "Display name"}` object
    pub fn from_json(json: &str) -> Result<Self> {
        let languages: BTreeMap<String, String> = serde_json::from_str(json)?;
        if languages.is_empty() {
            return Err(TranslatorError::Config("language catalog is empty".into()));
        }
        Ok(Self { languages })
    }

    pub fn by_code(&self, code: &str) -> Option<Language> {
        self.languages
            .get_key_value(code)
            .map(|(code, name)| Language::new(code.as_str(), name.as_str()))
    }

    /// Case-insensitive lookup by display name
    pub fn by_name(&self, name: &str) -> Option<Language> {
        self.languages
            .iter()
            .find(|(_, display)| display.eq_ignore_ascii_case(name))
            .map(|(code, display)| Language::new(code.as_str(), display.as_str()))
    }

    /// Lookup by code, then by display name
    pub fn resolve(&self, code_or_name: &str) -> Option<Language> {
        let query = code_or_name.trim();
        self.by_code(query).or_else(|| self.by_name(query))
    }

    pub fn iter(&self) -> impl Iterator<Item = Language> + '_ {
        self.languages
            .iter()
            .map(|(code, name)| Language::new(code.as_str(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}
