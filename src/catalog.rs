//! Language catalog: the set of language codes the bot accepts.
//!
//! Loaded once at startup from a bundled JSON file shaped like the
//! provider's `languages` API response (a top-level `translation` object
//! mapping code to display metadata). The catalog is immutable for the
//! process lifetime; a missing or malformed file is a fatal startup error.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Map;
use std::path::Path;

/// Display metadata for one supported language.
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageInfo {
    pub name: String,
    #[serde(rename = "nativeName")]
    pub native_name: String,
    #[serde(default = "default_dir")]
    pub dir: String,
}

fn default_dir() -> String {
    "ltr".to_string()
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    // serde_json's preserve_order feature keeps Map in file order, which
    // is the order /languages reports codes in.
    translation: Map<String, serde_json::Value>,
}

/// Immutable catalog of supported language codes, in file order.
#[derive(Debug)]
pub struct LanguageCatalog {
    languages: Vec<(String, LanguageInfo)>,
}

impl LanguageCatalog {
    /// Load the catalog from a JSON file. Fatal on a missing file, invalid
    /// JSON, or a document without the `translation` mapping.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read language catalog at {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("Invalid language catalog at {}", path.display()))
    }

    /// Parse catalog JSON. Split out from `load` so tests can feed strings.
    pub fn from_json(raw: &str) -> Result<Self> {
        let file: CatalogFile =
            serde_json::from_str(raw).context("Catalog is not valid JSON with a 'translation' map")?;

        let mut languages = Vec::with_capacity(file.translation.len());
        for (code, value) in file.translation {
            let info: LanguageInfo = serde_json::from_value(value)
                .with_context(|| format!("Invalid metadata for language '{}'", code))?;
            languages.push((code, info));
        }

        Ok(Self { languages })
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.languages.iter().any(|(c, _)| c == code)
    }

    /// All supported codes, in the order they appear in the data file.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(|(c, _)| c.as_str())
    }

    pub fn get(&self, code: &str) -> Option<&LanguageInfo> {
        self.languages
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, info)| info)
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}
