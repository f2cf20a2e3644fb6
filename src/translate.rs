//! Header translation lookup for the contract report.
//!
//! `translations.json` maps base column names (language suffix stripped) to
//! display headers per language. Anything without an entry falls back to the
//! base name, so a sparse dictionary degrades to readable raw headers.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::pipeline::language::strip_language_suffix;

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Base column name → language → display header.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeaderTranslations {
    #[serde(default)]
    column_names: HashMap<String, HashMap<String, String>>,
}

impl HeaderTranslations {
    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<HeaderTranslations, TranslationError> {
        let raw = std::fs::read_to_string(path).map_err(|source| TranslationError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| TranslationError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Display header for one projected column. The active language's suffix
    /// is stripped before lookup; a miss falls back to the base name.
    pub fn header(&self, column: &str, language: &str) -> String {
        let base = strip_language_suffix(column, language);
        self.column_names
            .get(base)
            .and_then(|by_lang| by_lang.get(language))
            .cloned()
            .unwrap_or_else(|| base.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HeaderTranslations {
        serde_json::from_str(
            r#"{
                "column_names": {
                    "AttributeDescription": {"DE": "Beschreibung", "FR": "Description"},
                    "Pset": {"DE": "Pset"}
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn suffixed_column_translates_via_base_name() {
        let t = sample();
        assert_eq!(t.header("AttributeDescriptionDE", "DE"), "Beschreibung");
        assert_eq!(t.header("AttributeDescriptionFR", "FR"), "Description");
    }

    #[test]
    fn miss_falls_back_to_base_name() {
        let t = sample();
        assert_eq!(t.header("ElementNameDE", "DE"), "ElementName");
        assert_eq!(t.header("Sort", "DE"), "Sort");
    }

    #[test]
    fn empty_dictionary_passes_headers_through() {
        let t = HeaderTranslations::default();
        assert_eq!(t.header("AttributeDescriptionDE", "DE"), "AttributeDescription");
    }
}
