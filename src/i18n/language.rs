//! Language type: a code validated against the registry.

use crate::i18n::{LanguageConfig, LanguageRegistry};
use anyhow::{bail, Result};

/// A validated language.
///
/// Only codes present and enabled in the registry can be turned into a
/// `Language`, so downstream code never has to re-check them.
#[derive(Debug, Clone, Copy)]
pub struct Language {
    config: &'static LanguageConfig,
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        self.config.code == other.config.code
    }
}

impl Eq for Language {}

impl std::hash::Hash for Language {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.config.code.hash(state);
    }
}

impl Language {
    /// Create a Language from a language code string.
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is valid and the language is enabled
    /// * `Err` if the code is not found or the language is disabled
    pub fn from_code(code: &str) -> Result<Language> {
        let registry = LanguageRegistry::get();

        match registry.get_by_code(code) {
            Some(config) if config.enabled => Ok(Language::from_config(config)),
            Some(_) => bail!("Language '{}' is not enabled", code),
            None => bail!("Unknown language code: '{}'", code),
        }
    }

    pub(super) fn from_config(config: &'static LanguageConfig) -> Language {
        Language { config }
    }

    /// The source language every string is translated from.
    pub fn canonical() -> Language {
        Language::from_config(LanguageRegistry::get().canonical())
    }

    pub fn code(&self) -> &'static str {
        self.config.code
    }

    /// The registry entry for this language.
    pub fn config(&self) -> &'static LanguageConfig {
        self.config
    }

    pub fn name(&self) -> &'static str {
        self.config.name
    }

    pub fn native_name(&self) -> &'static str {
        self.config.native_name
    }

    pub fn is_canonical(&self) -> bool {
        self.config.is_canonical
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.config.code)
    }
}
