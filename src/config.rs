use anyhow::{bail, Context, Result};
use std::time::Duration;

use crate::i18n::{Language, LanguageRegistry};

pub const DEFAULT_TRANSLATE_URL: &str = "https://www.googleapis.com/language/translate/v2";

#[derive(Debug, Clone)]
pub struct Config {
    // Translation provider
    pub translate_api_key: String,
    pub translate_api_url: String,
    pub source_language: String,
    pub target_languages: Vec<Language>,

    // Fan-out limits
    pub translation_timeout_secs: u64,
    pub fanout_deadline_secs: u64,

    // Storage
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    // Server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let target_languages = match std::env::var("TARGET_LANGUAGES") {
            Ok(list) if !list.trim().is_empty() => parse_language_list(&list)?,
            _ => LanguageRegistry::get().targets(),
        };

        Ok(Self {
            // Translation provider
            translate_api_key: std::env::var("GTRANSLATE_KEY")
                .context("GTRANSLATE_KEY not set")?,
            translate_api_url: std::env::var("GTRANSLATE_URL")
                .unwrap_or_else(|_| DEFAULT_TRANSLATE_URL.to_string()),
            source_language: std::env::var("SOURCE_LANGUAGE")
                .unwrap_or_else(|_| Language::canonical().code().to_string()),
            target_languages,

            // Fan-out limits
            translation_timeout_secs: std::env::var("TRANSLATION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            fanout_deadline_secs: std::env::var("FANOUT_DEADLINE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),

            // Storage
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),

            // Server
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        })
    }

    pub fn translation_timeout(&self) -> Duration {
        Duration::from_secs(self.translation_timeout_secs)
    }

    pub fn fanout_deadline(&self) -> Duration {
        Duration::from_secs(self.fanout_deadline_secs)
    }
}

/// Parse a comma-separated list of target language codes, rejecting unknown
/// codes and the canonical source language.
fn parse_language_list(list: &str) -> Result<Vec<Language>> {
    let mut languages = Vec::new();
    for code in list.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let language = Language::from_code(code)
            .with_context(|| format!("Invalid entry in TARGET_LANGUAGES: '{}'", code))?;
        if language.is_canonical() {
            bail!("TARGET_LANGUAGES must not contain the source language '{}'", code);
        }
        if !languages.contains(&language) {
            languages.push(language);
        }
    }
    if languages.is_empty() {
        bail!("TARGET_LANGUAGES did not contain any language codes");
    }
    Ok(languages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "GTRANSLATE_KEY",
        "GTRANSLATE_URL",
        "SOURCE_LANGUAGE",
        "TARGET_LANGUAGES",
        "TRANSLATION_TIMEOUT_SECS",
        "FANOUT_DEADLINE_SECS",
        "DATABASE_URL",
        "DATABASE_MAX_CONNECTIONS",
        "PORT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_requires_api_key() {
        clear_env();
        let result = Config::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("GTRANSLATE_KEY"));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        std::env::set_var("GTRANSLATE_KEY", "test-key");

        let config = Config::from_env().expect("Should load config");

        assert_eq!(config.translate_api_key, "test-key");
        assert_eq!(config.translate_api_url, DEFAULT_TRANSLATE_URL);
        assert_eq!(config.source_language, "en");
        assert_eq!(config.target_languages.len(), 30);
        assert_eq!(config.translation_timeout(), Duration::from_secs(10));
        assert_eq!(config.fanout_deadline(), Duration::from_secs(30));
        assert!(config.database_url.is_none());
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.port, 8080);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("GTRANSLATE_KEY", "test-key");
        std::env::set_var("TARGET_LANGUAGES", "fr, de,fr");
        std::env::set_var("TRANSLATION_TIMEOUT_SECS", "3");
        std::env::set_var("DATABASE_URL", "postgres://localhost/transio");
        std::env::set_var("PORT", "9000");

        let config = Config::from_env().expect("Should load config");

        let codes: Vec<_> = config.target_languages.iter().map(|l| l.code()).collect();
        assert_eq!(codes, vec!["fr", "de"]);
        assert_eq!(config.translation_timeout_secs, 3);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/transio")
        );
        assert_eq!(config.port, 9000);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_number_falls_back_to_default() {
        clear_env();
        std::env::set_var("GTRANSLATE_KEY", "test-key");
        std::env::set_var("PORT", "not-a-port");

        let config = Config::from_env().expect("Should load config");
        assert_eq!(config.port, 8080);

        clear_env();
    }

    #[test]
    fn test_parse_language_list_rejects_unknown_code() {
        let result = parse_language_list("fr,xx");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("xx"));
    }

    #[test]
    fn test_parse_language_list_rejects_source_language() {
        assert!(parse_language_list("en,fr").is_err());
    }

    #[test]
    fn test_parse_language_list_rejects_empty() {
        assert!(parse_language_list(" , ").is_err());
    }
}
