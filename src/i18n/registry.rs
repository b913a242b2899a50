//! Language registry: single source of truth for supported languages.
//!
//! The registry is built once, on first access, behind a `OnceLock` and is
//! immutable afterwards. It holds the canonical source language plus every
//! target language a new string is translated into.

use std::sync::OnceLock;

use super::Language;

/// Configuration for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Provider language code (e.g., "fr", "zh-CN")
    pub code: &'static str,

    /// English name of the language (e.g., "French")
    pub name: &'static str,

    /// Native name of the language (e.g., "Français")
    pub native_name: &'static str,

    /// Whether this is the canonical/source language (exactly one is)
    pub is_canonical: bool,

    /// Whether this language is enabled for use
    pub enabled: bool,
}

/// Global language registry singleton.
///
/// The canonical language is held apart from the targets, so there is
/// always exactly one.
pub struct LanguageRegistry {
    canonical: LanguageConfig,
    targets: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            canonical: LanguageConfig {
                code: "en",
                name: "English",
                native_name: "English",
                is_canonical: true,
                enabled: true,
            },
            targets: target_languages(),
        })
    }

    /// Get a language configuration by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        std::iter::once(&self.canonical)
            .chain(&self.targets)
            .find(|lang| lang.code == code)
    }

    /// Every enabled, non-canonical language: the default fan-out targets.
    pub fn targets(&'static self) -> Vec<Language> {
        self.targets
            .iter()
            .filter(|lang| lang.enabled)
            .map(Language::from_config)
            .collect()
    }

    pub fn canonical(&self) -> &LanguageConfig {
        &self.canonical
    }
}

const fn target(code: &'static str, name: &'static str, native_name: &'static str) -> LanguageConfig {
    LanguageConfig {
        code,
        name,
        native_name,
        is_canonical: false,
        enabled: true,
    }
}

/// The thirty provider targets.
fn target_languages() -> Vec<LanguageConfig> {
    vec![
        target("zh-CN", "Chinese Simplified", "简体中文"),
        target("es", "Spanish", "Español"),
        target("ja", "Japanese", "日本語"),
        target("de", "German", "Deutsch"),
        target("fr", "French", "Français"),
        target("pt", "Portuguese", "Português"),
        target("ru", "Russian", "Русский"),
        target("ar", "Arabic", "العربية"),
        target("it", "Italian", "Italiano"),
        target("ko", "Korean", "한국어"),
        target("zh-TW", "Chinese Traditional", "繁體中文"),
        target("nl", "Dutch", "Nederlands"),
        target("tr", "Turkish", "Türkçe"),
        target("pl", "Polish", "Polski"),
        target("id", "Indonesian", "Bahasa Indonesia"),
        target("ms", "Malay", "Bahasa Melayu"),
        target("th", "Thai", "ไทย"),
        target("sv", "Swedish", "Svenska"),
        target("no", "Norwegian", "Norsk"),
        target("el", "Greek", "Ελληνικά"),
        target("cs", "Czech", "Čeština"),
        target("iw", "Hebrew", "עברית"),
        target("da", "Danish", "Dansk"),
        target("ro", "Romanian", "Română"),
        target("vi", "Vietnamese", "Tiếng Việt"),
        target("fi", "Finnish", "Suomi"),
        target("uk", "Ukrainian", "Українська"),
        target("hi", "Hindi", "हिन्दी"),
        target("hu", "Hungarian", "Magyar"),
        target("sk", "Slovak", "Slovenčina"),
    ]
}
