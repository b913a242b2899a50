//! Documents stored by the service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Language code → translated text, at most one entry per language.
pub type Translations = BTreeMap<String, String>;

/// Opaque document id: 32 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Accepts only the canonical form produced by [`DocId::new`].
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == 32
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if well_formed && Uuid::try_parse(raw).is_ok() {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unique piece of source text plus its translations.
///
/// Translations are written once, when the string is first created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedString {
    pub id: DocId,
    pub text: String,
    #[serde(default)]
    pub translations: Translations,
}

impl TranslatedString {
    pub fn new(text: impl Into<String>, translations: Translations) -> Self {
        Self {
            id: DocId::new(),
            text: text.into(),
            translations,
        }
    }
}

/// A named group of strings. Holds its own snapshot of each string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: DocId,
    pub name: String,
    #[serde(default)]
    pub strings: Vec<TranslatedString>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: DocId::new(),
            name: name.into(),
            strings: Vec::new(),
        }
    }

    pub fn find_by_text(&self, text: &str) -> Option<&TranslatedString> {
        self.strings.iter().find(|s| s.text == text)
    }

    /// Remove the string with `id`, returning it if it was present.
    pub fn remove_string(&mut self, id: &DocId) -> Option<TranslatedString> {
        let position = self.strings.iter().position(|s| &s.id == id)?;
        Some(self.strings.remove(position))
    }
}
