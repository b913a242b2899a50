//! Supported languages.
//!
//! - `registry`: single source of truth for the source language and every
//!   translation target, with English and native names
//! - `language`: validated `Language` handle backed by the registry
//!
//! # Example
//!
//! ```rust,ignore
//! use translation_io::i18n::{Language, LanguageRegistry};
//!
//! let source = Language::canonical();
//! let french = Language::from_code("fr")?;
//! let targets = LanguageRegistry::get().targets();
//! ```

mod language;
mod registry;

pub use language::Language;
pub use registry::{LanguageConfig, LanguageRegistry};
