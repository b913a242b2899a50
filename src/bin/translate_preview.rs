//! Translate one text into every configured language and print the result,
//! without touching any store.
//!
//! Usage:
//!   cargo run --bin translate-preview -- Hello world
//!
//! Required environment variables:
//! - GTRANSLATE_KEY
//!
//! Optional:
//! - GTRANSLATE_URL, SOURCE_LANGUAGE, TARGET_LANGUAGES
//! - TRANSLATION_TIMEOUT_SECS (defaults to 10)
//! - FANOUT_DEADLINE_SECS (defaults to 30)

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::info;
use translation_io::config::Config;
use translation_io::fanout::FanOut;
use translation_io::i18n::Language;
use translation_io::translation::GoogleTranslator;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_io=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let text = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if text.trim().is_empty() {
        bail!("Usage: translate-preview <text>");
    }

    let config = Config::from_env()?;
    let translator = Arc::new(GoogleTranslator::from_config(&config)?);
    let fanout = FanOut::from_config(&config, translator);

    info!("Translating into {} languages...", fanout.targets().len());
    let translations = fanout.translate_all(&text).await;

    let missing: Vec<String> = fanout
        .targets()
        .iter()
        .filter(|code| !translations.contains_key(code.as_str()))
        .map(|code| match Language::from_code(code) {
            Ok(lang) => format!("{} ({})", lang.name(), lang.native_name()),
            Err(_) => code.clone(),
        })
        .collect();
    if !missing.is_empty() {
        info!("No translation for: {}", missing.join(", "));
    }

    let json = serde_json::to_string_pretty(&translations)
        .context("Failed to serialize translations")?;
    println!("{}", json);
    Ok(())
}
