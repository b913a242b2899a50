//! Concurrent translation of one text into every target language.
//!
//! One task is spawned per target language. Each task owns its inputs and
//! reports exactly one [`LanguageOutcome`] through its join handle; nothing
//! is shared between tasks. The aggregator waits for all of them (or for the
//! overall deadline) and folds the outcomes into a [`Translations`] map on
//! its own, so the map never needs a lock.
//!
//! Failures are per language: a provider error, an empty result or a timeout
//! drops that language and nothing else. A fan-out in which every language
//! fails still yields an (empty) map.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::i18n::Language;
use crate::models::Translations;
use crate::translation::Translator;

/// What one worker reports for its language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageOutcome {
    pub language: String,
    pub translation: Option<String>,
}

pub struct FanOut {
    translator: Arc<dyn Translator>,
    source_language: String,
    targets: Vec<String>,
    call_timeout: Duration,
    deadline: Duration,
}

impl FanOut {
    pub fn new(
        translator: Arc<dyn Translator>,
        source_language: impl Into<String>,
        targets: Vec<String>,
    ) -> Self {
        Self {
            translator,
            source_language: source_language.into(),
            targets,
            call_timeout: Duration::from_secs(10),
            deadline: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &Config, translator: Arc<dyn Translator>) -> Self {
        let targets = config
            .target_languages
            .iter()
            .map(Language::code)
            .map(str::to_string)
            .collect();

        Self::new(translator, &config.source_language, targets)
            .with_call_timeout(config.translation_timeout())
            .with_deadline(config.fanout_deadline())
    }

    /// Bound on a single provider call.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Bound on the whole join. Workers still running when it passes are aborted.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Translate `text` into every target language.
    pub async fn translate_all(&self, text: &str) -> Translations {
        let text: Arc<str> = Arc::from(text);
        let mut workers = JoinSet::new();

        for target in &self.targets {
            let translator = Arc::clone(&self.translator);
            let text = Arc::clone(&text);
            let source = self.source_language.clone();
            let target = target.clone();
            let call_timeout = self.call_timeout;

            workers.spawn(async move {
                let result = timeout(call_timeout, translator.translate(&text, &source, &target)).await;
                let translation = match result {
                    Ok(Ok(translated)) if !translated.trim().is_empty() => Some(translated),
                    Ok(Ok(_)) => {
                        warn!(language = %target, "Translation came back empty");
                        None
                    }
                    Ok(Err(e)) => {
                        warn!(language = %target, "Translation failed: {:#}", e);
                        None
                    }
                    Err(_) => {
                        warn!(language = %target, ?call_timeout, "Translation timed out");
                        None
                    }
                };
                LanguageOutcome {
                    language: target,
                    translation,
                }
            });
        }

        let dispatched = workers.len();
        debug!(dispatched, "Translation fan-out dispatched");

        let outcomes = collect_outcomes(&mut workers, dispatched, Instant::now() + self.deadline).await;
        let translations = aggregate(outcomes);

        info!(
            dispatched,
            translated = translations.len(),
            failed = dispatched - translations.len(),
            "Translation fan-out complete"
        );
        translations
    }
}

/// Wait until exactly `expected` workers have reported or `deadline` passes.
///
/// A worker that panicked counts as reported with no outcome. On deadline the
/// remaining workers are aborted so none outlives the caller.
async fn collect_outcomes(
    workers: &mut JoinSet<LanguageOutcome>,
    expected: usize,
    deadline: Instant,
) -> Vec<LanguageOutcome> {
    let mut outcomes = Vec::with_capacity(expected);
    let mut reported = 0;

    while reported < expected {
        match timeout_at(deadline, workers.join_next()).await {
            Ok(Some(Ok(outcome))) => {
                reported += 1;
                outcomes.push(outcome);
            }
            Ok(Some(Err(e))) => {
                reported += 1;
                warn!("Translation worker did not finish: {}", e);
            }
            Ok(None) => break,
            Err(_) => {
                warn!(
                    outstanding = expected - reported,
                    "Translation fan-out deadline reached, aborting remaining workers"
                );
                workers.abort_all();
                break;
            }
        }
    }

    outcomes
}

/// Keep one entry per language that produced non-empty text.
fn aggregate(outcomes: Vec<LanguageOutcome>) -> Translations {
    outcomes
        .into_iter()
        .filter_map(|outcome| match outcome.translation {
            Some(text) if !text.trim().is_empty() => Some((outcome.language, text)),
            _ => None,
        })
        .collect()
}
