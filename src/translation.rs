use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// A translation provider: one source text into one target language.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}

/// Google Translate v2 response: `{"data": {"translations": [{"translatedText": ...}]}}`
#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<TranslationEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationEntry {
    translated_text: String,
}

/// Client for the Google Translate v2 REST endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl GoogleTranslator {
    /// Build a translator whose HTTP client enforces `timeout` on every call.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build translation HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.translate_api_url,
            &config.translate_api_key,
            config.translation_timeout(),
        )
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", text),
                ("source", source),
                ("target", target),
                ("format", "text"),
                ("prettyprint", "false"),
            ])
            .send()
            .await
            .context("Failed to send request to translation API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            anyhow::bail!("Translation API error ({}): {}", status, body);
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .context("Failed to parse translation API response")?;

        let translated = parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .context("Translation API response contained no translations")?;

        if translated.trim().is_empty() {
            anyhow::bail!("Translation API returned an empty translation");
        }

        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn create_translate_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "data": {
                "translations": [
                    { "translatedText": text }
                ]
            }
        })
    }

    fn create_translator(server: &MockServer) -> GoogleTranslator {
        GoogleTranslator::new(
            format!("{}/language/translate/v2", server.uri()),
            "test-key",
            Duration::from_secs(2),
        )
        .expect("Should build translator")
    }

    // ==================== Response Parsing Tests ====================

    #[test]
    fn test_response_deserialization() {
        let json = r#"{"data":{"translations":[{"translatedText":"Bonjour"}]}}"#;
        let parsed: TranslateResponse = serde_json::from_str(json).expect("Should deserialize");
        assert_eq!(parsed.data.translations[0].translated_text, "Bonjour");
    }

    #[test]
    fn test_response_without_translations_field() {
        let json = r#"{"data":{}}"#;
        let parsed: TranslateResponse = serde_json::from_str(json).expect("Should deserialize");
        assert!(parsed.data.translations.is_empty());
    }

    // ==================== Integration Tests with Wiremock ====================

    #[tokio::test]
    async fn test_translate_success_sends_expected_query() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/language/translate/v2"))
            .and(query_param("key", "test-key"))
            .and(query_param("q", "Hello World"))
            .and(query_param("source", "en"))
            .and(query_param("target", "fr"))
            .and(query_param("format", "text"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(create_translate_response("Bonjour le monde")),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let translator = create_translator(&mock_server);
        let result = translator
            .translate("Hello World", "en", "fr")
            .await
            .expect("Should succeed");

        assert_eq!(result, "Bonjour le monde");
    }

    #[tokio::test]
    async fn test_translate_api_error_includes_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Daily Limit Exceeded"))
            .mount(&mock_server)
            .await;

        let translator = create_translator(&mock_server);
        let result = translator.translate("Hello", "en", "de").await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("403"));
    }

    #[tokio::test]
    async fn test_translate_malformed_json() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let translator = create_translator(&mock_server);
        let result = translator.translate("Hello", "en", "de").await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("parse"));
    }

    #[tokio::test]
    async fn test_translate_no_translations() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "data": { "translations": [] } })),
            )
            .mount(&mock_server)
            .await;

        let translator = create_translator(&mock_server);
        let result = translator.translate("Hello", "en", "de").await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("no translations"));
    }

    #[tokio::test]
    async fn test_translate_empty_text_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(create_translate_response("  ")))
            .mount(&mock_server)
            .await;

        let translator = create_translator(&mock_server);
        let result = translator.translate("Hello", "en", "de").await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[tokio::test]
    async fn test_translate_client_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(create_translate_response("Tard"))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let translator = GoogleTranslator::new(
            format!("{}/language/translate/v2", mock_server.uri()),
            "test-key",
            Duration::from_millis(200),
        )
        .unwrap();

        let start = std::time::Instant::now();
        let result = translator.translate("Late", "en", "fr").await;

        assert!(result.is_err());
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_translate_unreachable_host() {
        let translator = GoogleTranslator::new(
            "http://127.0.0.1:9/language/translate/v2",
            "test-key",
            Duration::from_secs(1),
        )
        .unwrap();

        let result = translator.translate("Hello", "en", "fr").await;
        assert!(result.is_err());
    }
}
