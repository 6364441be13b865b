//! Translator collaborator
//!
//! A translation is a single best-effort call: text in, translated text or a
//! reason-coded failure out. Providers sometimes report errors in-band, inside
//! an otherwise successful response; those are failures too and must never
//! reach history.

pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::TranslationSettings;
use crate::shared::types::preview;
pub use types::{TranslateError, TranslateRequest, TranslatorResult};

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, request: &TranslateRequest) -> TranslatorResult<String>;
}

/// Provider error text returned in place of a translation.
pub fn is_error_sentinel(text: &str) -> bool {
    text.trim_start().starts_with("[Error") || text.contains("text length")
}

/// Run one translation with a deadline and reject empty or sentinel results.
pub async fn translate_with_timeout(
    translator: &dyn Translator,
    request: &TranslateRequest,
    timeout: Duration,
) -> TranslatorResult<String> {
    let translated = match tokio::time::timeout(timeout, translator.translate(request)).await {
        Ok(result) => result?,
        Err(_) => return Err(TranslateError::Timeout(timeout)),
    };

    let translated = translated.trim();
    if translated.is_empty() {
        return Err(TranslateError::EmptyResult);
    }
    if is_error_sentinel(translated) {
        return Err(TranslateError::ProviderSentinel(preview(translated)));
    }
    Ok(translated.to_string())
}

/// Client for the public `translate_a/single` endpoint (no API key).
pub struct GoogleTranslator {
    http: Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(endpoint: impl Into<String>) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("Mozilla/5.0")
            .build()
            .map_err(|e| AppError::Network(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_settings(settings: &TranslationSettings) -> AppResult<Self> {
        Self::new(settings.endpoint.clone())
    }

    fn request_url(&self, request: &TranslateRequest) -> String {
        format!(
            "{}?client=gtx&sl={}&tl={}&dt=t&q={}",
            self.endpoint,
            request.source_code(),
            request.target_code(),
            urlencoding::encode(&request.text)
        )
    }
}

/// Concatenate the translated chunks in element `[0]` of the response.
pub fn parse_google_response(json: &serde_json::Value) -> TranslatorResult<String> {
    let chunks = json
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| TranslateError::Parse("missing translation array".to_string()))?;

    let translated: String = chunks
        .iter()
        .filter_map(|chunk| chunk.get(0).and_then(|v| v.as_str()))
        .collect();

    if translated.trim().is_empty() {
        return Err(TranslateError::EmptyResult);
    }
    Ok(translated)
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, request: &TranslateRequest) -> TranslatorResult<String> {
        let response = self
            .http
            .get(self.request_url(request))
            .send()
            .await
            .map_err(|e| {
                log::warn!("[Translator] Request failed: {}", e);
                TranslateError::Network(e.to_string())
            })?;

        if !response.status().is_success() {
            log::warn!("[Translator] API returned error: {}", response.status());
            return Err(TranslateError::Http(response.status().as_u16()));
        }

        let json = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;
        parse_google_response(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixed(TranslatorResult<String>);

    #[async_trait]
    impl Translator for Fixed {
        async fn translate(&self, _request: &TranslateRequest) -> TranslatorResult<String> {
            self.0.clone()
        }
    }

    struct Hangs;

    #[async_trait]
    impl Translator for Hangs {
        async fn translate(&self, _request: &TranslateRequest) -> TranslatorResult<String> {
            std::future::pending::<TranslatorResult<String>>().await
        }
    }

    fn request() -> TranslateRequest {
        TranslateRequest::new("Hello", "auto", "ta").unwrap()
    }

    #[test]
    fn test_sentinel_detection() {
        assert!(is_error_sentinel("[Error] quota exceeded"));
        assert!(is_error_sentinel("  [Error: 429]"));
        assert!(is_error_sentinel("Please keep text length under 5000"));
        assert!(!is_error_sentinel("வணக்கம்"));
    }

    #[test]
    fn test_parse_google_response() {
        let body = json!([[["வணக்கம் ", "Hello ", null], ["உலகம்", "world", null]], null, "en"]);
        assert_eq!(parse_google_response(&body).unwrap(), "வணக்கம் உலகம்");

        assert_eq!(parse_google_response(&json!([[]])), Err(TranslateError::EmptyResult));
        assert!(matches!(
            parse_google_response(&json!({"error": "bad"})),
            Err(TranslateError::Parse(_))
        ));
    }

    #[test]
    fn test_request_url_encodes_text() {
        let translator = GoogleTranslator::new("https://example.test/translate").unwrap();
        let request = TranslateRequest::new("a&b c", "auto", "ta").unwrap();
        assert_eq!(
            translator.request_url(&request),
            "https://example.test/translate?client=gtx&sl=auto&tl=ta&dt=t&q=a%26b%20c"
        );
    }

    #[tokio::test]
    async fn test_output_validation() {
        let ok = Fixed(Ok("  வணக்கம் ".to_string()));
        assert_eq!(
            translate_with_timeout(&ok, &request(), Duration::from_secs(1)).await,
            Ok("வணக்கம்".to_string())
        );

        let empty = Fixed(Ok("   ".to_string()));
        assert_eq!(
            translate_with_timeout(&empty, &request(), Duration::from_secs(1)).await,
            Err(TranslateError::EmptyResult)
        );

        let sentinel = Fixed(Ok("[Error] too many requests".to_string()));
        assert!(matches!(
            translate_with_timeout(&sentinel, &request(), Duration::from_secs(1)).await,
            Err(TranslateError::ProviderSentinel(_))
        ));

        let failing = Fixed(Err(TranslateError::Http(503)));
        assert_eq!(
            translate_with_timeout(&failing, &request(), Duration::from_secs(1)).await,
            Err(TranslateError::Http(503))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_failure() {
        let result = translate_with_timeout(&Hangs, &request(), Duration::from_secs(10)).await;
        assert_eq!(result, Err(TranslateError::Timeout(Duration::from_secs(10))));
    }
}
