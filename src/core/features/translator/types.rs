use std::time::Duration;

use isolang::Language;
use thiserror::Error;

use crate::shared::settings::TranslationSettings;

fn lang_code(lang: &Language) -> String {
    lang.to_639_1()
        .map(|c| c.to_string())
        .unwrap_or_else(|| lang.to_639_3().to_string())
}

fn parse_lang(code: &str) -> Option<Language> {
    Language::from_639_1(code).or_else(|| Language::from_639_3(code))
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranslateRequest {
    pub text: String,
    /// `None` lets the provider detect the source language.
    pub source: Option<Language>,
    pub target: Language,
}

impl TranslateRequest {
    pub fn new(text: impl Into<String>, source: &str, target: &str) -> Result<Self, TranslateError> {
        let target = parse_lang(target)
            .ok_or_else(|| TranslateError::InvalidLanguage(target.to_string()))?;
        let source = if source.eq_ignore_ascii_case("auto") {
            None
        } else {
            Some(parse_lang(source).ok_or_else(|| TranslateError::InvalidLanguage(source.to_string()))?)
        };
        Ok(Self {
            text: text.into(),
            source,
            target,
        })
    }

    pub fn from_settings(text: impl Into<String>, settings: &TranslationSettings) -> Result<Self, TranslateError> {
        Self::new(text, &settings.source_lang, &settings.target_lang)
    }

    pub fn source_code(&self) -> String {
        self.source
            .as_ref()
            .map(lang_code)
            .unwrap_or_else(|| "auto".to_string())
    }

    pub fn target_code(&self) -> String {
        lang_code(&self.target)
    }
}

/// Reason a translation attempt produced nothing worth storing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslateError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("provider returned HTTP {0}")]
    Http(u16),

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("provider returned an empty translation")]
    EmptyResult,

    #[error("provider reported an error: {0}")]
    ProviderSentinel(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("unsupported language code '{0}'")]
    InvalidLanguage(String),
}

pub type TranslatorResult<T> = Result<T, TranslateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_codes() {
        let request = TranslateRequest::new("Hello", "auto", "ta").unwrap();
        assert_eq!(request.source, None);
        assert_eq!(request.source_code(), "auto");
        assert_eq!(request.target_code(), "ta");

        let request = TranslateRequest::new("Hello", "en", "tam").unwrap();
        assert_eq!(request.source_code(), "en");
        assert_eq!(request.target_code(), "ta");
    }

    #[test]
    fn test_rejects_unknown_language() {
        assert_eq!(
            TranslateRequest::new("Hello", "auto", "xx"),
            Err(TranslateError::InvalidLanguage("xx".to_string()))
        );
    }
}
