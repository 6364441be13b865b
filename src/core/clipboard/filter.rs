use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::FilterSettings;

static UI_NOISE_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Words that show up when the user selects buttons or menu items.
const COMMON_UI_WORDS: &[&str] = &[
    "quit", "ok", "okay", "cancel", "yes", "no", "close", "exit", "save", "open",
    "apply", "back", "next", "done", "retry", "help", "file", "edit", "view",
    "settings", "copy", "paste", "delete", "submit",
];

fn get_ui_noise_patterns() -> &'static Vec<Regex> {
    UI_NOISE_PATTERNS.get_or_init(|| {
        vec![
            // Dialog status lines ("Error: ...", "[SUCCESS]", "Warning!")
            Regex::new(r"(?i)^\W*(error|success|successful|warning|failed|failure|info|loading)\b")
                .expect("Invalid status word regex"),
            // Decorative separator runs (-----, =====, ****)
            Regex::new(r"(?:-{3,}|={3,}|_{3,}|\*{3,}|~{3,}|#{3,}|\.{4,})")
                .expect("Invalid separator regex"),
        ]
    })
}

/// Why a candidate was not translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    TooShort,
    TooLong,
    NoAlphabetic,
    AppFocused,
    UiNoise,
    CommonUiWord,
    SameAsPrevious,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::Empty => "empty selection",
            Rejection::TooShort => "selection too short",
            Rejection::TooLong => "selection too long",
            Rejection::NoAlphabetic => "no alphabetic characters",
            Rejection::AppFocused => "own window has focus",
            Rejection::UiNoise => "looks like dialog text",
            Rejection::CommonUiWord => "common UI word",
            Rejection::SameAsPrevious => "same as previous selection",
        };
        f.write_str(reason)
    }
}

/// Per-call inputs that are not part of the text itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterContext<'a> {
    pub app_has_focus: bool,
    pub previous: Option<&'a str>,
}

/// Stateless eligibility check run on every poll tick.
#[derive(Debug, Clone)]
pub struct SelectionFilter {
    min_chars: usize,
    max_chars: usize,
}

impl Default for SelectionFilter {
    fn default() -> Self {
        Self::new(&FilterSettings::default())
    }
}

impl SelectionFilter {
    pub fn new(settings: &FilterSettings) -> Self {
        Self {
            min_chars: settings.min_chars,
            max_chars: settings.max_chars,
        }
    }

    pub fn is_eligible(&self, raw: &str, ctx: FilterContext<'_>) -> bool {
        self.check(raw, ctx).is_ok()
    }

    pub fn check(&self, raw: &str, ctx: FilterContext<'_>) -> Result<(), Rejection> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(Rejection::Empty);
        }
        if ctx.app_has_focus {
            return Err(Rejection::AppFocused);
        }

        let length = text.graphemes(true).count();
        if length > self.max_chars {
            return Err(Rejection::TooLong);
        }
        if length < self.min_chars {
            return Err(Rejection::TooShort);
        }
        if !text.chars().any(char::is_alphabetic) {
            return Err(Rejection::NoAlphabetic);
        }
        if get_ui_noise_patterns().iter().any(|p| p.is_match(text)) {
            return Err(Rejection::UiNoise);
        }

        let normalized = text.to_lowercase();
        let bare = normalized.trim_end_matches(|c: char| c.is_ascii_punctuation());
        if COMMON_UI_WORDS.contains(&bare) {
            return Err(Rejection::CommonUiWord);
        }
        if ctx.previous.is_some_and(|prev| prev.trim() == text) {
            return Err(Rejection::SameAsPrevious);
        }
        Ok(())
    }

    /// Bounds for typed input. Returned errors are shown to the user.
    pub fn validate_manual<'t>(&self, raw: &'t str) -> AppResult<&'t str> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Nothing to translate".to_string()));
        }
        let length = text.graphemes(true).count();
        if length > self.max_chars {
            return Err(AppError::Validation(format!(
                "Text is {} characters long; the limit is {}",
                length, self.max_chars
            )));
        }
        Ok(text)
    }
}
