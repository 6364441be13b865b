use serde::{Deserialize, Serialize};

/// One persisted translation: the selected English text and its Tamil rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub original: String,
    pub translated: String,
}

impl TranslationRecord {
    pub fn new(original: impl Into<String>, translated: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            translated: translated.into(),
        }
    }
}

/// Whether manually typed translations go through duplicate suppression
/// before being written to history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ManualSavePolicy {
    /// Every successful manual translation is appended.
    Always,
    /// Skip the append when the recent history already holds the same original.
    #[default]
    SkipDuplicates,
}

/// Result of a manual translation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManualTranslation {
    pub record: TranslationRecord,
    /// Served from recent history without calling the provider.
    pub cached: bool,
    /// A new history row was written.
    pub saved: bool,
}

/// Short, char-boundary safe preview of selected text for log lines.
pub fn preview(text: &str) -> String {
    const PREVIEW_CHARS: usize = 20;
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
