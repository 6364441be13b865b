use serde::{Serialize, Deserialize};
use super::types::TranslationRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum AppEvent {
    #[serde(rename = "translation://ready")]
    TranslationReady(TranslationRecord),

    /// `first` is the position of `records[0]` in the full history.
    #[serde(rename = "history://show")]
    HistoryRequested {
        first: usize,
        records: Vec<TranslationRecord>,
    },

    #[serde(rename = "monitor://toggled")]
    MonitorToggled(bool),
}
