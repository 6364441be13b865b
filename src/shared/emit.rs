use std::time::Duration;
use tokio::sync::mpsc;

use super::events::AppEvent;
use super::types::TranslationRecord;

/// Display collaborator. Implementations must be cheap to call from any
/// thread; rendering happens wherever the implementation posts to.
pub trait Notifier: Send + Sync {
    /// Fire-and-forget popup that dismisses itself after `duration`.
    fn show_transient(&self, text: &str, duration: Duration);

    /// Passive history list view; `first` is the 0-based history position
    /// of `records[0]`, fixed when the view was requested.
    fn show_history(&self, first: usize, records: &[TranslationRecord]);

    /// Status line (e.g. auto-translate toggled).
    fn show_status(&self, message: &str);
}

/// Work items consumed by the display loop.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCommand {
    Transient { text: String, duration: Duration },
    History {
        first: usize,
        records: Vec<TranslationRecord>,
    },
    Status(String),
}

/// Notifier that hands everything to the display loop over a channel, so
/// workers never touch display state directly.
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<DisplayCommand>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DisplayCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn post(&self, command: DisplayCommand) {
        if self.tx.send(command).is_err() {
            log::warn!("[Display] Display loop has shut down, dropping update");
        }
    }
}

impl Notifier for ChannelNotifier {
    fn show_transient(&self, text: &str, duration: Duration) {
        self.post(DisplayCommand::Transient {
            text: text.to_string(),
            duration,
        });
    }

    fn show_history(&self, first: usize, records: &[TranslationRecord]) {
        self.post(DisplayCommand::History {
            first,
            records: records.to_vec(),
        });
    }

    fn show_status(&self, message: &str) {
        self.post(DisplayCommand::Status(message.to_string()));
    }
}

/// Route an application event to the display collaborator
pub fn emit_event(notifier: &dyn Notifier, event: AppEvent, popup_duration: Duration) {
    match event {
        AppEvent::TranslationReady(record) => {
            notifier.show_transient(&record.translated, popup_duration);
        }
        AppEvent::HistoryRequested { first, records } => {
            notifier.show_history(first, &records);
        }
        AppEvent::MonitorToggled(enabled) => {
            let state = if enabled { "on" } else { "off" };
            notifier.show_status(&format!("Auto translation {}", state));
        }
    }
}
