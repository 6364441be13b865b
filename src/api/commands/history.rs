//! History command module
//!
//! Indices are positions in oldest-first history order, starting at 0.

use crate::core::coordinator::TranslationServices;
use crate::shared::emit::emit_event;
use crate::shared::errors::{CommandError, CommandResult};
use crate::shared::events::AppEvent;
use crate::shared::types::TranslationRecord;

/// Records shown by the history view when no limit is given.
pub const HISTORY_VIEW_LIMIT: usize = 200;

/// Show the most recent `limit` records and return how many were shown.
pub fn show_history(services: &TranslationServices, limit: Option<usize>) -> CommandResult<usize> {
    let (first, records) = services
        .history
        .load_tail(limit.unwrap_or(HISTORY_VIEW_LIMIT))?;
    let shown = records.len();
    emit_event(
        services.notifier.as_ref(),
        AppEvent::HistoryRequested { first, records },
        services.popup_duration(),
    );
    Ok(shown)
}

/// Replace the translated text of one entry. Returns the updated record.
pub fn edit_translation(
    services: &TranslationServices,
    index: usize,
    translated: &str,
) -> CommandResult<TranslationRecord> {
    let translated = translated.trim();
    if translated.is_empty() {
        return Err(CommandError::InvalidInput("Translation cannot be empty".to_string()));
    }

    let updated = services.history.update_translation(index, translated)?;
    log::info!("[Commands] Edited history entry {}", index + 1);
    Ok(updated)
}

/// Remove one entry and return it.
pub fn delete_entry(services: &TranslationServices, index: usize) -> CommandResult<TranslationRecord> {
    let removed = services.history.delete(index)?;
    log::info!("[Commands] Deleted history entry {}", index + 1);
    Ok(removed)
}

pub fn clear_history(services: &TranslationServices) -> CommandResult<()> {
    services.history.clear()?;
    log::info!("[Commands] Cleared all history");
    Ok(())
}
