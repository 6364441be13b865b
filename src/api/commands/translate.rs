//! Manual translation command
//!
//! Typed text skips the selection filter and the debounce timer. Whether the
//! result goes through duplicate suppression is decided by
//! `ManualSavePolicy`.

use std::sync::Arc;

use crate::core::coordinator::{blocking, TranslationServices};
use crate::shared::emit::emit_event;
use crate::shared::error::AppError;
use crate::shared::errors::CommandResult;
use crate::shared::events::AppEvent;
use crate::shared::types::{preview, ManualSavePolicy, ManualTranslation, TranslationRecord};

/// Translate typed text, save it per policy and show it.
pub async fn translate_manual(services: &TranslationServices, text: &str) -> CommandResult<ManualTranslation> {
    let text = services.filter.validate_manual(text)?;
    let policy = services.settings.history.manual_save_policy;

    if policy == ManualSavePolicy::SkipDuplicates {
        let guard = Arc::clone(&services.guard);
        let key = text.to_string();
        if let Some(translated) = blocking(move || guard.cached_translation(&key)).await? {
            log::info!("[Commands] Reusing stored translation for \"{}\"", preview(text));
            let record = TranslationRecord::new(text, translated);
            show(services, &record);
            return Ok(ManualTranslation {
                record,
                cached: true,
                saved: false,
            });
        }
    }

    let translated = services.translate(text).await.map_err(AppError::from)?;
    let record = TranslationRecord::new(text, translated);

    let history = Arc::clone(&services.history);
    let to_save = record.clone();
    blocking(move || history.append(&to_save)).await??;
    services.guard.record_accepted(text);
    show(services, &record);

    Ok(ManualTranslation {
        record,
        cached: false,
        saved: true,
    })
}

fn show(services: &TranslationServices, record: &TranslationRecord) {
    emit_event(
        services.notifier.as_ref(),
        AppEvent::TranslationReady(record.clone()),
        services.popup_duration(),
    );
}
