use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use crate::core::history::HistoryStore;
use crate::shared::settings::AppSettings;
use crate::shared::types::TranslationRecord;

/// Trimmed, case-folded form used for every duplicate comparison.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalized text -> when it was last accepted.
#[derive(Debug, Default)]
pub struct CooldownCache {
    entries: HashMap<String, Instant>,
}

impl CooldownCache {
    pub fn is_cooling(&self, key: &str, now: Instant, window: Duration) -> bool {
        self.entries
            .get(key)
            .is_some_and(|accepted| now.saturating_duration_since(*accepted) < window)
    }

    /// Insert `key` and drop entries older than twice the window.
    pub fn insert(&mut self, key: String, now: Instant, window: Duration) {
        let horizon = window * 2;
        self.entries
            .retain(|_, accepted| now.saturating_duration_since(*accepted) < horizon);
        self.entries.insert(key, now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Suppresses re-translation of text that was just translated or already
/// sits in recent history.
pub struct DuplicateGuard {
    history: Arc<HistoryStore>,
    cooldown: Duration,
    duplicate_window: usize,
    cache_window: usize,
    cache: Mutex<CooldownCache>,
}

impl DuplicateGuard {
    pub fn new(
        history: Arc<HistoryStore>,
        cooldown: Duration,
        duplicate_window: usize,
        cache_window: usize,
    ) -> Self {
        Self {
            history,
            cooldown,
            duplicate_window,
            cache_window,
            cache: Mutex::new(CooldownCache::default()),
        }
    }

    pub fn from_settings(history: Arc<HistoryStore>, settings: &AppSettings) -> Self {
        Self::new(
            history,
            settings.monitor.cooldown(),
            settings.history.duplicate_window,
            settings.history.cache_window,
        )
    }

    fn lock_cache(&self) -> MutexGuard<'_, CooldownCache> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::error!("[DuplicateGuard] Cache mutex poisoned, recovering...");
                poisoned.into_inner()
            }
        }
    }

    /// True when the text must not trigger a new translation.
    pub fn should_skip(&self, raw: &str) -> bool {
        if self.is_cooling_down(raw) {
            log::debug!("[DuplicateGuard] Skipping, still in cooldown");
            return true;
        }
        if self.is_recent_duplicate(raw) {
            log::debug!("[DuplicateGuard] Skipping, already in recent history");
            return true;
        }
        false
    }

    pub fn is_cooling_down(&self, raw: &str) -> bool {
        let key = normalize(raw);
        self.lock_cache().is_cooling(&key, Instant::now(), self.cooldown)
    }

    /// Exact normalized match of an `original` among the last few records.
    pub fn is_recent_duplicate(&self, raw: &str) -> bool {
        self.find_in_history(raw, self.duplicate_window).is_some()
    }

    /// Stored translation for this text, newest match first.
    pub fn cached_translation(&self, raw: &str) -> Option<String> {
        self.find_in_history(raw, self.cache_window)
            .map(|record| record.translated)
    }

    fn find_in_history(&self, raw: &str, window: usize) -> Option<TranslationRecord> {
        let key = normalize(raw);
        let recent = match self.history.load_recent(window) {
            Ok(recent) => recent,
            Err(e) => {
                log::warn!("[DuplicateGuard] History lookup failed: {}", e);
                return None;
            }
        };
        recent
            .into_iter()
            .rev()
            .find(|record| normalize(&record.original) == key)
    }

    pub fn record_accepted(&self, raw: &str) {
        let key = normalize(raw);
        self.lock_cache().insert(key, Instant::now(), self.cooldown);
    }

    pub fn cooldown_entries(&self) -> usize {
        self.lock_cache().len()
    }
}
