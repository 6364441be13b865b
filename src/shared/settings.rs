use serde::{Deserialize, Serialize};
use tokio::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use directories::ProjectDirs;
use isolang::Language;

use crate::shared::error::{AppError, AppResult};
use crate::shared::types::ManualSavePolicy;

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "antigravity";
const APPLICATION: &str = "tamil-selection-translator";

const MIN_POLL_INTERVAL_MS: u64 = 500;
const MAX_POLL_INTERVAL_MS: u64 = 1500;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppSettings {
    pub translation: TranslationSettings,
    pub monitor: MonitorSettings,
    pub history: HistorySettings,
    pub filter: FilterSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    pub source_lang: String,
    pub target_lang: String,
    pub timeout_secs: u64,
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub auto_translate: bool,
    pub poll_interval_ms: u64,
    pub debounce_ms: u64,
    pub cooldown_secs: u64,
    pub popup_duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Overrides the platform data directory when set.
    pub directory: Option<PathBuf>,
    pub segment_cap: usize,
    pub manual_save_policy: ManualSavePolicy,
    /// Recent records searched when suppressing automatic duplicates.
    pub duplicate_window: usize,
    /// Recent records searched for a reusable translation.
    pub cache_window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub min_chars: usize,
    pub max_chars: usize,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            source_lang: "auto".to_string(),
            target_lang: "ta".to_string(),
            timeout_secs: 10,
            endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            auto_translate: true,
            poll_interval_ms: 1000,
            debounce_ms: 800,
            cooldown_secs: 5,
            popup_duration_ms: 4000,
        }
    }
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            directory: None,
            segment_cap: 500,
            manual_save_policy: ManualSavePolicy::default(),
            duplicate_window: 50,
            cache_window: 200,
        }
    }
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            min_chars: 3,
            max_chars: 200,
        }
    }
}

impl MonitorSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn popup_duration(&self) -> Duration {
        Duration::from_millis(self.popup_duration_ms)
    }
}

impl TranslationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppSettings {
    pub fn get_settings_path() -> AppResult<PathBuf> {
        ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or_else(|| AppError::Io("Failed to determine config directory".to_string()))
    }

    /// Directory holding the history segments.
    pub fn history_dir(&self) -> AppResult<PathBuf> {
        if let Some(dir) = &self.history.directory {
            return Ok(dir.clone());
        }
        ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .map(|dirs| dirs.data_dir().join("history"))
            .ok_or_else(|| AppError::Io("Failed to determine data directory".to_string()))
    }

    /// Load settings from the platform config directory, writing defaults on first run.
    pub async fn load() -> AppResult<Self> {
        let path = Self::get_settings_path()?;
        Self::load_from(&path).await
    }

    pub async fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            let settings = Self::default();
            settings.save_to(path).await?;
            return Ok(settings);
        }

        let content = fs::read_to_string(path).await
            .map_err(|e| AppError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Self = serde_json::from_str(&content)
            .map_err(|e| AppError::Validation(format!("Failed to parse settings: {}", e)))?;
        Ok(settings.sanitized())
    }

    pub async fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await
                .map_err(|e| AppError::Io(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)?;

        fs::write(path, content).await
            .map_err(|e| AppError::Io(format!("Failed to write settings file: {}", e)))
    }

    /// Clamp values the rest of the app relies on being in range.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        self.monitor.poll_interval_ms = self
            .monitor
            .poll_interval_ms
            .clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS);
        if self.history.segment_cap == 0 {
            self.history.segment_cap = defaults.history.segment_cap;
        }
        if self.translation.timeout_secs == 0 {
            self.translation.timeout_secs = defaults.translation.timeout_secs;
        }
        if self.filter.min_chars > self.filter.max_chars {
            self.filter = defaults.filter.clone();
        }
        if Language::from_639_1(&self.translation.target_lang).is_none() {
            log::warn!(
                "[Settings] Unknown target language '{}', falling back to '{}'",
                self.translation.target_lang,
                defaults.translation.target_lang
            );
            self.translation.target_lang = defaults.translation.target_lang.clone();
        }
        let source = &self.translation.source_lang;
        if !source.eq_ignore_ascii_case("auto") && Language::from_639_1(source).is_none() {
            self.translation.source_lang = defaults.translation.source_lang;
        }
        self
    }
}
