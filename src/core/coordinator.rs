//! Translation coordinator
//!
//! Single task that owns the selection state machine. Everything reaches it
//! as a message on one queue: samples from the poller, debounce expiries,
//! translation results from the worker, and toggles from the user.
//!
//! ```text
//! Idle --candidate passes filter--> Debouncing --timer--> Validating
//!   ^                                   |  new candidate: restart timer
//!   |                                   v
//!   +---- failure / stale / skip ---- Translating --success--> Recording
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::clipboard::filter::{FilterContext, SelectionFilter};
use crate::core::clipboard::guard::DuplicateGuard;
use crate::core::features::translator::{
    translate_with_timeout, TranslateRequest, Translator, TranslatorResult,
};
use crate::core::history::HistoryStore;
use crate::shared::emit::{emit_event, Notifier};
use crate::shared::error::{AppError, AppResult};
use crate::shared::events::AppEvent;
use crate::shared::settings::AppSettings;
use crate::shared::types::{preview, TranslationRecord};

/// Run blocking work (history file I/O) on the blocking pool.
pub(crate) async fn blocking<T, F>(work: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Unknown(format!("Blocking task failed: {}", e)))
}

/// Shared collaborators used by both the automatic and the manual path.
#[derive(Clone)]
pub struct TranslationServices {
    pub settings: Arc<AppSettings>,
    pub filter: SelectionFilter,
    pub guard: Arc<DuplicateGuard>,
    pub history: Arc<HistoryStore>,
    pub translator: Arc<dyn Translator>,
    pub notifier: Arc<dyn Notifier>,
}

impl TranslationServices {
    pub fn new(
        settings: Arc<AppSettings>,
        history: Arc<HistoryStore>,
        translator: Arc<dyn Translator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let guard = Arc::new(DuplicateGuard::from_settings(Arc::clone(&history), &settings));
        Self {
            filter: SelectionFilter::new(&settings.filter),
            settings,
            guard,
            history,
            translator,
            notifier,
        }
    }

    /// Translate with the configured languages and deadline.
    pub async fn translate(&self, text: &str) -> TranslatorResult<String> {
        let request = TranslateRequest::from_settings(text, &self.settings.translation)?;
        translate_with_timeout(
            self.translator.as_ref(),
            &request,
            self.settings.translation.timeout(),
        )
        .await
    }

    pub fn popup_duration(&self) -> Duration {
        self.settings.monitor.popup_duration()
    }
}

#[derive(Debug)]
pub enum CoordinatorMsg {
    /// Selection content changed.
    Sample(String),
    DebounceElapsed { generation: u64 },
    TranslationFinished {
        original: String,
        result: TranslatorResult<String>,
    },
    /// Candidate was found in recent history; nothing was translated.
    DuplicateSkipped { original: String },
    SetEnabled(bool),
    SetAppFocus(bool),
}

/// Cloneable front door to the coordinator task.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<CoordinatorMsg>,
    enabled: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl CoordinatorHandle {
    pub(crate) fn channel(enabled: bool) -> (Self, mpsc::UnboundedReceiver<CoordinatorMsg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = Self {
            tx,
            enabled: Arc::new(AtomicBool::new(enabled)),
            cancel: CancellationToken::new(),
        };
        (handle, rx)
    }

    fn send(&self, msg: CoordinatorMsg) {
        if self.tx.send(msg).is_err() {
            log::debug!("[Coordinator] Not running, message dropped");
        }
    }

    pub fn submit_sample(&self, text: String) {
        self.send(CoordinatorMsg::Sample(text));
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        self.send(CoordinatorMsg::SetEnabled(enabled));
    }

    /// Flip auto-translate and return the new state.
    pub fn toggle(&self) -> bool {
        let enabled = !self.enabled.fetch_xor(true, Ordering::SeqCst);
        self.send(CoordinatorMsg::SetEnabled(enabled));
        enabled
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_app_focus(&self, focused: bool) {
        self.send(CoordinatorMsg::SetAppFocus(focused));
    }

    /// Token cancelled on shutdown; producers tie their loops to it.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingCandidate {
    text: String,
    generation: u64,
}

pub struct TranslationCoordinator {
    services: TranslationServices,
    tx: mpsc::UnboundedSender<CoordinatorMsg>,
    rx: mpsc::UnboundedReceiver<CoordinatorMsg>,
    cancel: CancellationToken,
    debounce: Duration,
    enabled: bool,
    app_has_focus: bool,
    /// Most recent selection reported by the poller.
    live: Option<String>,
    pending: Option<PendingCandidate>,
    debounce_task: Option<JoinHandle<()>>,
    in_flight: Option<String>,
    last_accepted: Option<String>,
    /// Tail of the chain of pending history appends.
    history_write: Option<JoinHandle<()>>,
    generation: u64,
}

impl TranslationCoordinator {
    /// Start the coordinator task.
    pub fn spawn(services: TranslationServices) -> (CoordinatorHandle, JoinHandle<()>) {
        let enabled = services.settings.monitor.auto_translate;
        let (handle, rx) = CoordinatorHandle::channel(enabled);
        let coordinator = Self {
            debounce: services.settings.monitor.debounce(),
            services,
            tx: handle.tx.clone(),
            rx,
            cancel: handle.cancel.clone(),
            enabled,
            app_has_focus: false,
            live: None,
            pending: None,
            debounce_task: None,
            in_flight: None,
            last_accepted: None,
            history_write: None,
            generation: 0,
        };
        let task = tokio::spawn(coordinator.run());
        (handle, task)
    }

    async fn run(mut self) {
        log::info!("[Coordinator] Started (auto translate {})", self.enabled);
        loop {
            tokio::select! {
                msg = self.rx.recv() => match msg {
                    Some(msg) => self.handle(msg),
                    None => break,
                },
                _ = self.cancel.cancelled() => break,
            }
        }
        self.cancel_debounce();
        if let Some(write) = self.history_write.take() {
            let _ = write.await;
        }
        log::info!("[Coordinator] Stopped");
    }

    fn handle(&mut self, msg: CoordinatorMsg) {
        match msg {
            CoordinatorMsg::Sample(text) => self.on_sample(text),
            CoordinatorMsg::DebounceElapsed { generation } => self.on_debounce_elapsed(generation),
            CoordinatorMsg::TranslationFinished { original, result } => {
                self.on_translation_finished(original, result)
            }
            CoordinatorMsg::DuplicateSkipped { original } => self.clear_in_flight(&original),
            CoordinatorMsg::SetEnabled(enabled) => self.on_set_enabled(enabled),
            CoordinatorMsg::SetAppFocus(focused) => self.app_has_focus = focused,
        }
    }

    fn filter_context(&self) -> FilterContext<'_> {
        FilterContext {
            app_has_focus: self.app_has_focus,
            previous: self.last_accepted.as_deref(),
        }
    }

    fn on_sample(&mut self, text: String) {
        let candidate = text.trim().to_string();
        self.live = Some(candidate.clone());

        if !self.enabled {
            return;
        }
        if let Err(reason) = self.services.filter.check(&candidate, self.filter_context()) {
            log::debug!("[Coordinator] Ignoring selection ({})", reason);
            return;
        }
        if self.in_flight.as_deref() == Some(candidate.as_str()) {
            return;
        }
        if self.pending.as_ref().is_some_and(|p| p.text == candidate) {
            return;
        }

        self.start_debounce(candidate);
    }

    /// Start a fresh debounce timer, superseding any running one.
    fn start_debounce(&mut self, candidate: String) {
        self.cancel_debounce();
        self.generation += 1;
        let generation = self.generation;

        log::debug!("[Coordinator] Debouncing \"{}\"", preview(&candidate));
        self.pending = Some(PendingCandidate {
            text: candidate,
            generation,
        });

        let tx = self.tx.clone();
        let delay = self.debounce;
        self.debounce_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(CoordinatorMsg::DebounceElapsed { generation });
        }));
    }

    fn cancel_debounce(&mut self) {
        if let Some(task) = self.debounce_task.take() {
            task.abort();
        }
    }

    fn on_debounce_elapsed(&mut self, generation: u64) {
        let pending = match self.pending.take() {
            Some(pending) if pending.generation == generation => pending,
            other => {
                // Superseded timer.
                self.pending = other;
                return;
            }
        };
        self.debounce_task = None;

        if !self.enabled {
            return;
        }

        // Validating: the user may still be selecting.
        if self.live.as_deref() != Some(pending.text.as_str()) {
            log::debug!("[Coordinator] Selection changed before debounce expired, dropping");
            return;
        }
        if let Err(reason) = self.services.filter.check(&pending.text, self.filter_context()) {
            log::debug!("[Coordinator] Candidate no longer eligible ({})", reason);
            return;
        }
        if self.services.guard.is_cooling_down(&pending.text) {
            log::debug!("[Coordinator] Skipping, still in cooldown");
            return;
        }

        self.start_translation(pending.text);
    }

    /// Worker: history duplicate check on the blocking pool, then translate.
    fn start_translation(&mut self, text: String) {
        self.in_flight = Some(text.clone());

        let services = self.services.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let guard = Arc::clone(&services.guard);
            let candidate = text.clone();
            let duplicate = blocking(move || guard.is_recent_duplicate(&candidate))
                .await
                .unwrap_or(false);
            if duplicate {
                log::debug!("[Coordinator] \"{}\" is already in recent history", preview(&text));
                let _ = tx.send(CoordinatorMsg::DuplicateSkipped { original: text });
                return;
            }

            log::info!("[Coordinator] Translating \"{}\"", preview(&text));
            let result = services.translate(&text).await;
            let _ = tx.send(CoordinatorMsg::TranslationFinished {
                original: text,
                result,
            });
        });
    }

    fn clear_in_flight(&mut self, original: &str) {
        if self.in_flight.as_deref() == Some(original) {
            self.in_flight = None;
        }
    }

    fn on_translation_finished(&mut self, original: String, result: TranslatorResult<String>) {
        self.clear_in_flight(&original);

        if !self.enabled {
            log::debug!("[Coordinator] Auto translate is off, discarding late result");
            return;
        }

        let translated = match result {
            Ok(translated) => translated,
            Err(e) => {
                log::warn!("[Coordinator] Translation of \"{}\" failed: {}", preview(&original), e);
                return;
            }
        };

        // Recording
        self.services.guard.record_accepted(&original);
        let record = TranslationRecord::new(original.clone(), translated);
        self.persist(record.clone());
        self.last_accepted = Some(original);

        emit_event(
            self.services.notifier.as_ref(),
            AppEvent::TranslationReady(record),
            self.services.popup_duration(),
        );
    }

    /// Queue an append behind the previous one so records land in the
    /// order they were accepted.
    fn persist(&mut self, record: TranslationRecord) {
        let history = Arc::clone(&self.services.history);
        let previous = self.history_write.take();
        self.history_write = Some(tokio::spawn(async move {
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            if let Err(e) = blocking(move || history.append(&record)).await.and_then(|saved| saved) {
                log::error!("[Coordinator] Failed to save history: {}", e);
            }
        }));
    }

    fn on_set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.cancel_debounce();
            self.pending = None;
        }
        log::info!("[Coordinator] Auto translate {}", if enabled { "enabled" } else { "disabled" });
        emit_event(
            self.services.notifier.as_ref(),
            AppEvent::MonitorToggled(enabled),
            self.services.popup_duration(),
        );
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::features::translator::TranslateError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Translator that records every call.
    pub(crate) struct RecordingTranslator {
        pub calls: Mutex<Vec<String>>,
        pub delay: Duration,
        pub reply: Box<dyn Fn(&str) -> TranslatorResult<String> + Send + Sync>,
    }

    impl RecordingTranslator {
        pub(crate) fn tamil() -> Self {
            Self::with_reply(|text| Ok(format!("TA:{}", text)))
        }

        pub(crate) fn with_reply(
            reply: impl Fn(&str) -> TranslatorResult<String> + Send + Sync + 'static,
        ) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                delay: Duration::ZERO,
                reply: Box::new(reply),
            }
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Translator for RecordingTranslator {
        async fn translate(&self, request: &TranslateRequest) -> TranslatorResult<String> {
            self.calls.lock().unwrap().push(request.text.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            (self.reply)(&request.text)
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub transient: Mutex<Vec<String>>,
        /// (first position, record count) per history view.
        pub history_views: Mutex<Vec<(usize, usize)>>,
        pub statuses: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        pub(crate) fn transient(&self) -> Vec<String> {
            self.transient.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn show_transient(&self, text: &str, _duration: Duration) {
            self.transient.lock().unwrap().push(text.to_string());
        }

        fn show_history(&self, first: usize, records: &[TranslationRecord]) {
            self.history_views.lock().unwrap().push((first, records.len()));
        }

        fn show_status(&self, message: &str) {
            self.statuses.lock().unwrap().push(message.to_string());
        }
    }

    pub(crate) struct Fixture {
        pub _dir: TempDir,
        pub services: TranslationServices,
        pub translator: Arc<RecordingTranslator>,
        pub notifier: Arc<RecordingNotifier>,
    }

    pub(crate) fn fixture(translator: RecordingTranslator) -> Fixture {
        let dir = TempDir::new().unwrap();
        let history = Arc::new(HistoryStore::open(dir.path(), 500).unwrap());
        let translator = Arc::new(translator);
        let notifier = Arc::new(RecordingNotifier::default());
        let services = TranslationServices::new(
            Arc::new(AppSettings::default()),
            history,
            translator.clone(),
            notifier.clone(),
        );
        Fixture {
            _dir: dir,
            services,
            translator,
            notifier,
        }
    }

    async fn settle(duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_growing_selection_translates_once() {
        let fx = fixture(RecordingTranslator::tamil());
        let (handle, _task) = TranslationCoordinator::spawn(fx.services.clone());

        handle.submit_sample("Hello wor".to_string());
        settle(Duration::from_millis(300)).await;
        handle.submit_sample("Hello world".to_string());
        settle(Duration::from_secs(2)).await;

        assert_eq!(fx.translator.calls(), vec!["Hello world"]);
        assert_eq!(
            fx.services.history.load_all().unwrap(),
            vec![TranslationRecord::new("Hello world", "TA:Hello world")]
        );
        assert_eq!(fx.notifier.transient(), vec!["TA:Hello world"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_changed_selection_aborts_at_validation() {
        let fx = fixture(RecordingTranslator::tamil());
        let (handle, _task) = TranslationCoordinator::spawn(fx.services.clone());

        handle.submit_sample("Hello world".to_string());
        settle(Duration::from_millis(300)).await;
        // Not a candidate itself, but the live selection moved away.
        handle.submit_sample("12345".to_string());
        settle(Duration::from_secs(2)).await;

        assert!(fx.translator.calls().is_empty());
        assert!(fx.services.history.load_all().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_happens_before_debounce() {
        let fx = fixture(RecordingTranslator::tamil());
        let (handle, _task) = TranslationCoordinator::spawn(fx.services.clone());

        handle.submit_sample("Good evening".to_string());
        settle(Duration::from_millis(700)).await;
        assert!(fx.translator.calls().is_empty());

        settle(Duration::from_millis(200)).await;
        assert_eq!(fx.translator.calls(), vec!["Good evening"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_not_recorded() {
        let fx = fixture(RecordingTranslator::with_reply(|text| {
            if text.starts_with("Sentinel") {
                Ok("[Error] quota exceeded".to_string())
            } else {
                Err(TranslateError::Http(503))
            }
        }));
        let (handle, _task) = TranslationCoordinator::spawn(fx.services.clone());

        handle.submit_sample("Sentinel case".to_string());
        settle(Duration::from_secs(2)).await;
        handle.submit_sample("Server down".to_string());
        settle(Duration::from_secs(2)).await;

        assert_eq!(fx.translator.calls().len(), 2);
        assert!(fx.services.history.load_all().unwrap().is_empty());
        assert!(fx.notifier.transient().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicates_are_suppressed() {
        let fx = fixture(RecordingTranslator::tamil());
        let (handle, _task) = TranslationCoordinator::spawn(fx.services.clone());

        for text in ["Hello world", "Another phrase", "hello world"] {
            handle.submit_sample(text.to_string());
            settle(Duration::from_secs(2)).await;
        }
        // Past the cooldown, history still knows it.
        settle(Duration::from_secs(10)).await;
        handle.submit_sample("HELLO WORLD".to_string());
        settle(Duration::from_secs(2)).await;

        assert_eq!(fx.translator.calls(), vec!["Hello world", "Another phrase"]);
        assert_eq!(fx.services.history.len().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_own_window_focus_blocks_candidates() {
        let fx = fixture(RecordingTranslator::tamil());
        let (handle, _task) = TranslationCoordinator::spawn(fx.services.clone());

        handle.set_app_focus(true);
        handle.submit_sample("Auto translate history".to_string());
        settle(Duration::from_secs(2)).await;
        assert!(fx.translator.calls().is_empty());

        handle.set_app_focus(false);
        handle.submit_sample("Selected in another app".to_string());
        settle(Duration::from_secs(2)).await;
        assert_eq!(fx.translator.calls(), vec!["Selected in another app"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_cancels_pending_timer() {
        let fx = fixture(RecordingTranslator::tamil());
        let (handle, _task) = TranslationCoordinator::spawn(fx.services.clone());

        handle.submit_sample("Pending text".to_string());
        settle(Duration::from_millis(300)).await;
        assert!(!handle.toggle());
        settle(Duration::from_secs(2)).await;

        assert!(fx.translator.calls().is_empty());
        assert_eq!(
            fx.notifier.statuses.lock().unwrap().clone(),
            vec!["Auto translation off"]
        );

        assert!(handle.toggle());
        handle.submit_sample("Fresh text".to_string());
        settle(Duration::from_secs(2)).await;
        assert_eq!(fx.translator.calls(), vec!["Fresh text"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_result_discarded_when_disabled() {
        let mut translator = RecordingTranslator::tamil();
        translator.delay = Duration::from_secs(3);
        let fx = fixture(translator);
        let (handle, _task) = TranslationCoordinator::spawn(fx.services.clone());

        handle.submit_sample("Slow network".to_string());
        settle(Duration::from_secs(1)).await;
        assert_eq!(fx.translator.calls(), vec!["Slow network"]);

        handle.set_enabled(false);
        settle(Duration::from_secs(5)).await;

        assert!(fx.services.history.load_all().unwrap().is_empty());
        assert!(fx.notifier.transient().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_records_saved_in_acceptance_order() {
        let fx = fixture(RecordingTranslator::tamil());
        let (handle, task) = TranslationCoordinator::spawn(fx.services.clone());

        for text in ["First phrase", "Second phrase", "Third phrase"] {
            handle.submit_sample(text.to_string());
            settle(Duration::from_secs(1)).await;
        }
        // Shutdown waits for queued appends.
        handle.shutdown();
        task.await.unwrap();

        let originals: Vec<_> = fx
            .services
            .history
            .load_all()
            .unwrap()
            .into_iter()
            .map(|r| r.original)
            .collect();
        assert_eq!(originals, vec!["First phrase", "Second phrase", "Third phrase"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_task() {
        let fx = fixture(RecordingTranslator::tamil());
        let (handle, task) = TranslationCoordinator::spawn(fx.services.clone());

        handle.submit_sample("Never translated".to_string());
        handle.shutdown();
        task.await.unwrap();

        settle(Duration::from_secs(2)).await;
        assert!(fx.translator.calls().is_empty());
    }
}
