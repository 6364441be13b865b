use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use super::source::SelectionSource;
use crate::core::coordinator::CoordinatorHandle;
use crate::shared::error::AppError;

const MAX_CONSECUTIVE_ERRORS: u32 = 10;
const SAMPLE_TIMEOUT: Duration = Duration::from_secs(2);
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Sleep before the next poll after `consecutive_errors` failed samples.
pub fn backoff_interval(base: Duration, consecutive_errors: u32) -> Duration {
    if consecutive_errors < MAX_CONSECUTIVE_ERRORS {
        return base;
    }
    // Exponential backoff up to MAX_POLL_INTERVAL
    let factor = 2_u32.pow((consecutive_errors - MAX_CONSECUTIVE_ERRORS).min(4));
    std::cmp::min(base * factor, MAX_POLL_INTERVAL)
}

/// Periodic producer: samples the selection and forwards changes to the coordinator.
pub struct SelectionMonitor {
    source: Arc<dyn SelectionSource>,
    coordinator: CoordinatorHandle,
    interval: Duration,
}

impl SelectionMonitor {
    pub fn new(source: Arc<dyn SelectionSource>, coordinator: CoordinatorHandle, interval: Duration) -> Self {
        Self {
            source,
            coordinator,
            interval,
        }
    }

    /// Start polling on a background task until the coordinator shuts down.
    pub fn start(self) -> JoinHandle<()> {
        let cancel = self.coordinator.cancellation_token();
        tokio::spawn(self.run(cancel))
    }

    async fn sample(&self) -> Result<String, AppError> {
        let source = Arc::clone(&self.source);
        let task = tokio::task::spawn_blocking(move || source.sample());
        match tokio::time::timeout(SAMPLE_TIMEOUT, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(AppError::Clipboard(format!("sampling task failed: {}", join_err))),
            Err(_) => Err(AppError::Timeout("selection sample".to_string())),
        }
    }

    async fn run(self, cancel: CancellationToken) {
        log::info!("[SelectionMonitor] Started monitoring every {:?}", self.interval);

        let mut last_content: Option<String> = None;
        let mut consecutive_errors = 0u32;

        loop {
            let sleep_interval = if !self.coordinator.is_enabled() {
                consecutive_errors = 0; // Reset error count when disabled
                self.interval
            } else {
                match self.sample().await {
                    Ok(current) => {
                        consecutive_errors = 0;
                        if !current.is_empty() && last_content.as_deref() != Some(current.as_str()) {
                            last_content = Some(current.clone());
                            self.coordinator.submit_sample(current);
                        }
                        self.interval
                    }
                    Err(e) => {
                        consecutive_errors += 1;

                        // Only log errors occasionally to avoid spam
                        if consecutive_errors == 1 || consecutive_errors % 10 == 0 {
                            log::warn!(
                                "[SelectionMonitor] Failed to read selection (error #{}) : {}",
                                consecutive_errors,
                                e
                            );
                        }
                        if consecutive_errors == MAX_CONSECUTIVE_ERRORS {
                            log::warn!("[SelectionMonitor] Too many consecutive errors. Reducing polling frequency.");
                        }
                        backoff_interval(self.interval, consecutive_errors)
                    }
                }
            };

            tokio::select! {
                _ = sleep(sleep_interval) => {}
                _ = cancel.cancelled() => break,
            }
        }

        log::info!("[SelectionMonitor] Stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coordinator::CoordinatorMsg;
    use crate::shared::error::AppResult;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted samples, then repeats the last one.
    struct ScriptedSource {
        script: Mutex<VecDeque<AppResult<String>>>,
        last: Mutex<String>,
    }

    impl ScriptedSource {
        fn new(script: Vec<AppResult<String>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(String::new()),
            }
        }
    }

    impl SelectionSource for ScriptedSource {
        fn sample(&self) -> AppResult<String> {
            match self.script.lock().unwrap().pop_front() {
                Some(Ok(text)) => {
                    *self.last.lock().unwrap() = text.clone();
                    Ok(text)
                }
                Some(Err(e)) => Err(e),
                None => Ok(self.last.lock().unwrap().clone()),
            }
        }
    }

    #[test]
    fn test_backoff_interval() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_interval(base, 0), base);
        assert_eq!(backoff_interval(base, 9), base);
        assert_eq!(backoff_interval(base, 10), base);
        assert_eq!(backoff_interval(base, 11), Duration::from_millis(1000));
        assert_eq!(backoff_interval(base, 13), Duration::from_millis(4000));
        assert_eq!(backoff_interval(base, 40), MAX_POLL_INTERVAL);
    }

    #[tokio::test]
    async fn test_forwards_only_changes() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok("first selection".to_string()),
            Ok("first selection".to_string()),
            Ok(String::new()),
            Err(AppError::Clipboard("busy".to_string())),
            Ok("second selection".to_string()),
        ]));
        let (handle, mut rx) = CoordinatorHandle::channel(true);
        let task = SelectionMonitor::new(source, handle.clone(), Duration::from_millis(5)).start();

        let mut samples = Vec::new();
        while samples.len() < 2 {
            match rx.recv().await {
                Some(CoordinatorMsg::Sample(text)) => samples.push(text),
                Some(_) => {}
                None => break,
            }
        }
        handle.shutdown();
        task.await.unwrap();

        assert_eq!(samples, vec!["first selection", "second selection"]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_disabled_monitor_does_not_sample() {
        let source = Arc::new(ScriptedSource::new(vec![Ok("selected text".to_string())]));
        let (handle, mut rx) = CoordinatorHandle::channel(false);
        let task = SelectionMonitor::new(source.clone(), handle.clone(), Duration::from_millis(5)).start();

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown();
        task.await.unwrap();

        assert!(rx.try_recv().is_err());
        assert_eq!(source.script.lock().unwrap().len(), 1);
    }
}
