// Module declarations
pub mod shared;
pub mod api;
pub mod core;
pub mod system;

use std::sync::Arc;

use crate::core::clipboard::{SelectionMonitor, SystemClipboard};
use crate::core::coordinator::{TranslationCoordinator, TranslationServices};
use crate::core::features::translator::{GoogleTranslator, Translator};
use crate::core::history::HistoryStore;
use crate::shared::emit::ChannelNotifier;
use crate::shared::error::AppResult;
use crate::shared::settings::AppSettings;
use crate::system::console;

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(start()) {
        log::error!("Failed to start: {}", e);
        std::process::exit(1);
    }
}

async fn start() -> AppResult<()> {
    let settings = AppSettings::load().await.unwrap_or_else(|e| {
        log::warn!("Failed to load settings: {}", e);
        AppSettings::default()
    });
    let settings = Arc::new(settings);

    let history = Arc::new(HistoryStore::open(
        settings.history_dir()?,
        settings.history.segment_cap,
    )?);
    let translator: Arc<dyn Translator> = Arc::new(GoogleTranslator::from_settings(&settings.translation)?);
    let (notifier, display_rx) = ChannelNotifier::new();

    let services = TranslationServices::new(
        Arc::clone(&settings),
        Arc::clone(&history),
        translator,
        Arc::new(notifier),
    );

    let display_task = tokio::spawn(console::run_display_loop(display_rx));

    let (coordinator, coordinator_task) = TranslationCoordinator::spawn(services.clone());
    let monitor_task = SelectionMonitor::new(
        Arc::new(SystemClipboard),
        coordinator.clone(),
        settings.monitor.poll_interval(),
    )
    .start();

    println!("✅ Tamil Translator running...");
    if coordinator.is_enabled() {
        println!("💡 Auto translation is live");
    } else {
        println!("⏸  Auto translation is paused (type 'toggle')");
    }
    println!("📘 Type 'history' to view history, 'help' for all commands");

    tokio::select! {
        _ = console::run_command_loop(&services, &coordinator) => {}
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted, shutting down");
        }
    }

    coordinator.shutdown();
    if let Err(e) = monitor_task.await {
        log::warn!("Selection monitor ended abnormally: {}", e);
    }
    if let Err(e) = coordinator_task.await {
        log::warn!("Coordinator ended abnormally: {}", e);
    }
    display_task.abort();
    Ok(())
}
