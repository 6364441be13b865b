//! Auto-translate toggle

use crate::core::coordinator::CoordinatorHandle;

/// Flip auto-translate; returns the new state.
pub fn toggle_auto_translate(coordinator: &CoordinatorHandle) -> bool {
    let enabled = coordinator.toggle();
    log::info!("[Commands] Auto translate: {}", if enabled { "enabled" } else { "disabled" });
    enabled
}

pub fn set_auto_translate(coordinator: &CoordinatorHandle, enabled: bool) {
    coordinator.set_enabled(enabled);
}
