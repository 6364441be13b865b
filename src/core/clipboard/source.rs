//! Selection source collaborator
//!
//! The selection is polled, never pushed. Sampling is best-effort and may
//! block briefly, so callers run it on the blocking pool.

use cli_clipboard::{ClipboardContext, ClipboardProvider};

use crate::shared::error::{AppError, AppResult};

pub trait SelectionSource: Send + Sync {
    /// Current selection text; may be empty.
    fn sample(&self) -> AppResult<String>;
}

/// Reads the system clipboard without activating any window.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl SelectionSource for SystemClipboard {
    fn sample(&self) -> AppResult<String> {
        ClipboardContext::new()
            .and_then(|mut ctx| ctx.get_contents())
            .map(|text| text.trim().to_string())
            .map_err(|e| AppError::Clipboard(e.to_string()))
    }
}
