//! Errors surfaced by explicit user actions
//!
//! The automatic selection path swallows collaborator failures; manual
//! translate, edit, delete and clear report them through `CommandError`.
//! All variants are serializable so a front end can render them.

use thiserror::Error;
use serde::Serialize;

use crate::shared::error::AppError;

/// Command execution errors
#[derive(Error, Debug, Clone, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum CommandError {
    /// System I/O error (history files, settings file)
    #[error("System I/O error: {0}")]
    SystemIO(String),

    /// Invalid input or parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Clipboard operation error
    #[error("Clipboard error: {0}")]
    ClipboardError(String),

    /// Translation provider failed or returned nothing usable
    #[error("Translation failed: {0}")]
    TranslationFailed(String),

    /// Network/API error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Unknown/unexpected error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        CommandError::SystemIO(err.to_string())
    }
}

impl From<AppError> for CommandError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Io(msg) | AppError::Storage(msg) => CommandError::SystemIO(msg),
            AppError::Network(msg) => CommandError::NetworkError(msg),
            AppError::Timeout(msg) => CommandError::NetworkError(msg),
            AppError::Validation(msg) => CommandError::InvalidInput(msg),
            AppError::Clipboard(msg) => CommandError::ClipboardError(msg),
            AppError::Translation(msg) => CommandError::TranslationFailed(msg),
            AppError::Unknown(msg) => CommandError::Unknown(msg),
        }
    }
}

// Helper type alias for command results
pub type CommandResult<T> = Result<T, CommandError>;
