use thiserror::Error;
use serde::Serialize;

#[derive(Error, Debug, Serialize)]
pub enum AppError {
    #[error("I/O Error: {0}")]
    Io(String),

    #[error("Network Error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Storage Error: {0}")]
    Storage(String),

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("Clipboard Error: {0}")]
    Clipboard(String),

    #[error("Translation Error: {0}")]
    Translation(String),

    #[error("Unknown Error: {0}")]
    Unknown(String),
}

// Implement conversion from standard errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("Serialization error: {}", err))
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Storage(format!("Record encoding error: {}", err))
    }
}

impl From<crate::core::features::translator::TranslateError> for AppError {
    fn from(err: crate::core::features::translator::TranslateError) -> Self {
        use crate::core::features::translator::TranslateError;
        match err {
            TranslateError::Network(msg) => AppError::Network(msg),
            TranslateError::Timeout(after) => {
                AppError::Timeout(format!("translation did not finish within {:?}", after))
            }
            other => AppError::Translation(other.to_string()),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
