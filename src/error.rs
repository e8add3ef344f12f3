//! Error taxonomy for console actions.
//!
//! Every user action ends in one of these. None of them is retried; the
//! dashboard turns each into a toast and hands it back to the caller.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    /// The request never produced a readable response.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with `success: false` or a bare `detail`.
    #[error("{detail}")]
    Application { detail: String },

    /// Rejected locally before any request was made.
    #[error("{0}")]
    Validation(String),

    /// The user answered "no" to a confirmation prompt.
    #[error("action cancelled")]
    Declined,

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("settings error: {0}")]
    Settings(String),
}

impl ConsoleError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ConsoleError::Validation(msg.into())
    }

    pub fn application(detail: impl Into<String>) -> Self {
        ConsoleError::Application {
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
