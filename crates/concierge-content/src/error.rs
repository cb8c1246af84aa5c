//! Error types for content loading and preference persistence.

use concierge_core::error::ConciergeError;

/// Errors from content sources, the menu tree and preference storage.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("content not found: {0}")]
    NotFound(String),
    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },
    #[error("request for {url} failed with status {status}")]
    Status { url: String, status: u16 },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid menu tree: {0}")]
    InvalidMenu(String),
    #[error("preferences error: {0}")]
    Preferences(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ContentError {
    fn from(err: reqwest::Error) -> Self {
        ContentError::Transport(err.to_string())
    }
}

impl From<ContentError> for ConciergeError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Preferences(msg) => ConciergeError::Preferences(msg),
            ContentError::Io(e) => ConciergeError::Io(e),
            other => ConciergeError::Content(other.to_string()),
        }
    }
}
