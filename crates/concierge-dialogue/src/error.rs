//! Error types for the dialogue engine and its remote collaborators.

use concierge_core::error::ConciergeError;

use crate::state::DialogueState;

/// Errors from the dialogue state machine.
#[derive(Debug, thiserror::Error)]
pub enum DialogueError {
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: DialogueState,
        to: DialogueState,
    },
}

/// Errors from the remote responder. None of these end the conversation;
/// the engine turns each into an apology message.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("no remote responder configured")]
    NotConfigured,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("responder returned HTTP {0}")]
    Status(u16),
    #[error("could not decode responder reply: {0}")]
    Decode(String),
    #[error("responder reported status {0:?}")]
    Rejected(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

impl From<DialogueError> for ConciergeError {
    fn from(err: DialogueError) -> Self {
        ConciergeError::Dialogue(err.to_string())
    }
}

impl From<GatewayError> for ConciergeError {
    fn from(err: GatewayError) -> Self {
        ConciergeError::Gateway(err.to_string())
    }
}
