use segment_core::AnnotatorError;
use thiserror::Error;

/// Close-code taxonomy for the `/segment` endpoint (spec.md §7). Validation
/// failures carry their own code (1002 or 1008); transport errors never
/// reach this type — they're logged and the loop simply exits.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{1}")]
    Validation(u16, String),

    #[error("transport error: {0}")]
    Transport(#[from] axum::Error),

    #[error("annotator error: {0}")]
    Annotator(#[from] AnnotatorError),

    #[error("programmer error: {0}")]
    Programmer(String),
}

impl SessionError {
    /// The WebSocket close code this error should surface as, or `None` for
    /// transport errors, which close without a code of their own.
    pub fn close_code(&self) -> Option<u16> {
        match self {
            SessionError::Validation(code, _) => Some(*code),
            SessionError::Transport(_) => None,
            SessionError::Annotator(_) | SessionError::Programmer(_) => Some(1011),
        }
    }
}
