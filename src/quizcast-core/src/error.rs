//! Error types for the quiz audio pipeline.
//!
//! Failures come in two classes with different blast radii:
//! [`SynthesisError`] is scoped to a single audio event and degrades the run,
//! while [`RunError`] aborts the whole run.

use thiserror::Error;

/// Event-scoped failure from one of the audio synthesis collaborators.
///
/// The assembly pipeline logs these, marks the run degraded, and keeps going.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("request timed out")]
    Timeout,

    #[error("service returned HTTP status {status}")]
    Service { status: u16 },

    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for SynthesisError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SynthesisError::Timeout
        } else if let Some(status) = err.status() {
            SynthesisError::Service {
                status: status.as_u16(),
            }
        } else {
            SynthesisError::Transport(err.to_string())
        }
    }
}

/// Run-scoped failure. Any of these aborts the remaining pipeline.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("invalid request: {0}")]
    Request(String),

    #[error("language model unreachable: {0}")]
    ModelUnavailable(String),

    #[error("language model refused the request: {0}")]
    ModelRefused(String),

    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("audio encoding error: {0}")]
    Audio(#[from] hound::Error),

    #[error("no audio was produced for any event; nothing to export")]
    EmptyMix,
}
