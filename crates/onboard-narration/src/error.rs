//! Error types for the narration engine

use thiserror::Error;

/// Result type alias for narration operations
pub type NarrationResult<T> = Result<T, NarrationError>;

/// Errors that can occur while synthesizing or presenting a narration
#[derive(Error, Debug)]
pub enum NarrationError {
    #[error("Speech provider returned status {status}: {body}")]
    SynthesisStatus { status: u16, body: String },

    #[error("Speech synthesis transport error: {0}")]
    SynthesisTransport(String),

    #[error("Audio playback error: {0}")]
    Playback(String),

    #[error("Narration text is empty")]
    EmptyText,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
