//! Error types for speakq-player
//!
//! Caller-input errors form a small closed set raised before any queue
//! mutation. Engine capability gaps and utterance errors never surface here;
//! the controller absorbs them into playback state.

use thiserror::Error;

/// Main error type for speakq-player
#[derive(Error, Debug)]
pub enum Error {
    /// Speech engine is not available in this runtime
    #[error("Unsupported engine: speech synthesis is not available")]
    UnsupportedEngine,

    /// Input text missing, empty or not a string
    #[error("Invalid input type: {0}")]
    InvalidInputType(String),

    /// Input text longer than the engine accepts
    #[error("Max length exceeded: {length} characters (max {max})")]
    MaxLengthExceeded { length: usize, max: usize },

    /// Language tag supplied but not a string
    #[error("Invalid language type: expected a string")]
    InvalidLanguageType,

    /// Options supplied but not an object
    #[error("Invalid options type: expected an object")]
    InvalidOptionsType,

    /// Control action not recognized
    #[error("Invalid action name: {0}")]
    InvalidActionName(String),

    /// Controller task has shut down
    #[error("Controller stopped")]
    ControllerStopped,

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<speakq_common::Error> for Error {
    fn from(err: speakq_common::Error) -> Self {
        Error::Config(err.to_string())
    }
}

/// Convenience Result type using speakq-player Error
pub type Result<T> = std::result::Result<T, Error>;
