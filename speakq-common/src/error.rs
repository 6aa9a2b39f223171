//! Common error types for speakq

use thiserror::Error;

/// Common result type for speakq operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by speakq crates
#[derive(Error, Debug)]
pub enum Error {
    /// TOML configuration could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
