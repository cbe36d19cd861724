//! Common error types for Mixnote

use thiserror::Error;

/// Common result type for Mixnote operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Mixnote crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed TOML configuration file
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
