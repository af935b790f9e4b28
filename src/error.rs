//! Error types for Huddle.

use thiserror::Error;

/// Library-level error type for Huddle operations.
#[derive(Error, Debug)]
pub enum HuddleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0} not set. Set it with: export {0}='...'")]
    MissingCredential(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Web search failed: {0}")]
    Search(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for Huddle operations.
pub type Result<T> = std::result::Result<T, HuddleError>;
