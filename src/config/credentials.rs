//! API credentials read from the process environment.

use crate::error::{HuddleError, Result};

/// Environment variable holding the completion-provider key.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Environment variable holding the search-provider key.
pub const TAVILY_API_KEY: &str = "TAVILY_API_KEY";

/// Credentials for the external providers.
#[derive(Clone)]
pub struct Credentials {
    pub openai_api_key: String,
    pub tavily_api_key: String,
}

impl Credentials {
    /// Read both credentials from the environment.
    ///
    /// A missing or empty variable is an error; callers treat it as fatal.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            openai_api_key: require(OPENAI_API_KEY)?,
            tavily_api_key: require(TAVILY_API_KEY)?,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("tavily_api_key", &mask(&self.tavily_api_key))
            .finish()
    }
}

/// Read a required, non-empty environment variable.
pub fn require(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(HuddleError::MissingCredential(name.to_string())),
    }
}

/// Mask a secret for display, keeping only a short prefix.
pub fn mask(secret: &str) -> String {
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}...", secret.chars().take(4).collect::<String>())
    }
}
