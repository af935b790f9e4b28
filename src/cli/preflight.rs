//! Pre-flight checks before talking to the providers.
//!
//! Validates that required credentials are available before starting
//! operations that would otherwise fail on the first request.

use crate::config::{self, Credentials};
use crate::error::Result;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Chatting with the team needs both the completion and search keys.
    Chat,
    /// Running the search tool directly needs only the search key.
    Search,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Chat => {
            Credentials::from_env()?;
        }
        Operation::Search => {
            config::require(config::TAVILY_API_KEY)?;
        }
    }
    Ok(())
}
