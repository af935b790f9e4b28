//! Configuration module for Huddle.
//!
//! Handles loading application settings, agent prompt templates and the
//! provider credentials taken from the environment.

mod credentials;
mod prompts;
mod settings;

pub use credentials::{mask, require, Credentials, OPENAI_API_KEY, TAVILY_API_KEY};
pub use prompts::{AgentPrompts, Prompts};
pub use settings::{
    AgentSettings, GeneralSettings, PromptSettings, RelaySettings, SearchSettings,
    ServerSettings, Settings,
};
