//! Configuration settings for Huddle.

use crate::error::{HuddleError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub agents: AgentSettings,
    pub relay: RelaySettings,
    pub search: SearchSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Agent roster settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Agent that receives every new session.
    pub entry_agent: String,
    /// Model used by agents without an explicit override.
    pub default_model: String,
    /// Per-agent model overrides, keyed by agent name.
    pub models: HashMap<String, String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        let mut models = HashMap::new();
        models.insert("Researcher".to_string(), "gpt-4".to_string());

        Self {
            entry_agent: "Sales Manager".to_string(),
            default_model: "gpt-4o-mini".to_string(),
            models,
        }
    }
}

impl AgentSettings {
    /// Model for the named agent.
    pub fn model_for(&self, agent_name: &str) -> &str {
        self.models
            .get(agent_name)
            .map(String::as_str)
            .unwrap_or(&self.default_model)
    }
}

/// Relay loop limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Coordinator-to-specialist delegation hops allowed per user turn.
    pub max_delegation_hops: usize,
    /// Provider calls allowed per user turn.
    pub max_dispatches: usize,
    /// Number of search results shown in a digest.
    pub summary_limit: usize,
    /// Send only the most recent N history messages to the provider.
    pub history_window: Option<usize>,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            max_delegation_hops: 1,
            max_dispatches: 6,
            summary_limit: 3,
            history_window: None,
        }
    }
}

/// Web search provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Base URL of the search API.
    pub api_base: String,
    /// Search depth (basic, advanced).
    pub search_depth: String,
    /// Maximum results requested from the provider.
    pub max_results: u32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.tavily.com".to_string(),
            search_depth: "advanced".to_string(),
            max_results: 5,
            timeout_seconds: 30,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Reject limits that would leave the relay or search client unusable.
    pub fn validate(&self) -> Result<()> {
        if self.relay.max_dispatches == 0 {
            return Err(HuddleError::Config(
                "relay.max_dispatches must be at least 1".to_string(),
            ));
        }
        if self.relay.history_window == Some(0) {
            return Err(HuddleError::Config(
                "relay.history_window must be at least 1 when set".to_string(),
            ));
        }
        if self.search.timeout_seconds == 0 {
            return Err(HuddleError::Config(
                "search.timeout_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| HuddleError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("huddle")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}
