//! Wiring for the sales team.
//!
//! Builds the shared, read-only handles (registry, provider clients, tool
//! context) once, and hands out independent relay sessions from them.

use crate::agent::{AgentRegistry, ToolContext};
use crate::config::{Credentials, RelaySettings, Settings};
use crate::error::Result;
use crate::orchestrator::{OpenAIOrchestrator, Orchestrator};
use crate::relay::RelayLoop;
use crate::search::{TavilyClient, WebSearch};
use std::sync::Arc;
use tracing::info;

/// Shared handles every session is built from.
#[derive(Clone)]
pub struct Team {
    registry: Arc<AgentRegistry>,
    tools: Arc<ToolContext>,
    orchestrator: Arc<dyn Orchestrator>,
    relay: RelaySettings,
}

impl Team {
    /// Assemble a team from explicit handles.
    pub fn new(
        registry: AgentRegistry,
        orchestrator: Arc<dyn Orchestrator>,
        search: Arc<dyn WebSearch>,
        relay: RelaySettings,
    ) -> Self {
        let registry = Arc::new(registry);
        let tools = Arc::new(ToolContext::new(
            Arc::clone(&registry),
            search,
            relay.summary_limit,
        ));

        Self {
            registry,
            tools,
            orchestrator,
            relay,
        }
    }

    /// Build the OpenAI + Tavily team described by the settings.
    pub fn from_settings(settings: &Settings, credentials: &Credentials) -> Result<Self> {
        settings.validate()?;
        let registry = AgentRegistry::from_settings(settings)?;
        let orchestrator = Arc::new(OpenAIOrchestrator::from_api_key(&credentials.openai_api_key)?);
        let search = Arc::new(TavilyClient::new(&credentials.tavily_api_key, &settings.search)?);

        info!(
            "Sales team ready: {} agents, entry agent {}",
            registry.len(),
            registry.entry().name
        );

        Ok(Self::new(registry, orchestrator, search, settings.relay.clone()))
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Start a fresh session at the entry agent.
    pub fn session(&self) -> RelayLoop {
        RelayLoop::new(
            Arc::clone(&self.orchestrator),
            Arc::clone(&self.tools),
            self.relay.clone(),
        )
    }
}
