//! The sales team roster.

use super::tools::ToolName;
use crate::config::{AgentSettings, Prompts, Settings};
use crate::error::{HuddleError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity of every agent the relay knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentId {
    SalesManager,
    LeadQualifier,
    ObjectionHandler,
    Closer,
    Researcher,
}

impl AgentId {
    /// All agents, in roster order.
    pub const ALL: [AgentId; 5] = [
        AgentId::SalesManager,
        AgentId::LeadQualifier,
        AgentId::ObjectionHandler,
        AgentId::Closer,
        AgentId::Researcher,
    ];

    /// Display name, also the name used in transfer instructions.
    pub fn name(&self) -> &'static str {
        match self {
            AgentId::SalesManager => "Sales Manager",
            AgentId::LeadQualifier => "Lead Qualifier",
            AgentId::ObjectionHandler => "Objection Handler",
            AgentId::Closer => "Closer",
            AgentId::Researcher => "Researcher",
        }
    }

    /// Resolve an exact display name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    /// Tools this agent may call.
    pub fn tools(&self) -> &'static [ToolName] {
        match self {
            AgentId::SalesManager => &[ToolName::TransferToAgent, ToolName::WebSearch],
            AgentId::Researcher => &[ToolName::WebSearch],
            AgentId::LeadQualifier | AgentId::ObjectionHandler | AgentId::Closer => &[],
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }

    fn instructions<'a>(&self, prompts: &'a Prompts) -> &'a str {
        match self {
            AgentId::SalesManager => &prompts.agents.sales_manager,
            AgentId::LeadQualifier => &prompts.agents.lead_qualifier,
            AgentId::ObjectionHandler => &prompts.agents.objection_handler,
            AgentId::Closer => &prompts.agents.closer,
            AgentId::Researcher => &prompts.agents.researcher,
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A named persona used to shape one provider call.
#[derive(Debug, Clone, Serialize)]
pub struct AgentDescriptor {
    pub id: AgentId,
    pub name: String,
    pub model: String,
    pub instructions: String,
    pub tools: Vec<ToolName>,
}

impl AgentDescriptor {
    /// Whether this agent is allowed to call `tool`.
    pub fn allows(&self, tool: ToolName) -> bool {
        self.tools.contains(&tool)
    }
}

/// Read-only registry of agent descriptors, built once at startup.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: Vec<AgentDescriptor>,
    entry: AgentId,
}

impl AgentRegistry {
    /// Build the registry for `today`, rendering instruction templates.
    ///
    /// Fails if the configured entry agent is not on the roster.
    pub fn new(settings: &AgentSettings, prompts: &Prompts, today: NaiveDate) -> Result<Self> {
        let entry = AgentId::from_name(&settings.entry_agent).ok_or_else(|| {
            HuddleError::Config(format!("Unknown entry agent: {}", settings.entry_agent))
        })?;

        let mut vars = HashMap::new();
        vars.insert("current_date".to_string(), today.format("%Y-%m-%d").to_string());
        vars.insert("current_year".to_string(), today.year().to_string());

        let agents = AgentId::ALL
            .into_iter()
            .map(|id| AgentDescriptor {
                id,
                name: id.name().to_string(),
                model: settings.model_for(id.name()).to_string(),
                instructions: prompts.render_with_custom(id.instructions(prompts), &vars),
                tools: id.tools().to_vec(),
            })
            .collect();

        Ok(Self { agents, entry })
    }

    /// Build the registry from settings, loading custom prompts and using today's date.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        Self::new(&settings.agents, &prompts, chrono::Local::now().date_naive())
    }

    /// Look up an agent by display name.
    pub fn lookup(&self, name: &str) -> Option<&AgentDescriptor> {
        AgentId::from_name(name).map(|id| self.get(id))
    }

    /// Descriptor for a known identity.
    pub fn get(&self, id: AgentId) -> &AgentDescriptor {
        &self.agents[id.index()]
    }

    /// The agent every session starts with.
    pub fn entry(&self) -> &AgentDescriptor {
        self.get(self.entry)
    }

    pub fn entry_id(&self) -> AgentId {
        self.entry
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentDescriptor> {
        self.agents.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 3).unwrap()
    }

    fn registry() -> AgentRegistry {
        AgentRegistry::new(&AgentSettings::default(), &Prompts::default(), today()).unwrap()
    }

    #[test]
    fn test_lookup_known_names() {
        let registry = registry();
        for id in AgentId::ALL {
            let agent = registry.lookup(id.name()).unwrap();
            assert_eq!(agent.name, id.name());
            assert_eq!(agent.id, id);
        }
    }

    #[test]
    fn test_lookup_unknown_names() {
        let registry = registry();
        assert!(registry.lookup("Janitor").is_none());
        assert!(registry.lookup("").is_none());
        assert!(registry.lookup("closer").is_none());
    }

    #[test]
    fn test_models_and_tools() {
        let registry = registry();
        assert_eq!(registry.get(AgentId::Researcher).model, "gpt-4");
        assert_eq!(registry.get(AgentId::Closer).model, "gpt-4o-mini");

        let manager = registry.get(AgentId::SalesManager);
        assert!(manager.allows(ToolName::TransferToAgent));
        assert!(manager.allows(ToolName::WebSearch));
        assert!(!registry.get(AgentId::Closer).allows(ToolName::TransferToAgent));
        assert!(!registry.get(AgentId::Researcher).allows(ToolName::TransferToAgent));
    }

    #[test]
    fn test_instructions_are_rendered() {
        let registry = registry();
        let manager = registry.get(AgentId::SalesManager);
        assert!(manager.instructions.contains("Current date: 2024-10-03"));
        assert!(!manager.instructions.contains("{{"));
    }

    #[test]
    fn test_entry_agent() {
        let registry = registry();
        assert_eq!(registry.entry().id, AgentId::SalesManager);

        let settings = AgentSettings {
            entry_agent: "Closer".to_string(),
            ..AgentSettings::default()
        };
        let registry = AgentRegistry::new(&settings, &Prompts::default(), today()).unwrap();
        assert_eq!(registry.entry_id(), AgentId::Closer);
    }

    #[test]
    fn test_unknown_entry_agent_is_config_error() {
        let settings = AgentSettings {
            entry_agent: "Nobody".to_string(),
            ..AgentSettings::default()
        };
        let err = AgentRegistry::new(&settings, &Prompts::default(), today()).unwrap_err();
        assert!(matches!(err, HuddleError::Config(_)));
    }
}
