//! Agents command - list the roster.

use crate::agent::AgentRegistry;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use console::style;

/// Print every agent with its model and tools.
pub fn run_agents(settings: &Settings) -> Result<()> {
    let registry = AgentRegistry::from_settings(settings)?;

    Output::header("Sales Team");
    println!();

    for agent in registry.iter() {
        let marker = if agent.id == registry.entry_id() {
            style(" (entry)").green().to_string()
        } else {
            String::new()
        };
        println!("{}{}", style(&agent.name).bold(), marker);
        Output::kv("Model", &agent.model);

        let tools = if agent.tools.is_empty() {
            "none".to_string()
        } else {
            agent
                .tools
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        Output::kv("Tools", &tools);
        println!();
    }

    Ok(())
}
