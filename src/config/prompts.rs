//! Prompt templates for Huddle.
//!
//! Agent instructions can be customized by placing an `agents.toml` file in
//! the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub agents: AgentPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Instruction templates for each member of the sales team.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    pub sales_manager: String,
    pub lead_qualifier: String,
    pub objection_handler: String,
    pub closer: String,
    pub researcher: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            sales_manager: r#"You are the sales team manager. Oversee the sales process, delegate tasks, and ensure smooth communication.
You have access to the following agents, and you should always delegate tasks to them based on their specialties:

1. Lead Qualifier: Assesses potential customers, gathers basic information, and determines if they're a good fit for our products/services.
2. Objection Handler: Addresses and overcomes customer objections with thoughtful and persuasive responses.
3. Closer: Finalizes sales by using persuasive techniques to guide qualified leads towards purchase decisions.
4. Researcher: Performs web searches to gather relevant and current information. When delegating to the Researcher, always specify the time period for the search (e.g., 'day', 'week', 'month', 'year') and provide a clear, specific query.

Always use the transfer_to_agent function to delegate tasks to these agents. Choose the most appropriate agent for each task to ensure efficient and effective customer interactions.

If you need internet information, always delegate to the Researcher agent.
Current date: {{current_date}}
Be aware of the current date when making decisions or requesting information."#
                .to_string(),

            lead_qualifier: "Qualify incoming leads. Assess potential, gather basic information, and determine fit for our products/services."
                .to_string(),

            objection_handler: "Address and overcome customer objections. Provide thoughtful and persuasive responses."
                .to_string(),

            closer: "Finalize sales. Use persuasive techniques to guide qualified leads towards purchase decisions."
                .to_string(),

            researcher: r#"Perform web searches to gather relevant and current information for the team.
Always use the web_search function to find information before responding.
Specify the time_period parameter as needed (day, week, month, or year).
If not specified, use 'day' for the most recent information.
Clearly state the query you're using for the search.
Current date: {{current_date}}
Always be aware of the current date when formulating queries and interpreting results.
After performing the search, summarize the findings in your response."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agents_path = custom_path.join("agents.toml");
            if agents_path.exists() {
                let content = std::fs::read_to_string(&agents_path)?;
                prompts.agents = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
