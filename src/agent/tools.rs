//! Tool definitions and implementations for the sales agents.

use super::registry::{AgentDescriptor, AgentId, AgentRegistry};
use crate::error::{HuddleError, Result};
use crate::search::{augment_query, summarize_results, TimePeriod, WebSearch};
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Names of the tools an agent may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    TransferToAgent,
    WebSearch,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::TransferToAgent => "transfer_to_agent",
            ToolName::WebSearch => "web_search",
        }
    }
}

impl std::str::FromStr for ToolName {
    type Err = HuddleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "transfer_to_agent" => Ok(ToolName::TransferToAgent),
            "web_search" => Ok(ToolName::WebSearch),
            _ => Err(HuddleError::Agent(format!("Unknown tool: {}", s))),
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    /// Search the web within a recency window.
    WebSearch { query: String, time_period: TimePeriod },

    /// Hand the conversation to another agent.
    TransferToAgent { agent_name: String },
}

impl ToolCall {
    pub fn tool_name(&self) -> ToolName {
        match self {
            ToolCall::WebSearch { .. } => ToolName::WebSearch,
            ToolCall::TransferToAgent { .. } => ToolName::TransferToAgent,
        }
    }
}

/// Parse a tool call from the provider's function-call format.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let tool: ToolName = name.parse()?;

    let args: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| HuddleError::Agent(format!("Invalid tool arguments: {}", e)))?;
    if !args.is_object() {
        return Err(HuddleError::Agent(
            "Tool arguments must be a JSON object".to_string(),
        ));
    }

    match tool {
        ToolName::WebSearch => {
            let query = args["query"]
                .as_str()
                .filter(|q| !q.trim().is_empty())
                .ok_or_else(|| HuddleError::Agent("Missing 'query' argument".to_string()))?
                .to_string();
            let time_period = args["time_period"]
                .as_str()
                .map(TimePeriod::parse_lenient)
                .unwrap_or_default();
            Ok(ToolCall::WebSearch { query, time_period })
        }
        ToolName::TransferToAgent => {
            let agent_name = args["agent_name"]
                .as_str()
                .ok_or_else(|| HuddleError::Agent("Missing 'agent_name' argument".to_string()))?
                .to_string();
            Ok(ToolCall::TransferToAgent { agent_name })
        }
    }
}

/// Function definitions for the given tools, in the provider's format.
pub fn tool_definitions(tools: &[ToolName]) -> Vec<ChatCompletionTool> {
    tools.iter().map(|tool| definition(*tool)).collect()
}

fn definition(tool: ToolName) -> ChatCompletionTool {
    let (description, parameters) = match tool {
        ToolName::TransferToAgent => {
            let names: Vec<&str> = AgentId::ALL.iter().map(|id| id.name()).collect();
            (
                "Transfer the conversation to another member of the sales team. \
                Use this to delegate a task to the agent best suited for it.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "agent_name": {
                            "type": "string",
                            "description": "Name of the agent to transfer to",
                            "enum": names
                        }
                    },
                    "required": ["agent_name"]
                }),
            )
        }
        ToolName::WebSearch => (
            "Search the web for current information about clients, market trends, \
            and competitors.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "A clear, specific search query"
                    },
                    "time_period": {
                        "type": "string",
                        "description": "How recent the results should be (default: day)",
                        "enum": ["day", "week", "month", "year"],
                        "default": "day"
                    }
                },
                "required": ["query"]
            }),
        ),
    };

    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: tool.as_str().to_string(),
            description: Some(description.to_string()),
            parameters: Some(parameters),
            strict: None,
        },
    }
}

/// Tool execution context with access to the registry and search provider.
pub struct ToolContext {
    pub registry: Arc<AgentRegistry>,
    pub search: Arc<dyn WebSearch>,
    pub summary_limit: usize,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(
        registry: Arc<AgentRegistry>,
        search: Arc<dyn WebSearch>,
        summary_limit: usize,
    ) -> Self {
        Self {
            registry,
            search,
            summary_limit,
        }
    }

    /// Run a web search and return a readable digest.
    ///
    /// Provider failures come back as an error payload string.
    pub async fn web_search(&self, query: &str, time_period: TimePeriod) -> String {
        let today = chrono::Local::now().date_naive();
        let dated_query = augment_query(query, time_period, today);
        info!("Performing web search: '{}' ({})", dated_query, time_period);

        match self.search.search(&dated_query, time_period).await {
            Ok(results) => summarize_results(query, &results, self.summary_limit),
            Err(e) => {
                warn!("Web search failed: {}", e);
                format!("Search error: {}", e)
            }
        }
    }

    /// Resolve a transfer target.
    pub fn transfer_to_agent(&self, agent_name: &str) -> Option<&AgentDescriptor> {
        self.registry.lookup(agent_name)
    }
}
