//! Orchestration client for Huddle.
//!
//! Sends one agent's view of a conversation to the completion provider and
//! returns the reply as conversation messages.

use crate::agent::{tool_definitions, AgentDescriptor, ToolName};
use crate::conversation::{is_placeholder, FunctionCall, Message, Role};
use crate::error::{HuddleError, Result};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionToolType, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Reply from one provider call.
///
/// At most one message carries a function call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub messages: Vec<Message>,
}

impl Response {
    /// Reply consisting of a single message.
    pub fn single(message: Message) -> Self {
        Self {
            messages: vec![message],
        }
    }

    /// The function call carried by this reply, if any.
    pub fn function_call(&self) -> Option<&FunctionCall> {
        self.messages.iter().find_map(|m| m.function_call.as_ref())
    }
}

/// Trait for completion providers that can run an agent over a history.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Run `agent` over `history`, which must not be empty.
    async fn run(&self, agent: &AgentDescriptor, history: &[Message]) -> Result<Response>;
}

/// OpenAI chat-completions orchestrator.
pub struct OpenAIOrchestrator {
    client: async_openai::Client<OpenAIConfig>,
    legacy: LegacyCallParser,
}

impl OpenAIOrchestrator {
    /// Create an orchestrator from an explicit client handle.
    pub fn new(client: async_openai::Client<OpenAIConfig>) -> Self {
        Self {
            client,
            legacy: LegacyCallParser::new(),
        }
    }

    /// Create an orchestrator for the given API key.
    pub fn from_api_key(api_key: &str) -> Result<Self> {
        Ok(Self::new(create_client(api_key)?))
    }
}

#[async_trait]
impl Orchestrator for OpenAIOrchestrator {
    #[instrument(skip(self, agent, history), fields(agent = %agent.name, messages = history.len()))]
    async fn run(&self, agent: &AgentDescriptor, history: &[Message]) -> Result<Response> {
        if history.is_empty() {
            return Err(HuddleError::InvalidInput(
                "Conversation history is empty".to_string(),
            ));
        }

        let messages = to_request_messages(agent, history)?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&agent.model).messages(messages);
        if !agent.tools.is_empty() {
            builder
                .tools(tool_definitions(&agent.tools))
                .parallel_tool_calls(false);
        }
        let request = builder
            .build()
            .map_err(|e| HuddleError::Agent(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| HuddleError::OpenAI(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| HuddleError::Agent("No response from model".to_string()))?;

        let mut content = choice.message.content;
        let mut function_call = None;

        if let Some(tool_calls) = choice.message.tool_calls {
            if tool_calls.len() > 1 {
                warn!(
                    "{} returned {} tool calls, keeping the first",
                    agent.name,
                    tool_calls.len()
                );
            }
            function_call = tool_calls.into_iter().next().map(|call| FunctionCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            });
        }

        if function_call.is_none() {
            if let Some(call) = content.as_deref().and_then(|c| self.legacy.parse(c)) {
                debug!("Recovered {} call from message text", call.name);
                function_call = Some(call);
                content = None;
            }
        }

        let mut message = Message::assistant(agent.name.clone(), content);
        if let Some(call) = function_call {
            message = message.with_function_call(call);
        }

        Ok(Response::single(message))
    }
}

/// Convert the agent's instructions and the history into request messages.
pub fn to_request_messages(
    agent: &AgentDescriptor,
    history: &[Message],
) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(history.len() + 1);

    messages.push(
        ChatCompletionRequestSystemMessageArgs::default()
            .content(agent.instructions.clone())
            .build()
            .map_err(|e| HuddleError::Agent(e.to_string()))?
            .into(),
    );

    for message in history {
        let text = message.content.clone().unwrap_or_default();
        match message.role {
            Role::User => messages.push(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(text)
                    .build()
                    .map_err(|e| HuddleError::Agent(e.to_string()))?
                    .into(),
            ),
            Role::System => messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(text)
                    .build()
                    .map_err(|e| HuddleError::Agent(e.to_string()))?
                    .into(),
            ),
            Role::Assistant => {
                let has_text = !is_placeholder(&text);
                if !has_text && message.function_call.is_none() {
                    continue;
                }

                let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                if has_text {
                    builder.content(text);
                }
                if let Some(call) = &message.function_call {
                    builder.tool_calls(vec![ChatCompletionMessageToolCall {
                        id: call.id.clone(),
                        r#type: ChatCompletionToolType::Function,
                        function: async_openai::types::FunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    }]);
                }
                messages.push(
                    builder
                        .build()
                        .map_err(|e| HuddleError::Agent(e.to_string()))?
                        .into(),
                );
            }
            Role::Function => {
                let Some(call_id) = &message.call_id else {
                    warn!("Dropping function result without a call id");
                    continue;
                };
                messages.push(
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(call_id.clone())
                        .content(text)
                        .build()
                        .map_err(|e| HuddleError::Agent(e.to_string()))?
                        .into(),
                );
            }
        }
    }

    Ok(messages)
}

/// Recovers function calls that a model wrote into its text reply as JSON.
///
/// Accepts `{"name": ..., "arguments": {...}}`, optionally nested under
/// `"function_call"` and optionally inside a fenced code block. Only known
/// tool names with object arguments are accepted.
pub struct LegacyCallParser {
    fenced: Regex,
}

impl LegacyCallParser {
    pub fn new() -> Self {
        let fenced = Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("Invalid regex");
        Self { fenced }
    }

    /// Parse a function call out of message text.
    pub fn parse(&self, text: &str) -> Option<FunctionCall> {
        let candidate = match self.fenced.captures(text) {
            Some(caps) => caps.get(1)?.as_str(),
            None => text.trim(),
        };
        if !candidate.starts_with('{') {
            return None;
        }

        let value: serde_json::Value = match serde_json::from_str(candidate) {
            Ok(v) => v,
            Err(e) => {
                debug!("Message text is not a JSON function call: {}", e);
                return None;
            }
        };
        let call = value.get("function_call").unwrap_or(&value);

        let name = call.get("name")?.as_str()?;
        if name.parse::<ToolName>().is_err() {
            warn!("Ignoring JSON call to unknown tool '{}' in message text", name);
            return None;
        }

        let arguments = match call.get("arguments") {
            Some(serde_json::Value::Object(map)) => serde_json::Value::Object(map.clone()).to_string(),
            Some(serde_json::Value::String(encoded)) => {
                match serde_json::from_str::<serde_json::Value>(encoded) {
                    Ok(serde_json::Value::Object(_)) => encoded.clone(),
                    _ => {
                        warn!("Ignoring {} call with malformed arguments in message text", name);
                        return None;
                    }
                }
            }
            _ => {
                warn!("Ignoring {} call without arguments in message text", name);
                return None;
            }
        };

        Some(FunctionCall {
            id: format!("call_{}", Uuid::new_v4().simple()),
            name: name.to_string(),
            arguments,
        })
    }
}

impl Default for LegacyCallParser {
    fn default() -> Self {
        Self::new()
    }
}
