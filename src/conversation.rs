//! Conversation messages and per-session history.

use serde::{Deserialize, Serialize};

/// Speaker role of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
    /// Result of a tool function, answering an earlier function call.
    Function,
}

/// A structured request from the model to run a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Provider-assigned call id, echoed back by the matching result.
    pub id: String,
    pub name: String,
    /// JSON-encoded argument object, as sent by the provider.
    pub arguments: String,
}

/// One turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    /// Agent name for assistant messages, tool name for function results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    /// Id of the function call a function result answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
}

impl Message {
    fn new(role: Role) -> Self {
        Self {
            role,
            name: None,
            content: None,
            function_call: None,
            call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::new(Role::User)
        }
    }

    /// Assistant message spoken by the named agent.
    pub fn assistant(agent_name: impl Into<String>, content: Option<String>) -> Self {
        Self {
            name: Some(agent_name.into()),
            content,
            ..Self::new(Role::Assistant)
        }
    }

    /// Result of running a tool, answering the call with `call_id`.
    pub fn function_result(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(tool_name.into()),
            content: Some(content.into()),
            call_id: Some(call_id.into()),
            ..Self::new(Role::Function)
        }
    }

    /// Attach a function-call payload.
    pub fn with_function_call(mut self, call: FunctionCall) -> Self {
        self.function_call = Some(call);
        self
    }

    /// Text content, if any and not a provider placeholder.
    pub fn visible_text(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !is_placeholder(c))
    }
}

/// Whether content is empty or the literal "None" some providers send for
/// absent text.
pub fn is_placeholder(content: &str) -> bool {
    let trimmed = content.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none")
}

/// Ordered, append-only message history for one session.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The most recent messages to send to a provider.
    ///
    /// With `None` the whole history is returned. A window that would start on
    /// a function result is widened back to include the call it answers, and
    /// a non-empty history always yields at least one message.
    pub fn window(&self, size: Option<usize>) -> &[Message] {
        let Some(size) = size else {
            return &self.messages;
        };

        let mut start = self.messages.len().saturating_sub(size.max(1));
        while start > 0 && self.messages[start].role == Role::Function {
            start -= 1;
        }
        &self.messages[start..]
    }
}
