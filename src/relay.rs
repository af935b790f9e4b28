//! The relay loop.
//!
//! Turns one user message into a sequence of provider calls, agent switches
//! and tool invocations, emitting events as they happen and always ending the
//! turn back in [`RelayState::AwaitingInput`].

use crate::agent::{parse_tool_call, AgentDescriptor, AgentId, ToolCall, ToolContext};
use crate::config::RelaySettings;
use crate::conversation::{ConversationHistory, FunctionCall, Message, Role};
use crate::error::{HuddleError, Result};
use crate::orchestrator::Orchestrator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Who an output event is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventRole {
    System,
    Assistant,
}

/// One output event of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEvent {
    pub role: EventRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: String,
}

impl RelayEvent {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: EventRole::System,
            name: None,
            content: content.into(),
        }
    }

    pub fn assistant(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: EventRole::Assistant,
            name: Some(name.into()),
            content: content.into(),
        }
    }
}

/// Destination for relay events.
#[async_trait]
pub trait EventSink: Send {
    async fn emit(&mut self, event: RelayEvent);
}

#[async_trait]
impl EventSink for Vec<RelayEvent> {
    async fn emit(&mut self, event: RelayEvent) {
        self.push(event);
    }
}

#[async_trait]
impl EventSink for mpsc::Sender<RelayEvent> {
    async fn emit(&mut self, event: RelayEvent) {
        // A dropped receiver means the client went away; the turn still finishes.
        if self.send(event).await.is_err() {
            debug!("Event receiver closed, discarding event");
        }
    }
}

/// Where the relay is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    AwaitingInput,
    Dispatching(AgentId),
}

enum Step {
    Continue,
    Done,
}

/// One conversation session: active agent plus its history.
pub struct RelayLoop {
    orchestrator: Arc<dyn Orchestrator>,
    tools: Arc<ToolContext>,
    settings: RelaySettings,
    active: AgentId,
    history: ConversationHistory,
    state: RelayState,
}

impl RelayLoop {
    /// Start a session with the registry's entry agent.
    pub fn new(
        orchestrator: Arc<dyn Orchestrator>,
        tools: Arc<ToolContext>,
        settings: RelaySettings,
    ) -> Self {
        let active = tools.registry.entry_id();
        Self {
            orchestrator,
            tools,
            settings,
            active,
            history: ConversationHistory::new(),
            state: RelayState::AwaitingInput,
        }
    }

    pub fn active_agent(&self) -> &AgentDescriptor {
        self.tools.registry.get(self.active)
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Drop the history and return to the entry agent.
    pub fn reset(&mut self) {
        self.history = ConversationHistory::new();
        self.active = self.tools.registry.entry_id();
        self.state = RelayState::AwaitingInput;
    }

    /// Make the named agent active.
    ///
    /// An unknown name leaves the active agent unchanged.
    pub fn transfer(&mut self, agent_name: &str) -> Result<RelayEvent> {
        let agent = self
            .tools
            .transfer_to_agent(agent_name)
            .ok_or_else(|| HuddleError::UnknownAgent(agent_name.to_string()))?;

        info!("Transferring to {}", agent.name);
        let event = RelayEvent::system(format!("Transferring to {}...", agent.name));
        self.active = agent.id;
        Ok(event)
    }

    /// Handle one user message and collect the events it produces.
    pub async fn respond(&mut self, input: &str) -> Vec<RelayEvent> {
        let mut events = Vec::new();
        self.handle_message(input, &mut events).await;
        events
    }

    /// Handle one user message, emitting events to `sink` as they are produced.
    pub async fn handle_message<S>(&mut self, input: &str, sink: &mut S)
    where
        S: EventSink + ?Sized,
    {
        let input = input.trim();
        if input.is_empty() {
            sink.emit(RelayEvent::system("Please enter a message.")).await;
            return;
        }

        self.history.push(Message::user(input));
        let mut hops = 0;

        for _ in 0..self.settings.max_dispatches {
            match self.dispatch(sink, &mut hops).await {
                Step::Continue => continue,
                Step::Done => {
                    self.state = RelayState::AwaitingInput;
                    return;
                }
            }
        }

        warn!(
            "Turn stopped after {} agent calls",
            self.settings.max_dispatches
        );
        sink.emit(RelayEvent::system(format!(
            "Stopped after {} agent calls for this message.",
            self.settings.max_dispatches
        )))
        .await;
        self.state = RelayState::AwaitingInput;
    }

    /// One provider call for the active agent.
    async fn dispatch<S>(&mut self, sink: &mut S, hops: &mut usize) -> Step
    where
        S: EventSink + ?Sized,
    {
        let tools = Arc::clone(&self.tools);
        let agent = tools.registry.get(self.active);
        self.state = RelayState::Dispatching(agent.id);
        debug!("Dispatching to {} ({} messages)", agent.name, self.history.len());

        let window = self.history.window(self.settings.history_window);
        let response = match self.orchestrator.run(agent, window).await {
            Ok(response) => response,
            Err(e) => {
                warn!("{} failed: {}", agent.name, e);
                sink.emit(RelayEvent::system(format!("Error: {}", e))).await;
                return Step::Done;
            }
        };

        let mut pending: Option<FunctionCall> = None;

        for mut message in response.messages {
            if message.role != Role::Assistant {
                debug!("Ignoring {:?} message in provider reply", message.role);
                continue;
            }
            if message.function_call.is_some() && pending.is_some() {
                warn!("{} sent more than one function call, ignoring extras", agent.name);
                message.function_call = None;
            }

            let text = message.visible_text().map(str::to_string);
            if text.is_none() && message.function_call.is_none() {
                continue;
            }
            if text.is_none() {
                message.content = None;
            }
            message.name = Some(agent.name.clone());
            if let Some(call) = &message.function_call {
                pending = Some(call.clone());
            }

            self.history.push(message);
            if let Some(text) = text {
                sink.emit(RelayEvent::assistant(agent.name.clone(), text)).await;
            }
        }

        match pending {
            Some(call) => self.invoke(agent, call, sink, hops).await,
            None => Step::Done,
        }
    }

    /// Run the function call an agent asked for.
    async fn invoke<S>(
        &mut self,
        agent: &AgentDescriptor,
        call: FunctionCall,
        sink: &mut S,
        hops: &mut usize,
    ) -> Step
    where
        S: EventSink + ?Sized,
    {
        let tool = match parse_tool_call(&call.name, &call.arguments) {
            Ok(tool) => tool,
            Err(e) => {
                warn!("Ignoring malformed {} call from {}: {}", call.name, agent.name, e);
                self.answer(&call, format!("Error: {}", e));
                return Step::Done;
            }
        };

        if !agent.allows(tool.tool_name()) {
            warn!("{} is not allowed to call {}", agent.name, call.name);
            self.answer(&call, format!("Error: {} is not available to {}", call.name, agent.name));
            sink.emit(RelayEvent::system(format!(
                "{} tried to use {}, which is not available to it.",
                agent.name, call.name
            )))
            .await;
            return Step::Done;
        }

        match tool {
            ToolCall::TransferToAgent { agent_name } => {
                if self.tools.transfer_to_agent(&agent_name).is_none() {
                    warn!("{} asked to transfer to unknown agent '{}'", agent.name, agent_name);
                    self.answer(&call, format!("Error: unknown agent {}", agent_name));
                    sink.emit(RelayEvent::system(
                        HuddleError::UnknownAgent(agent_name).to_string(),
                    ))
                    .await;
                    return Step::Done;
                }

                if *hops >= self.settings.max_delegation_hops {
                    info!("Delegation limit reached, declining transfer to {}", agent_name);
                    self.answer(
                        &call,
                        format!("Transfer to {} declined: delegation limit reached", agent_name),
                    );
                    sink.emit(RelayEvent::system(format!(
                        "Delegation limit reached; {} will continue.",
                        agent.name
                    )))
                    .await;
                    return Step::Done;
                }

                match self.transfer(&agent_name) {
                    Ok(event) => {
                        self.answer(&call, format!("Transferred to {}", agent_name));
                        sink.emit(event).await;
                        *hops += 1;
                        Step::Continue
                    }
                    Err(e) => {
                        self.answer(&call, format!("Error: {}", e));
                        sink.emit(RelayEvent::system(e.to_string())).await;
                        Step::Done
                    }
                }
            }
            ToolCall::WebSearch { query, time_period } => {
                let digest = self.tools.web_search(&query, time_period).await;
                self.answer(&call, digest.clone());
                sink.emit(RelayEvent::system(digest)).await;

                // Results always go back to the coordinator
                self.active = self.tools.registry.entry_id();
                Step::Continue
            }
        }
    }

    /// Record the result of a function call in the history.
    fn answer(&mut self, call: &FunctionCall, result: String) {
        self.history
            .push(Message::function_result(call.id.clone(), call.name.clone(), result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Response;
    use crate::search::SearchHit;
    use crate::testing::{call, team, text, ScriptedOrchestrator};

    fn relay_with(
        replies: Vec<Result<Response>>,
        hits: Vec<SearchHit>,
        settings: RelaySettings,
    ) -> (RelayLoop, Arc<ScriptedOrchestrator>) {
        let (team, orchestrator) = team(replies, hits, settings);
        (team.session(), orchestrator)
    }

    fn relay(replies: Vec<Result<Response>>) -> (RelayLoop, Arc<ScriptedOrchestrator>) {
        relay_with(replies, Vec::new(), RelaySettings::default())
    }

    #[tokio::test]
    async fn test_transfer_to_closer() {
        let (mut relay, orchestrator) = relay(vec![
            call("Sales Manager", "transfer_to_agent", r#"{"agent_name": "Closer"}"#),
            text("Closer", "Wonderful! Let's get your order started."),
        ]);

        let events = relay.respond("I want to buy your product").await;

        assert_eq!(
            events,
            vec![
                RelayEvent::system("Transferring to Closer..."),
                RelayEvent::assistant("Closer", "Wonderful! Let's get your order started."),
            ]
        );
        assert_eq!(
            orchestrator.agents_called(),
            vec![AgentId::SalesManager, AgentId::Closer]
        );
        assert_eq!(relay.state(), RelayState::AwaitingInput);
        assert_eq!(relay.active_agent().id, AgentId::Closer);

        // The call is answered before the delegated agent runs
        let roles: Vec<_> = relay.history().messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::Function, Role::Assistant]
        );
    }

    #[tokio::test]
    async fn test_text_before_trailing_call() {
        let reply = Message::assistant("Sales Manager", Some("Let me get our closer.".to_string()))
            .with_function_call(FunctionCall {
                id: "call_1".to_string(),
                name: "transfer_to_agent".to_string(),
                arguments: r#"{"agent_name": "Closer"}"#.to_string(),
            });
        let (mut relay, _) = relay(vec![
            Ok(Response::single(reply)),
            text("Closer", "Ready when you are."),
        ]);

        let events = relay.respond("I want to buy").await;

        assert_eq!(
            events,
            vec![
                RelayEvent::assistant("Sales Manager", "Let me get our closer."),
                RelayEvent::system("Transferring to Closer..."),
                RelayEvent::assistant("Closer", "Ready when you are."),
            ]
        );
    }

    #[tokio::test]
    async fn test_placeholder_content_is_suppressed() {
        let (mut relay, _) = relay(vec![text("Sales Manager", " None ")]);

        let events = relay.respond("hello").await;

        assert!(events.is_empty());
        assert_eq!(relay.history().len(), 1);
        assert_eq!(relay.state(), RelayState::AwaitingInput);
    }

    #[tokio::test]
    async fn test_unknown_agent_keeps_active_agent() {
        let (mut relay, orchestrator) = relay(vec![call(
            "Sales Manager",
            "transfer_to_agent",
            r#"{"agent_name": "Janitor"}"#,
        )]);

        let events = relay.respond("Who cleans the office?").await;

        assert_eq!(events, vec![RelayEvent::system("Unknown agent: Janitor")]);
        assert_eq!(relay.active_agent().id, AgentId::SalesManager);
        assert_eq!(orchestrator.agents_called(), vec![AgentId::SalesManager]);
        assert_eq!(
            relay.history().last().map(|m| m.role),
            Some(Role::Function)
        );
    }

    #[tokio::test]
    async fn test_web_search_returns_to_entry_agent() {
        let (mut relay, orchestrator) = relay(vec![
            call(
                "Sales Manager",
                "web_search",
                r#"{"query": "quarterly sales trends", "time_period": "month"}"#,
            ),
            text("Sales Manager", "I couldn't find anything recent."),
        ]);

        let events = relay.respond("What are the quarterly sales trends?").await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].role, EventRole::System);
        assert!(events[0]
            .content
            .starts_with("Here's what I found about quarterly sales trends:"));
        assert!(!events[0].content.contains("\n- "));
        assert_eq!(
            events[1],
            RelayEvent::assistant("Sales Manager", "I couldn't find anything recent.")
        );
        assert_eq!(
            orchestrator.agents_called(),
            vec![AgentId::SalesManager, AgentId::SalesManager]
        );

        let result = relay
            .history()
            .messages()
            .iter()
            .find(|m| m.role == Role::Function)
            .unwrap();
        assert_eq!(result.call_id.as_deref(), Some("call_web_search"));
        assert_eq!(result.content.as_deref(), Some(events[0].content.as_str()));
    }

    #[tokio::test]
    async fn test_researcher_reports_back_to_manager() {
        let hits = (1..=5)
            .map(|n| SearchHit {
                title: format!("Competitor {}", n),
                url: format!("https://example.com/{}", n),
                content: String::new(),
                score: None,
            })
            .collect();
        let (mut relay, orchestrator) = relay_with(
            vec![
                call("Sales Manager", "transfer_to_agent", r#"{"agent_name": "Researcher"}"#),
                call("Researcher", "web_search", r#"{"query": "competitor pricing", "time_period": "week"}"#),
                text("Sales Manager", "Here is the competitive picture."),
            ],
            hits,
            RelaySettings::default(),
        );

        let events = relay.respond("How do competitors price?").await;

        assert_eq!(events.len(), 3);
        assert_eq!(events[0], RelayEvent::system("Transferring to Researcher..."));
        assert_eq!(events[1].content.lines().filter(|l| l.starts_with("- ")).count(), 3);
        assert_eq!(events[2].name.as_deref(), Some("Sales Manager"));
        assert_eq!(
            orchestrator.agents_called(),
            vec![AgentId::SalesManager, AgentId::Researcher, AgentId::SalesManager]
        );
        assert_eq!(relay.active_agent().id, AgentId::SalesManager);
    }

    #[tokio::test]
    async fn test_second_delegation_is_declined() {
        let (mut relay, orchestrator) = relay(vec![
            call("Sales Manager", "transfer_to_agent", r#"{"agent_name": "Researcher"}"#),
            call("Researcher", "web_search", r#"{"query": "lead background"}"#),
            call("Sales Manager", "transfer_to_agent", r#"{"agent_name": "Closer"}"#),
        ]);

        let events = relay.respond("Research this lead then close them").await;

        assert_eq!(
            events.last(),
            Some(&RelayEvent::system(
                "Delegation limit reached; Sales Manager will continue."
            ))
        );
        assert_eq!(orchestrator.agents_called().len(), 3);
        assert_eq!(relay.active_agent().id, AgentId::SalesManager);
        assert_eq!(relay.state(), RelayState::AwaitingInput);
    }

    #[tokio::test]
    async fn test_multi_hop_when_configured() {
        let settings = RelaySettings {
            max_delegation_hops: 2,
            ..RelaySettings::default()
        };
        let (mut relay, orchestrator) = relay_with(
            vec![
                call("Sales Manager", "transfer_to_agent", r#"{"agent_name": "Researcher"}"#),
                call("Researcher", "web_search", r#"{"query": "lead background"}"#),
                call("Sales Manager", "transfer_to_agent", r#"{"agent_name": "Closer"}"#),
                text("Closer", "Let's finalize."),
            ],
            Vec::new(),
            settings,
        );

        let events = relay.respond("Research this lead then close them").await;

        assert_eq!(events.last(), Some(&RelayEvent::assistant("Closer", "Let's finalize.")));
        assert_eq!(orchestrator.agents_called().len(), 4);
    }

    #[tokio::test]
    async fn test_tool_not_allowed_for_agent() {
        let (mut relay, _) = relay(vec![
            call("Sales Manager", "transfer_to_agent", r#"{"agent_name": "Closer"}"#),
            call("Closer", "web_search", r#"{"query": "discounts"}"#),
        ]);

        let events = relay.respond("Any discounts?").await;

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            RelayEvent::system("Closer tried to use web_search, which is not available to it.")
        );
        assert_eq!(relay.history().last().map(|m| m.role), Some(Role::Function));
    }

    #[tokio::test]
    async fn test_malformed_arguments_are_treated_as_no_call() {
        let reply = Message::assistant("Sales Manager", Some("Passing you along.".to_string()))
            .with_function_call(FunctionCall {
                id: "call_bad".to_string(),
                name: "transfer_to_agent".to_string(),
                arguments: "{agent_name: Closer".to_string(),
            });
        let (mut relay, orchestrator) = relay(vec![Ok(Response::single(reply))]);

        let events = relay.respond("I want to buy").await;

        assert_eq!(
            events,
            vec![RelayEvent::assistant("Sales Manager", "Passing you along.")]
        );
        assert_eq!(orchestrator.agents_called().len(), 1);
        assert_eq!(relay.active_agent().id, AgentId::SalesManager);
        assert_eq!(relay.history().last().and_then(|m| m.call_id.as_deref()), Some("call_bad"));
    }

    #[tokio::test]
    async fn test_provider_error_is_surfaced_and_loop_continues() {
        let (mut relay, _) = relay(vec![
            Err(HuddleError::OpenAI("connection reset".to_string())),
            text("Sales Manager", "Back online. How can I help?"),
        ]);

        let events = relay.respond("hello").await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].role, EventRole::System);
        assert!(events[0].content.starts_with("Error: "));
        assert!(events[0].content.contains("connection reset"));
        assert_eq!(relay.state(), RelayState::AwaitingInput);

        let events = relay.respond("hello again").await;
        assert_eq!(
            events,
            vec![RelayEvent::assistant("Sales Manager", "Back online. How can I help?")]
        );
    }

    #[tokio::test]
    async fn test_dispatch_budget_stops_search_loop() {
        let settings = RelaySettings {
            max_dispatches: 3,
            ..RelaySettings::default()
        };
        let replies = (0..3)
            .map(|_| call("Sales Manager", "web_search", r#"{"query": "more"}"#))
            .collect();
        let (mut relay, orchestrator) = relay_with(replies, Vec::new(), settings);

        let events = relay.respond("Keep searching").await;

        assert_eq!(orchestrator.agents_called().len(), 3);
        assert_eq!(
            events.last(),
            Some(&RelayEvent::system("Stopped after 3 agent calls for this message."))
        );
        assert_eq!(relay.state(), RelayState::AwaitingInput);
    }

    #[tokio::test]
    async fn test_transfer_is_idempotent() {
        let (mut relay, _) = relay(Vec::new());

        let first = relay.transfer("Closer").unwrap();
        let second = relay.transfer("Closer").unwrap();

        assert_eq!(first, second);
        assert_eq!(relay.active_agent().id, AgentId::Closer);

        assert!(matches!(
            relay.transfer("Intern"),
            Err(HuddleError::UnknownAgent(_))
        ));
        assert_eq!(relay.active_agent().id, AgentId::Closer);
    }

    #[tokio::test]
    async fn test_empty_input_does_not_dispatch() {
        let (mut relay, orchestrator) = relay(Vec::new());

        let events = relay.respond("   ").await;

        assert_eq!(events, vec![RelayEvent::system("Please enter a message.")]);
        assert!(orchestrator.agents_called().is_empty());
        assert!(relay.history().is_empty());
    }

    #[tokio::test]
    async fn test_history_window_limits_what_is_sent() {
        let settings = RelaySettings {
            history_window: Some(2),
            ..RelaySettings::default()
        };
        let (mut relay, orchestrator) = relay_with(
            vec![
                text("Sales Manager", "one"),
                text("Sales Manager", "two"),
                text("Sales Manager", "three"),
            ],
            Vec::new(),
            settings,
        );

        relay.respond("a").await;
        relay.respond("b").await;
        relay.respond("c").await;

        assert_eq!(orchestrator.history_sizes(), vec![1, 2, 2]);
        assert_eq!(relay.history().len(), 6);
    }

    #[tokio::test]
    async fn test_window_of_one_keeps_search_call_and_result() {
        let settings = RelaySettings {
            history_window: Some(1),
            ..RelaySettings::default()
        };
        let (mut relay, orchestrator) = relay_with(
            vec![
                call(
                    "Sales Manager",
                    "web_search",
                    r#"{"query": "crm trends", "time_period": "week"}"#,
                ),
                text("Sales Manager", "Here is what changed this week."),
            ],
            Vec::new(),
            settings,
        );

        let events = relay.respond("Any CRM news?").await;

        // The search result is sent together with the call that asked for it
        assert_eq!(orchestrator.history_sizes(), vec![1, 2]);
        assert_eq!(
            events.last(),
            Some(&RelayEvent::assistant(
                "Sales Manager",
                "Here is what changed this week."
            ))
        );
    }

    #[tokio::test]
    async fn test_reset_returns_to_entry_agent() {
        let (mut relay, _) = relay(vec![
            call("Sales Manager", "transfer_to_agent", r#"{"agent_name": "Closer"}"#),
            text("Closer", "Hi"),
        ]);
        relay.respond("buy").await;
        assert_eq!(relay.active_agent().id, AgentId::Closer);

        relay.reset();
        assert_eq!(relay.active_agent().id, AgentId::SalesManager);
        assert!(relay.history().is_empty());
    }

    #[tokio::test]
    async fn test_channel_sink_preserves_order() {
        let (mut relay, _) = relay(vec![
            call("Sales Manager", "transfer_to_agent", r#"{"agent_name": "Closer"}"#),
            text("Closer", "Let's close."),
        ]);

        let (mut tx, mut rx) = mpsc::channel(8);
        relay.handle_message("I want to buy", &mut tx).await;
        drop(tx);

        let mut received = Vec::new();
        while let Some(event) = rx.recv().await {
            received.push(event);
        }
        assert_eq!(
            received,
            vec![
                RelayEvent::system("Transferring to Closer..."),
                RelayEvent::assistant("Closer", "Let's close."),
            ]
        );
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(RelayEvent::system("Transferring to Closer...")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"role": "system", "content": "Transferring to Closer..."})
        );

        let json = serde_json::to_value(RelayEvent::assistant("Closer", "Hi")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"role": "assistant", "name": "Closer", "content": "Hi"})
        );
    }
}
