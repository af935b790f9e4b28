//! Scripted provider fakes shared by unit tests.

use crate::agent::{AgentDescriptor, AgentId, AgentRegistry};
use crate::config::{AgentSettings, Prompts, RelaySettings};
use crate::conversation::{FunctionCall, Message};
use crate::error::Result;
use crate::orchestrator::{Orchestrator, Response};
use crate::search::{SearchHit, TimePeriod, WebSearch};
use crate::team::Team;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Orchestrator that replays scripted replies and records each call.
pub struct ScriptedOrchestrator {
    replies: Mutex<VecDeque<Result<Response>>>,
    calls: Mutex<Vec<(AgentId, usize)>>,
}

impl ScriptedOrchestrator {
    pub fn new(replies: Vec<Result<Response>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn agents_called(&self) -> Vec<AgentId> {
        self.calls.lock().unwrap().iter().map(|(id, _)| *id).collect()
    }

    pub fn history_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(|(_, n)| *n).collect()
    }
}

#[async_trait]
impl Orchestrator for ScriptedOrchestrator {
    async fn run(&self, agent: &AgentDescriptor, history: &[Message]) -> Result<Response> {
        assert!(!history.is_empty());
        self.calls.lock().unwrap().push((agent.id, history.len()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("No scripted reply left for {}", agent.name))
    }
}

/// Search provider returning a fixed result list.
pub struct StaticSearch {
    pub hits: Vec<SearchHit>,
}

#[async_trait]
impl WebSearch for StaticSearch {
    async fn search(&self, _query: &str, _period: TimePeriod) -> Result<Vec<SearchHit>> {
        Ok(self.hits.clone())
    }
}

/// Registry with default agents, dated 2024-10-03.
pub fn registry() -> AgentRegistry {
    AgentRegistry::new(
        &AgentSettings::default(),
        &Prompts::default(),
        chrono::NaiveDate::from_ymd_opt(2024, 10, 3).unwrap(),
    )
    .unwrap()
}

/// Team backed by scripted replies and a fixed search result list.
pub fn team(
    replies: Vec<Result<Response>>,
    hits: Vec<SearchHit>,
    settings: RelaySettings,
) -> (Team, Arc<ScriptedOrchestrator>) {
    let orchestrator = ScriptedOrchestrator::new(replies);
    let team = Team::new(
        registry(),
        orchestrator.clone(),
        Arc::new(StaticSearch { hits }),
        settings,
    );
    (team, orchestrator)
}

/// Plain text reply from `agent`.
pub fn text(agent: &str, content: &str) -> Result<Response> {
    Ok(Response::single(Message::assistant(
        agent,
        Some(content.to_string()),
    )))
}

/// Function-call reply from `agent`.
pub fn call(agent: &str, name: &str, arguments: &str) -> Result<Response> {
    Ok(Response::single(Message::assistant(agent, None).with_function_call(
        FunctionCall {
            id: format!("call_{}", name),
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
    )))
}
