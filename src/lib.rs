//! Huddle - a multi-agent sales team
//!
//! A small set of sales personas share one conversation. A sales manager
//! receives every message and either answers, researches the web, or hands
//! the conversation to a specialist.
//!
//! # Overview
//!
//! Huddle allows you to:
//! - Chat with the team from the terminal
//! - Serve the team over HTTP, as JSON or server-sent events
//! - Run the web search tool on its own
//!
//! # Architecture
//!
//! - `config` - Settings, credentials and agent prompts
//! - `agent` - Agent registry and tool functions
//! - `search` - Web search provider (Tavily)
//! - `orchestrator` - One completion call for one agent
//! - `conversation` - Messages and session history
//! - `relay` - The per-message loop that switches agents and runs tools
//! - `team` - Shared handles that sessions are built from
//!
//! # Example
//!
//! ```rust,no_run
//! use huddle::config::{Credentials, Settings};
//! use huddle::team::Team;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let team = Team::from_settings(&settings, &Credentials::from_env()?)?;
//!
//!     let mut relay = team.session();
//!     for event in relay.respond("I want to buy your product").await {
//!         println!("{:?}: {}", event.name, event.content);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod relay;
pub mod search;
pub mod team;

#[cfg(test)]
mod testing;

pub use error::{HuddleError, Result};
