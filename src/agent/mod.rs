//! The sales team: agent roster and the tools agents may call.
//!
//! Agents are fixed personas (model, instructions, allowed tools) resolved by
//! name through an [`AgentRegistry`]. Tools are parsed from the provider's
//! structured function calls into a typed [`ToolCall`].

mod registry;
mod tools;

pub use registry::{AgentDescriptor, AgentId, AgentRegistry};
pub use tools::{parse_tool_call, tool_definitions, ToolCall, ToolContext, ToolName};
