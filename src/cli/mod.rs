//! CLI module for Huddle.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{ConsoleSink, Output};

use clap::{Parser, Subcommand};

/// Huddle - a multi-agent sales team
///
/// Routes each message through a sales manager who delegates to specialists
/// (lead qualifier, objection handler, closer, researcher).
#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat with the sales team
    Chat,

    /// Send a single message and print the team's response
    Ask {
        /// The message to send
        message: String,
    },

    /// Start the HTTP chat endpoint
    Serve {
        /// Host to bind to (default from config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (default from config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the web search tool directly
    Search {
        /// Search query
        query: String,

        /// Recency window (day, week, month, year)
        #[arg(short = 't', long, default_value = "day")]
        period: String,

        /// Maximum number of results to show
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// List the agents on the team
    Agents,

    /// Check credentials and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
