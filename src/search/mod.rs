//! Web search abstraction for Huddle.
//!
//! Provides a trait-based interface over the external search provider and the
//! helpers that turn a raw result list into something an agent can read.

mod tavily;

pub use tavily::TavilyClient;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Coarse recency window for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl TimePeriod {
    /// Parse a period, falling back to `Day` for anything unrecognised.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            warn!("Unknown time period '{}', searching the last day", value);
            TimePeriod::Day
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Day => "day",
            TimePeriod::Week => "week",
            TimePeriod::Month => "month",
            TimePeriod::Year => "year",
        }
    }

    /// Phrase appended to a query so results are anchored to `today`.
    pub fn phrase(&self, today: NaiveDate) -> String {
        let date = today.format("%Y-%m-%d");
        match self {
            TimePeriod::Day => format!("in the last 24 hours (current date: {})", date),
            TimePeriod::Week => format!("in the last week (current date: {})", date),
            TimePeriod::Month => format!("in the last month (current date: {})", date),
            TimePeriod::Year => format!("in the year {}", today.year()),
        }
    }
}

impl std::str::FromStr for TimePeriod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(TimePeriod::Day),
            "week" => Ok(TimePeriod::Week),
            "month" => Ok(TimePeriod::Month),
            "year" => Ok(TimePeriod::Year),
            _ => Err(format!("Unknown time period: {}", s)),
        }
    }
}

impl std::fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query sent to the provider: the user query plus a dated time phrase.
pub fn augment_query(query: &str, period: TimePeriod, today: NaiveDate) -> String {
    format!("{} {}", query.trim(), period.phrase(today))
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: Option<f32>,
}

/// Trait for web search providers.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Search the web within a recency window.
    async fn search(&self, query: &str, period: TimePeriod) -> Result<Vec<SearchHit>>;
}

/// Maximum snippet length shown per result in a digest.
const SNIPPET_CHARS: usize = 200;

/// Human-readable digest of the first `limit` results.
pub fn summarize_results(query: &str, results: &[SearchHit], limit: usize) -> String {
    let mut summary = format!("Here's what I found about {}:", query.trim());

    for hit in results.iter().take(limit) {
        summary.push_str(&format!("\n- {} ({})", hit.title.trim(), hit.url));
        let snippet = snippet(&hit.content);
        if !snippet.is_empty() {
            summary.push_str(&format!(": {}", snippet));
        }
    }

    summary
}

fn snippet(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SNIPPET_CHARS {
        flat
    } else {
        format!("{}...", flat.chars().take(SNIPPET_CHARS).collect::<String>())
    }
}
