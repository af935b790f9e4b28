//! Tavily web search implementation.

use super::{SearchHit, TimePeriod, WebSearch};
use crate::config::SearchSettings;
use crate::error::{HuddleError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Tavily-based web search client.
pub struct TavilyClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
    search_depth: String,
    max_results: u32,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    time_range: &'a str,
    max_results: u32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

impl TavilyClient {
    /// Create a client from the search settings.
    pub fn new(api_key: &str, settings: &SearchSettings) -> Result<Self> {
        let base = Url::parse(&format!("{}/", settings.api_base.trim_end_matches('/')))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            endpoint: base.join("search")?,
            api_key: api_key.to_string(),
            search_depth: settings.search_depth.clone(),
            max_results: settings.max_results,
        })
    }

    /// The URL searches are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl WebSearch for TavilyClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, period: TimePeriod) -> Result<Vec<SearchHit>> {
        let request = SearchRequest {
            query,
            search_depth: &self.search_depth,
            time_range: period.as_str(),
            max_results: self.max_results,
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HuddleError::Search(format!("{}: {}", status, body.trim())));
        }

        let parsed: SearchResponse = response.json().await?;
        debug!("Search returned {} results", parsed.results.len());
        Ok(parsed.results)
    }
}
