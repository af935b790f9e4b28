//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{self, Settings};
use crate::search::{augment_query, TavilyClient, TimePeriod, WebSearch};
use anyhow::Result;

/// Run the web search tool directly and print the raw hits.
pub async fn run_search(query: &str, period: &str, limit: usize, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search) {
        Output::error(&format!("{}", e));
        Output::info("Run 'huddle doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let api_key = config::require(config::TAVILY_API_KEY)?;
    let client = TavilyClient::new(&api_key, &settings.search)?;

    let period = TimePeriod::parse_lenient(period);
    let augmented = augment_query(query, period, chrono::Local::now().date_naive());
    Output::kv("Query", &augmented);

    let spinner = Output::spinner("Searching the web...");
    let results = client.search(&augmented, period).await;
    spinner.finish_and_clear();

    match results {
        Ok(hits) if hits.is_empty() => {
            Output::warning("No results found.");
        }
        Ok(hits) => {
            Output::success(&format!("Found {} results", hits.len()));
            for hit in hits.iter().take(limit) {
                Output::search_hit(hit);
            }
            println!();
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
