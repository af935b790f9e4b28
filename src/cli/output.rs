//! CLI output formatting utilities.

use crate::relay::{EventRole, EventSink, RelayEvent};
use crate::search::SearchHit;
use async_trait::async_trait;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a relay event.
    pub fn event(event: &RelayEvent) {
        match event.role {
            EventRole::System => {
                println!("\n{} {}", style("[System]").yellow().bold(), event.content);
            }
            EventRole::Assistant => {
                let name = event.name.as_deref().unwrap_or("Assistant");
                println!(
                    "\n{} {}",
                    style(format!("{}:", name)).blue().bold(),
                    event.content
                );
            }
        }
    }

    /// Print a search result.
    pub fn search_hit(hit: &SearchHit) {
        let score = hit
            .score
            .map(|s| format!(" (score: {:.2})", s))
            .unwrap_or_default();
        println!("\n{} {}{}", style(">>").green(), style(&hit.title).bold(), score);
        println!("   {}", content_preview(&hit.content, 200));
        println!("   {}", style(&hit.url).dim());
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Event sink that prints each event to the terminal as it arrives.
///
/// An attached spinner is cleared before the first event is printed.
pub struct ConsoleSink {
    spinner: Option<ProgressBar>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self { spinner: None }
    }

    pub fn with_spinner(spinner: ProgressBar) -> Self {
        Self {
            spinner: Some(spinner),
        }
    }

    /// Clear the spinner if it is still showing.
    pub fn finish(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for ConsoleSink {
    async fn emit(&mut self, event: RelayEvent) {
        self.finish();
        Output::event(&event);
    }
}

/// Truncate content with ellipsis, on a character boundary.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        format!("{}...", content.chars().take(max_chars).collect::<String>())
    }
}
