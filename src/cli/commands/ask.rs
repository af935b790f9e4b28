//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{ConsoleSink, Output};
use crate::config::{Credentials, Settings};
use crate::team::Team;
use anyhow::Result;

/// Send one message to a fresh session and print the events it produces.
pub async fn run_ask(message: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat) {
        Output::error(&format!("{}", e));
        Output::info("Run 'huddle doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let credentials = Credentials::from_env()?;
    let team = Team::from_settings(&settings, &credentials)?;
    let mut relay = team.session();

    let mut sink = ConsoleSink::with_spinner(Output::spinner("Asking the team..."));
    relay.handle_message(message, &mut sink).await;
    sink.finish();
    println!();

    Ok(())
}
