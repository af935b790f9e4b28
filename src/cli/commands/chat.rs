//! Interactive chat with the sales team.

use crate::cli::preflight::{self, Operation};
use crate::cli::{ConsoleSink, Output};
use crate::config::{Credentials, Settings};
use crate::team::Team;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Chat) {
        Output::error(&format!("{}", e));
        Output::info("Run 'huddle doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let credentials = Credentials::from_env()?;
    let team = Team::from_settings(&settings, &credentials)?;
    let mut relay = team.session();

    println!("\n{}", style("Huddle").bold().cyan());
    println!(
        "{}",
        style("Type your message, or 'exit' to quit. Use 'clear' to start over.").dim()
    );
    println!(
        "{}\n",
        style(format!("You are talking to the {}.", relay.active_agent().name)).dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF
            println!();
            break;
        }

        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            relay.reset();
            Output::info(&format!(
                "Conversation cleared. Back with the {}.",
                relay.active_agent().name
            ));
            continue;
        }

        let mut sink = ConsoleSink::with_spinner(Output::spinner("Thinking..."));
        relay.handle_message(input, &mut sink).await;
        sink.finish();
        println!();
    }

    Ok(())
}
