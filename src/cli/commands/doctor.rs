//! Doctor command - verify credentials and configuration.

use crate::agent::AgentRegistry;
use crate::cli::Output;
use crate::config::{self, Settings, OPENAI_API_KEY, TAVILY_API_KEY};
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Huddle Doctor");
    println!();
    println!("Checking credentials and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Keys").bold());
    for name in [OPENAI_API_KEY, TAVILY_API_KEY] {
        let check = check_credential(name, std::env::var(name).ok().as_deref());
        check.print();
        checks.push(check);
    }

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    let prompt_check = check_prompt_dir(settings.prompts.custom_dir.as_deref());
    prompt_check.print();
    checks.push(prompt_check);

    println!();

    println!("{}", style("Team").bold());
    let team_check = check_registry(settings);
    team_check.print();
    checks.push(team_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Huddle.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! The team is ready.");
    }

    Ok(())
}

/// Check that a credential is present, showing it masked.
fn check_credential(name: &str, value: Option<&str>) -> CheckResult {
    let hint = format!("Set with: export {}='...'", name);
    match value {
        Some(key) if key.trim().is_empty() => CheckResult::error(name, "empty", &hint),
        Some(key) => CheckResult::ok(name, &format!("configured ({})", config::mask(key))),
        None => CheckResult::error(name, "not set", &hint),
    }
}

fn check_config_file(path: &Path) -> CheckResult {
    if !path.exists() {
        return CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: huddle config edit",
        );
    }

    match Settings::load_from(Some(&path.to_path_buf())) {
        Ok(_) => CheckResult::ok("Config file", &format!("{}", path.display())),
        Err(e) => CheckResult::error(
            "Config file",
            &format!("{} ({})", path.display(), e),
            "Fix the TOML syntax or remove the file",
        ),
    }
}

fn check_prompt_dir(custom_dir: Option<&str>) -> CheckResult {
    let Some(dir) = custom_dir else {
        return CheckResult::ok("Prompts", "built-in");
    };

    let agents_path = Settings::expand_path(dir).join("agents.toml");
    if agents_path.exists() {
        CheckResult::ok("Prompts", &format!("{}", agents_path.display()))
    } else {
        CheckResult::warning(
            "Prompts",
            &format!("{} not found, using built-in prompts", agents_path.display()),
            "Create agents.toml in the custom prompt directory",
        )
    }
}

/// Check that the roster builds and the entry agent exists.
fn check_registry(settings: &Settings) -> CheckResult {
    match AgentRegistry::from_settings(settings) {
        Ok(registry) => CheckResult::ok(
            "Roster",
            &format!(
                "{} agents, entry agent {}",
                registry.len(),
                registry.entry().name
            ),
        ),
        Err(e) => CheckResult::error(
            "Roster",
            &e.to_string(),
            "Set agents.entry_agent to one of the agents listed by 'huddle agents'",
        ),
    }
}
