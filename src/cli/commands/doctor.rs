//! Doctor command - verify credentials and configuration.

use crate::cli::Output;
use crate::config::Settings;
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
    Output::header("finrag doctor");
    println!();
    println!("Checking credentials and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    let api_checks = vec![
        check_openai_api_key(std::env::var("OPENAI_API_KEY").ok()),
        check_search_value(
            "Search API key",
            settings.search.resolved_api_key(),
            "Set search.api_key or export GOOGLE_API_KEY",
            true,
        ),
        check_search_value(
            "Search engine id",
            settings.search.resolved_engine_id(),
            "Set search.engine_id or export GOOGLE_CSE_ID",
            false,
        ),
    ];
    for check in &api_checks {
        check.print();
    }
    checks.extend(api_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = vec![check_config_file(config_path), check_trust_list(settings)];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);
    Output::kv("Embedding model", &settings.embedding.model);
    Output::kv("Answer model", &settings.generation.model);
    Output::kv("Passages per answer", &settings.retrieval.k.to_string());

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using finrag.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! finrag is ready to use.");
    }

    Ok(())
}

/// Check the OpenAI API key.
fn check_openai_api_key(key: Option<String>) -> CheckResult {
    match key {
        Some(key) if key.starts_with("sk-") && key.len() > 20 => {
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", mask(&key)))
        }
        Some(key) if key.is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Check a search credential that may come from config or environment.
fn check_search_value(name: &str, value: Option<String>, hint: &str, secret: bool) -> CheckResult {
    match value {
        Some(v) if secret => CheckResult::ok(name, &format!("configured ({})", mask(&v))),
        Some(v) => CheckResult::ok(name, &v),
        None => CheckResult::error(name, "not set", hint),
    }
}

fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: finrag config edit",
        )
    }
}

fn check_trust_list(settings: &Settings) -> CheckResult {
    let domains = &settings.trust.domains;
    if domains.iter().all(|d| d.trim().is_empty()) {
        CheckResult::warning(
            "Trusted domains",
            "empty",
            "Every search result will be discarded; set trust.domains",
        )
    } else {
        CheckResult::ok("Trusted domains", &domains.join(", "))
    }
}

/// Show only the ends of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 11 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
