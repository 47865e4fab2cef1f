//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use std::fmt::Display;

use colored::Colorize;

use crate::application::services::{AuthReport, EnvSource};
use crate::cli::CliError;
use crate::domain::{AuthStatus, SetupStep, StepOutcome};

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print failure status (red X)
pub fn failure(msg: &(impl Display + ?Sized)) {
    println!("{} {}", "✗".red(), msg);
}

/// Print skipped status (yellow dash)
pub fn skipped(msg: &(impl Display + ?Sized)) {
    println!("{} {}", "-".yellow(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl Display + ?Sized)) {
    println!("  {}", msg);
}

/// Which env file was used, for non-quiet runs.
pub fn env_source(source: &EnvSource) -> String {
    match &source.loaded {
        Some(path) => format!("Loaded config from: {}", path.display()),
        None => "No .env file found, using environment".to_string(),
    }
}

fn remediation(err: &CliError) -> Vec<String> {
    match err {
        CliError::MissingEndpoint { source_info } => {
            let mut lines = vec![
                "Set PROJECT_ENDPOINT in a .env file or the environment, or run foundry-setup."
                    .to_string(),
            ];
            if !source_info.searched.is_empty() {
                lines.push("Searched:".to_string());
                lines.extend(
                    source_info
                        .searched
                        .iter()
                        .map(|p| format!("  {}", p.display())),
                );
            }
            lines
        }
        CliError::AuthenticationFailed { status } => status.remediation.clone(),
        CliError::MissingMessage => vec!["Provide a message, or use -h for help.".to_string()],
        _ => vec![],
    }
}

/// Print an error to stderr: one line when quiet, with remediation otherwise.
pub fn report_error(err: &CliError, quiet: bool) {
    let line = format!("ERROR: {}: {}", err.kind(), err);
    if quiet {
        eprintln!("{}", line);
        return;
    }
    eprintln!("{}", line.red());
    for hint in remediation(err) {
        eprintln!("{}", hint);
    }
}

pub fn auth_status(status: &AuthStatus) {
    if status.authenticated {
        success(&status.message);
    } else {
        failure(&status.message);
        for hint in &status.remediation {
            detail(hint);
        }
    }
}

pub fn auth_report(report: &AuthReport) {
    header("Azure authentication");
    match &report.cli_version {
        Some(version) => success(&format!("Azure CLI: {}", version)),
        None => warning("Azure CLI not found"),
    }
    auth_status(&report.status);
    if let Some(user) = &report.user {
        detail(&format!("Logged in as: {}", user));
    }
}

pub fn setup_step_started(index: usize, total: usize, name: &str) {
    header(&format!("[{}/{}] {}", index, total, name));
}

pub fn setup_step(step: &SetupStep) {
    match &step.outcome {
        StepOutcome::Ok(m) => success(m),
        StepOutcome::Failed(m) => failure(m),
        StepOutcome::Skipped(m) => skipped(m),
    }
    for hint in &step.hints {
        detail(hint);
    }
}
