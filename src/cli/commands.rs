//! Command dispatch for the three binaries

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::services::{
    find_project_root, EnvFileService, EnvLocations, EnvSource, LoginPolicy, SetupObserver,
};
use crate::application::InteractiveSession;
use crate::cli::args::{AuthCli, Cli, SetupCli};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::Settings;
use crate::domain::{ExecutionMode, Message, SetupStep};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{Environment, FileSystem, ProcessEnvironment, RealFileSystem};

/// Load the env file, then settings, then wire the real services.
pub fn bootstrap(env_file: Option<PathBuf>) -> CliResult<(ServiceContainer, EnvSource)> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let env: Arc<dyn Environment> = Arc::new(ProcessEnvironment);

    let explicit = env_file.clone();
    let locations = EnvLocations::discover(env_file, fs.as_ref());
    let source = EnvFileService::new(fs, env.clone()).load(&locations.candidates());
    if let Some(path) = explicit.filter(|p| source.loaded.as_ref() != Some(p)) {
        output::warning(&format!("env file not readable: {}", path.display()));
    }

    let settings = Settings::load(env.as_ref())?;
    debug!("settings: {:?}", settings);
    let container = ServiceContainer::new(settings)?;
    Ok((container, source))
}

/// Run `foundry-agent`: environment check, auth gate, then the selected mode.
#[instrument(level = "debug", skip_all)]
pub fn execute(
    cli: &Cli,
    container: &ServiceContainer,
    source: &EnvSource,
    out: &mut dyn Write,
) -> CliResult<()> {
    let mode = ExecutionMode::from_flags(cli.list, cli.interactive, cli.stream);
    let message = if mode.requires_message() {
        Some(Message::from_words(&cli.message).map_err(|_| CliError::MissingMessage)?)
    } else {
        None
    };
    debug!("mode: {:?}", mode);

    if container.settings.endpoint.is_none() {
        return Err(CliError::MissingEndpoint {
            source_info: source.clone(),
        });
    }
    if !cli.quiet {
        writeln!(out, "{}", output::env_source(source))?;
    }

    let status = container.auth_service().verify();
    if !status.authenticated {
        return Err(CliError::AuthenticationFailed { status });
    }

    let service = container.agent_service()?;
    let agent = cli.agent.as_deref();

    match (mode, message) {
        (ExecutionMode::List, _) => {
            let names = service.list()?;
            if !cli.quiet {
                if names.is_empty() {
                    writeln!(out, "No agents found.")?;
                } else {
                    writeln!(out, "Available agents:")?;
                }
            }
            for name in names {
                writeln!(out, "{}", name)?;
            }
        }
        (ExecutionMode::Interactive, _) => {
            let mut session = InteractiveSession::start(&service, agent)?;
            session.run(container.prompter.as_ref(), out)?;
        }
        (ExecutionMode::Stream, Some(message)) => {
            if !cli.quiet {
                write_call_header(out, agent.unwrap_or(service.default_agent()), &message)?;
            }
            for fragment in service.stream(&message, agent)? {
                write!(out, "{}", fragment?)?;
                out.flush()?;
            }
            writeln!(out)?;
        }
        (ExecutionMode::Single, Some(message)) => {
            if !cli.quiet {
                write_call_header(out, agent.unwrap_or(service.default_agent()), &message)?;
            }
            let text = service.call(&message, agent)?;
            writeln!(out, "{}", text)?;
        }
        (_, None) => return Err(CliError::MissingMessage),
    }
    Ok(())
}

fn write_call_header(out: &mut dyn Write, agent: &str, message: &Message) -> std::io::Result<()> {
    writeln!(out, "Agent: {}", agent)?;
    writeln!(out, "Message: {}", message)?;
    writeln!(out, "Response:")
}

/// Run `foundry-auth`: report status, then log in if allowed.
pub fn execute_auth(cli: &AuthCli, container: &ServiceContainer) -> CliResult<()> {
    let auth = container.auth_service();
    let report = auth.report();
    output::auth_report(&report);

    if report.status.authenticated {
        return Ok(());
    }
    if report.cli_version.is_none() {
        return Err(CliError::AuthenticationFailed {
            status: report.status,
        });
    }

    let policy = if cli.no_login {
        LoginPolicy::Never
    } else if cli.yes {
        LoginPolicy::Always
    } else {
        LoginPolicy::Ask
    };
    let status = auth.ensure(container.prompter.as_ref(), policy);
    if status.authenticated {
        output::auth_status(&status);
        Ok(())
    } else {
        Err(CliError::AuthenticationFailed { status })
    }
}

struct ConsoleObserver;

impl SetupObserver for ConsoleObserver {
    fn step_started(&mut self, index: usize, total: usize, name: &str) {
        output::setup_step_started(index, total, name);
    }

    fn step_finished(&mut self, step: &SetupStep) {
        output::setup_step(step);
    }
}

/// Run `foundry-setup` and print its report.
pub fn execute_setup(cli: &SetupCli, container: &ServiceContainer) -> CliResult<()> {
    let dir = match &cli.dir {
        Some(dir) => dir.clone(),
        None => {
            let cwd = std::env::current_dir()?;
            find_project_root(&cwd, container.fs.as_ref()).unwrap_or(cwd)
        }
    };
    output::header(&format!("Setting up {}", dir.display()));

    let report = container
        .setup_service()
        .run(&dir, cli.yes, &mut ConsoleObserver);

    let total = report.steps.len();
    let failed = report.steps.iter().filter(|s| !s.outcome.is_ok()).count();
    if report.all_ok() {
        output::success("Setup complete. Try: foundry-agent \"hello\"");
        Ok(())
    } else {
        Err(CliError::SetupIncomplete { failed, total })
    }
}
