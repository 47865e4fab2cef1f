//! First-time setup: CLI, login, env file, endpoint and token checks
//!
//! Every step runs even if an earlier one failed; the report says what is left to do.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::services::env_file::ENV_FILE_NAME;
use crate::application::services::{AuthService, EnvFileService};
use crate::application::{ApplicationResult, IoResultExt};
use crate::config::{vars, Settings};
use crate::domain::{SetupReport, SetupStep, StepOutcome};
use crate::infrastructure::traits::{Environment, FileSystem, Prompter};

pub const ENV_EXAMPLE_NAME: &str = ".env.example";

/// Written when no `.env.example` is available.
pub const ENV_TEMPLATE: &str = "\
# Foundry project endpoint, e.g.
# https://<resource>.services.ai.azure.com/api/projects/<project>
PROJECT_ENDPOINT=

# Agent used when --agent is not given
AGENT_NAME=ratemytask
";

pub const STEP_NAMES: [&str; 5] = [
    "Azure CLI",
    "Azure login",
    "Environment file",
    "Project endpoint",
    "Access token",
];

/// Progress callbacks for a setup run.
pub trait SetupObserver {
    fn step_started(&mut self, index: usize, total: usize, name: &str);
    fn step_finished(&mut self, step: &SetupStep);
}

/// Observer that ignores progress.
impl SetupObserver for () {
    fn step_started(&mut self, _index: usize, _total: usize, _name: &str) {}
    fn step_finished(&mut self, _step: &SetupStep) {}
}

type StepResult = (StepOutcome, Vec<String>);

pub struct SetupService {
    auth: AuthService,
    env_files: EnvFileService,
    fs: Arc<dyn FileSystem>,
    env: Arc<dyn Environment>,
    prompter: Arc<dyn Prompter>,
    settings: Arc<Settings>,
}

impl SetupService {
    pub fn new(
        auth: AuthService,
        env_files: EnvFileService,
        fs: Arc<dyn FileSystem>,
        env: Arc<dyn Environment>,
        prompter: Arc<dyn Prompter>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            auth,
            env_files,
            fs,
            env,
            prompter,
            settings,
        }
    }

    /// Run all steps against `dir`. `assume_yes` logs in without asking.
    #[instrument(level = "debug", skip(self, observer))]
    pub fn run(&self, dir: &Path, assume_yes: bool, observer: &mut dyn SetupObserver) -> SetupReport {
        let mut report = SetupReport::default();
        let total = STEP_NAMES.len();
        let env_path = dir.join(ENV_FILE_NAME);
        let mut cli_ok = false;

        for (index, name) in STEP_NAMES.iter().enumerate() {
            observer.step_started(index + 1, total, name);
            let (outcome, hints) = match index {
                0 => self.check_cli(),
                1 => self.check_login(cli_ok, assume_yes),
                2 => self.ensure_env_file(dir, &env_path),
                3 => self.check_endpoint(&env_path),
                _ => self.check_token(),
            };
            if index == 0 {
                cli_ok = outcome.is_ok();
            }
            report.record(*name, outcome, hints);
            if let Some(step) = report.steps.last() {
                observer.step_finished(step);
            }
        }

        debug!("setup complete: all_ok={}", report.all_ok());
        report
    }

    fn check_cli(&self) -> StepResult {
        match self.auth.cli_version() {
            Ok(version) => (StepOutcome::Ok(version), vec![]),
            Err(e) => (
                StepOutcome::Failed(format!("Azure CLI not available: {}", e)),
                vec!["Install: https://learn.microsoft.com/cli/azure/install-azure-cli".to_string()],
            ),
        }
    }

    fn check_login(&self, cli_ok: bool, assume_yes: bool) -> StepResult {
        if !cli_ok {
            return (
                StepOutcome::Skipped("requires the Azure CLI".to_string()),
                vec![],
            );
        }
        if let Ok(user) = self.auth.account_user() {
            return (StepOutcome::Ok(format!("logged in as {}", user)), vec![]);
        }

        let login_hint = vec!["Run: az login".to_string()];
        let proceed = assume_yes
            || self
                .prompter
                .confirm("Not logged in. Run 'az login' now?", true)
                .unwrap_or(false);
        if !proceed {
            return (StepOutcome::Failed("not logged in".to_string()), login_hint);
        }
        if let Err(e) = self.auth.login() {
            return (StepOutcome::Failed(format!("login failed: {}", e)), login_hint);
        }
        match self.auth.account_user() {
            Ok(user) => (StepOutcome::Ok(format!("logged in as {}", user)), vec![]),
            Err(e) => (StepOutcome::Failed(format!("still not logged in: {}", e)), login_hint),
        }
    }

    fn ensure_env_file(&self, dir: &Path, env_path: &Path) -> StepResult {
        if self.fs.is_file(env_path) {
            return (StepOutcome::Ok(format!("found {}", env_path.display())), vec![]);
        }

        let created = self
            .fs
            .create_dir_all(dir)
            .with_path_context("create directory", dir)
            .and_then(|_| self.create_env_file(dir, env_path));
        match created {
            Ok(origin) => (
                StepOutcome::Ok(format!("created {} from {}", env_path.display(), origin)),
                vec![format!("Set PROJECT_ENDPOINT in {}", env_path.display())],
            ),
            Err(e) => (StepOutcome::Failed(e.to_string()), vec![]),
        }
    }

    fn create_env_file(
        &self,
        dir: &Path,
        env_path: &Path,
    ) -> ApplicationResult<&'static str> {
        let example: PathBuf = dir.join(ENV_EXAMPLE_NAME);
        if self.fs.is_file(&example) {
            self.fs
                .copy(&example, env_path)
                .with_path_context("create env file", env_path)?;
            Ok(ENV_EXAMPLE_NAME)
        } else {
            self.fs
                .write(env_path, ENV_TEMPLATE)
                .with_path_context("create env file", env_path)?;
            Ok("template")
        }
    }

    fn check_endpoint(&self, env_path: &Path) -> StepResult {
        self.env_files.load(&[env_path.to_path_buf()]);
        let endpoint = self
            .env
            .var(vars::PROJECT_ENDPOINT)
            .filter(|e| !e.trim().is_empty())
            .or_else(|| self.settings.endpoint.clone());
        match endpoint {
            Some(endpoint) => (StepOutcome::Ok(endpoint), vec![]),
            None => (
                StepOutcome::Failed(format!("{} is not set", vars::PROJECT_ENDPOINT)),
                vec![format!("Edit {}", env_path.display())],
            ),
        }
    }

    fn check_token(&self) -> StepResult {
        match self.auth.check_token() {
            Ok(()) => (StepOutcome::Ok("token acquired".to_string()), vec![]),
            Err(e) => (
                StepOutcome::Failed(e.to_string()),
                vec!["Run: az login".to_string()],
            ),
        }
    }
}
