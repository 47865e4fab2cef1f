//! Hand-written fakes of the I/O boundary traits shared by the integration tests
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Output};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use foundry_agent::config::Settings;
use foundry_agent::domain::{AgentRef, ResponseInput};
use foundry_agent::infrastructure::credential::AccessToken;
use foundry_agent::infrastructure::di::ServiceContainer;
use foundry_agent::infrastructure::traits::{
    AgentBackend, CommandRunner, Environment, FileSystem, Prompter, RealFileSystem, TextStream,
    TokenCredential,
};
use foundry_agent::infrastructure::{InfraError, InfraResult};

pub const ENDPOINT: &str = "https://res.services.ai.azure.com/api/projects/demo";

#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code as u32)
}

fn output(code: i32, stdout: &str, stderr: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: stdout.as_bytes().to_vec(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

pub fn settings_with_endpoint() -> Settings {
    Settings {
        endpoint: Some(ENDPOINT.to_string()),
        ..Settings::default()
    }
}

// ============================================================
// Azure CLI
// ============================================================

/// Scripted `az` executable.
pub struct FakeAz {
    pub installed: bool,
    pub logged_in: Mutex<bool>,
    pub login_succeeds: bool,
    pub hang: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeAz {
    pub fn new(installed: bool, logged_in: bool) -> Arc<Self> {
        Arc::new(Self {
            installed,
            logged_in: Mutex::new(logged_in),
            login_succeeds: true,
            hang: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn with_failing_login() -> Arc<Self> {
        Arc::new(Self {
            installed: true,
            logged_in: Mutex::new(false),
            login_succeeds: false,
            hang: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every command runs past its deadline.
    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            installed: true,
            logged_in: Mutex::new(true),
            login_succeeds: true,
            hang: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn is_logged_in(&self) -> bool {
        *self.logged_in.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn login_calls(&self) -> usize {
        self.calls().iter().filter(|c| c.as_str() == "login").count()
    }
}

impl CommandRunner for FakeAz {
    fn run(&self, _cmd: &str, args: &[&str], timeout: Duration) -> io::Result<Output> {
        self.calls.lock().unwrap().push(args.join(" "));
        if self.hang {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("timed out after {}s", timeout.as_secs()),
            ));
        }
        if !self.installed {
            return Err(io::Error::new(io::ErrorKind::NotFound, "No such file"));
        }
        match args.first().copied() {
            Some("--version") => Ok(output(0, "azure-cli                         2.67.0\n\ncore 2.67.0\n", "")),
            Some("account") if self.is_logged_in() => Ok(output(
                0,
                r#"{"id": "sub", "user": {"name": "dev@example.com", "type": "user"}}"#,
                "",
            )),
            Some("account") => Ok(output(1, "", "Please run 'az login' to setup account.")),
            _ => Ok(output(2, "", "unknown command")),
        }
    }

    fn run_interactive(
        &self,
        _cmd: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> io::Result<ExitStatus> {
        self.calls.lock().unwrap().push(args.join(" "));
        if !self.installed {
            return Err(io::Error::new(io::ErrorKind::NotFound, "No such file"));
        }
        if self.login_succeeds {
            *self.logged_in.lock().unwrap() = true;
            Ok(exit_status(0))
        } else {
            Ok(exit_status(1))
        }
    }
}

/// Credential that succeeds exactly when the fake `az` is logged in.
pub struct LinkedCredential {
    pub az: Arc<FakeAz>,
    pub scopes: Mutex<Vec<String>>,
}

impl LinkedCredential {
    pub fn new(az: Arc<FakeAz>) -> Arc<Self> {
        Arc::new(Self {
            az,
            scopes: Mutex::new(Vec::new()),
        })
    }
}

impl TokenCredential for LinkedCredential {
    fn name(&self) -> &str {
        "LinkedCredential"
    }

    fn get_token(&self, scope: &str) -> InfraResult<AccessToken> {
        self.scopes.lock().unwrap().push(scope.to_string());
        if self.az.is_logged_in() {
            Ok(AccessToken::new("fake-token", None))
        } else {
            Err(InfraError::Authentication {
                message: "Please run 'az login' to set up an account".to_string(),
            })
        }
    }
}

/// Credential that always yields a token, like a configured service principal.
#[derive(Default)]
pub struct StaticCredential {
    pub scopes: Mutex<Vec<String>>,
}

impl TokenCredential for StaticCredential {
    fn name(&self) -> &str {
        "StaticCredential"
    }

    fn get_token(&self, scope: &str) -> InfraResult<AccessToken> {
        self.scopes.lock().unwrap().push(scope.to_string());
        Ok(AccessToken::new("static-token", None))
    }
}

// ============================================================
// Agent service
// ============================================================

/// In-memory agent service recording every request.
#[derive(Default)]
pub struct FakeBackend {
    pub agents: Vec<String>,
    pub fragments: Vec<String>,
    pub fail_responses: bool,
    /// Requests in order: "get_agent:<name>", "create:<turns>", "stream", "list:<limit>"
    pub calls: Mutex<Vec<String>>,
    /// Inputs of `create_response` calls, flattened to `role: content` lines
    pub inputs: Mutex<Vec<Vec<String>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            agents: vec!["ratemytask".to_string(), "reviewer".to_string()],
            fragments: vec!["Score: ".to_string(), "8".to_string(), "/10".to_string()],
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_responses: true,
            ..Self::new()
        }
    }

    pub fn full_text(&self) -> String {
        self.fragments.concat()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl AgentBackend for FakeBackend {
    fn get_agent(&self, name: &str) -> InfraResult<AgentRef> {
        self.record(format!("get_agent:{}", name));
        if !self.agents.iter().any(|a| a == name) {
            return Err(InfraError::Service {
                status: 404,
                message: format!("Agent '{}' not found", name),
            });
        }
        Ok(AgentRef::new(name).unwrap())
    }

    fn create_response(&self, input: ResponseInput<'_>, _agent: &AgentRef) -> InfraResult<String> {
        let lines = match input {
            ResponseInput::Text(text) => vec![format!("user: {}", text)],
            ResponseInput::Conversation(turns) => turns
                .iter()
                .map(|t| format!("{}: {}", t.role, t.content))
                .collect(),
        };
        self.record(format!("create:{}", lines.len()));
        self.inputs.lock().unwrap().push(lines);
        if self.fail_responses {
            return Err(InfraError::Service {
                status: 500,
                message: "(server_error) upstream failure".to_string(),
            });
        }
        Ok(self.full_text())
    }

    fn stream_response<'a>(
        &'a self,
        _input: ResponseInput<'_>,
        _agent: &AgentRef,
    ) -> InfraResult<TextStream<'a>> {
        self.record("stream".to_string());
        if self.fail_responses {
            return Err(InfraError::Service {
                status: 500,
                message: "(server_error) upstream failure".to_string(),
            });
        }
        Ok(Box::new(self.fragments.iter().cloned().map(Ok)))
    }

    fn list_agents(&self, limit: u32) -> InfraResult<Vec<String>> {
        self.record(format!("list:{}", limit));
        Ok(self.agents.iter().take(limit as usize).cloned().collect())
    }
}

// ============================================================
// Terminal and environment
// ============================================================

/// Prompter replaying scripted lines; `None` entries simulate end-of-input.
pub struct ScriptedPrompter {
    pub lines: Mutex<VecDeque<Option<String>>>,
    pub confirm_answer: bool,
    pub questions: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(lines: &[&str]) -> Arc<Self> {
        Self::build(lines, false)
    }

    pub fn confirming(answer: bool) -> Arc<Self> {
        Self::build(&[], answer)
    }

    fn build(lines: &[&str], confirm_answer: bool) -> Arc<Self> {
        Arc::new(Self {
            lines: Mutex::new(lines.iter().map(|l| Some(l.to_string())).collect()),
            confirm_answer,
            questions: Mutex::new(Vec::new()),
        })
    }

    pub fn questions_asked(&self) -> usize {
        self.questions.lock().unwrap().len()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, question: &str, _default: bool) -> io::Result<bool> {
        self.questions.lock().unwrap().push(question.to_string());
        Ok(self.confirm_answer)
    }

    fn read_line(&self, _prompt: &str) -> io::Result<Option<String>> {
        // Exhausted script behaves like end-of-input
        Ok(self.lines.lock().unwrap().pop_front().flatten())
    }
}

/// Process environment kept in memory.
#[derive(Default)]
pub struct MemoryEnv {
    vars: Mutex<HashMap<String, String>>,
}

impl MemoryEnv {
    pub fn with(pairs: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            vars: Mutex::new(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        })
    }
}

impl Environment for MemoryEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.lock().unwrap().get(key).cloned()
    }

    fn set_var(&self, key: &str, value: &str) {
        self.vars
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn vars(&self) -> HashMap<String, String> {
        self.vars.lock().unwrap().clone()
    }
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Container over fakes with the given settings.
pub fn container(
    settings: Settings,
    az: Arc<FakeAz>,
    env: Arc<MemoryEnv>,
    prompter: Arc<ScriptedPrompter>,
    backend: Arc<FakeBackend>,
) -> ServiceContainer {
    let credential = LinkedCredential::new(az.clone());
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    ServiceContainer::with_deps(settings, fs, az, env, prompter, credential).with_backend(backend)
}
