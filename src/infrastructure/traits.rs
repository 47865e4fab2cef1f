//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::collections::HashMap;
use std::io::{self, IsTerminal, Read, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::sync::OnceLock;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::domain::{AgentRef, ResponseInput};
use crate::infrastructure::credential::AccessToken;
use crate::infrastructure::input::InterruptibleLines;
use crate::infrastructure::InfraResult;

/// Lazy, finite, non-restartable sequence of response text fragments.
pub type TextStream<'a> = Box<dyn Iterator<Item = InfraResult<String>> + 'a>;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string. Fails on missing files and non-UTF-8 content.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file.
    fn is_file(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Copy file from source to destination.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;
}

/// External command runner abstraction.
pub trait CommandRunner: Send + Sync {
    /// Run a command with captured output. The child is killed once `timeout`
    /// elapses and an `ErrorKind::TimedOut` error is returned.
    fn run(&self, cmd: &str, args: &[&str], timeout: Duration) -> io::Result<Output>;

    /// Run a command attached to the terminal (inherited stdio), e.g. a
    /// browser login flow. Same timeout semantics as [`CommandRunner::run`].
    fn run_interactive(&self, cmd: &str, args: &[&str], timeout: Duration)
        -> io::Result<ExitStatus>;
}

/// Process environment abstraction.
pub trait Environment: Send + Sync {
    /// Value of a variable, `None` if unset or not unicode.
    fn var(&self, key: &str) -> Option<String>;

    /// Set a variable for this process.
    fn set_var(&self, key: &str, value: &str);

    /// Snapshot of all variables.
    fn vars(&self) -> HashMap<String, String>;
}

/// User interaction abstraction.
pub trait Prompter: Send + Sync {
    /// Ask a yes/no question.
    fn confirm(&self, question: &str, default: bool) -> io::Result<bool>;

    /// Read one line of input. Returns `None` on end-of-input or interrupt.
    fn read_line(&self, prompt: &str) -> io::Result<Option<String>>;
}

/// Source of bearer tokens for a resource scope.
pub trait TokenCredential: Send + Sync {
    /// Name shown in diagnostics.
    fn name(&self) -> &str {
        "credential"
    }

    /// Obtain a token for `scope`, failing with `InfraError::Authentication`
    /// (or a process/transport error) otherwise.
    fn get_token(&self, scope: &str) -> InfraResult<AccessToken>;
}

/// Narrow interface to the remote agent service.
pub trait AgentBackend: Send + Sync {
    /// Resolve an agent by name.
    fn get_agent(&self, name: &str) -> InfraResult<AgentRef>;

    /// Send input and return the complete response text.
    fn create_response(&self, input: ResponseInput<'_>, agent: &AgentRef) -> InfraResult<String>;

    /// Send input and return response text fragments as they arrive.
    fn stream_response<'a>(
        &'a self,
        input: ResponseInput<'_>,
        agent: &AgentRef,
    ) -> InfraResult<TextStream<'a>>;

    /// Names of up to `limit` agents in the project.
    fn list_agents(&self, limit: u32) -> InfraResult<Vec<String>>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        std::fs::copy(from, to)
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Real command runner implementation.
#[derive(Debug, Default)]
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run(&self, cmd: &str, args: &[&str], timeout: Duration) -> io::Result<Output> {
        debug!("run: {} {:?} (timeout {}s)", cmd, args, timeout.as_secs());
        let mut child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain pipes on helper threads so a full pipe cannot stall the child
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = wait_with_deadline(&mut child, cmd, timeout)?;

        Ok(Output {
            status,
            stdout: join_drained(stdout),
            stderr: join_drained(stderr),
        })
    }

    fn run_interactive(
        &self,
        cmd: &str,
        args: &[&str],
        timeout: Duration,
    ) -> io::Result<ExitStatus> {
        debug!("run_interactive: {} {:?}", cmd, args);
        let mut child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;
        wait_with_deadline(&mut child, cmd, timeout)
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

fn join_drained(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .map(|h| h.join().unwrap_or_default())
        .unwrap_or_default()
}

/// Poll the child until it exits or the deadline passes; kill it on timeout.
fn wait_with_deadline(child: &mut Child, cmd: &str, timeout: Duration) -> io::Result<ExitStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            warn!("{} exceeded {}s, killing", cmd, timeout.as_secs());
            let _ = child.kill();
            let _ = child.wait();
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("{} timed out after {}s", cmd, timeout.as_secs()),
            ));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Real process environment.
#[derive(Debug, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set_var(&self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }

    fn vars(&self) -> HashMap<String, String> {
        std::env::vars().collect()
    }
}

/// Real prompter: dialoguer widgets on a terminal, plain line reads otherwise.
///
/// Plain reads go through [`InterruptibleLines`], so Ctrl-C ends input the
/// same way it does in raw mode instead of killing the process.
#[derive(Default)]
pub struct TerminalPrompter {
    plain: OnceLock<InterruptibleLines>,
}

impl TerminalPrompter {
    fn attended() -> bool {
        io::stdin().is_terminal() && io::stdout().is_terminal()
    }

    fn read_plain_line(&self, prompt: &str) -> io::Result<Option<String>> {
        print!("{}: ", prompt);
        io::stdout().flush()?;

        let line = self
            .plain
            .get_or_init(InterruptibleLines::stdin)
            .next_line()?;
        if line.is_none() {
            println!();
        }
        Ok(line)
    }
}

/// Convert a dialoguer error, preserving the underlying I/O error kind.
fn dialoguer_to_io(err: dialoguer::Error) -> io::Error {
    let kind = std::error::Error::source(&err)
        .and_then(|s| s.downcast_ref::<io::Error>())
        .map(|e| e.kind())
        .unwrap_or(io::ErrorKind::Other);
    io::Error::new(kind, err.to_string())
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, question: &str, default: bool) -> io::Result<bool> {
        if Self::attended() {
            return match dialoguer::Confirm::new()
                .with_prompt(question)
                .default(default)
                .interact()
                .map_err(dialoguer_to_io)
            {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(false),
                other => other,
            };
        }

        let hint = if default { "Y/n" } else { "y/N" };
        match self.read_plain_line(&format!("{} [{}]", question, hint))? {
            None => Ok(false),
            Some(answer) => {
                let answer = answer.trim().to_lowercase();
                Ok(match answer.as_str() {
                    "" => default,
                    "y" | "yes" => true,
                    _ => false,
                })
            }
        }
    }

    fn read_line(&self, prompt: &str) -> io::Result<Option<String>> {
        if !Self::attended() {
            return self.read_plain_line(prompt);
        }

        match dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(dialoguer_to_io)
        {
            Ok(line) => Ok(Some(line)),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::UnexpectedEof
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
