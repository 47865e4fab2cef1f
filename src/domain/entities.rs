//! Domain entities: core data structures

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// In-memory history of one interactive session. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Remove the trailing turn if it is an unanswered user message.
    pub fn pop_unanswered(&mut self) -> Option<Turn> {
        match self.turns.last() {
            Some(turn) if turn.role == Role::User => self.turns.pop(),
            _ => None,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Reference sent with every request to select the handling agent.
///
/// Serializes as `{"name": "<agent>", "type": "agent_reference"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl AgentRef {
    pub const KIND: &'static str = "agent_reference";

    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::EmptyAgentName);
        }
        Ok(Self {
            name,
            kind: Self::KIND.to_string(),
        })
    }
}

/// What to send as the `input` of a response request.
#[derive(Debug, Clone, Copy)]
pub enum ResponseInput<'a> {
    /// A single user message.
    Text(&'a str),
    /// A full conversation history, oldest turn first.
    Conversation(&'a [Turn]),
}

/// A message for single-shot or streaming calls, built from CLI words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message(String);

impl Message {
    /// Join words with a single space. Fails if the result is blank.
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Result<Self, DomainError> {
        let joined = words
            .iter()
            .map(|w| w.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        if joined.trim().is_empty() {
            return Err(DomainError::EmptyMessage);
        }
        Ok(Self(joined))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Execution mode chosen by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    List,
    Interactive,
    Stream,
    Single,
}

impl ExecutionMode {
    /// Resolve mode flags: list beats interactive beats stream.
    pub fn from_flags(list: bool, interactive: bool, stream: bool) -> Self {
        if list {
            ExecutionMode::List
        } else if interactive {
            ExecutionMode::Interactive
        } else if stream {
            ExecutionMode::Stream
        } else {
            ExecutionMode::Single
        }
    }

    /// Whether this mode needs message words on the command line.
    pub fn requires_message(&self) -> bool {
        matches!(self, ExecutionMode::Stream | ExecutionMode::Single)
    }
}

/// State of an interactive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingInput,
    Sending,
    Done,
}

/// Classified line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// Send this text to the agent.
    Message(String),
    /// Blank line, prompt again.
    Skip,
    /// Exit keyword, end-of-input or interrupt.
    End,
}

impl SessionInput {
    pub const EXIT_KEYWORDS: [&'static str; 2] = ["exit", "quit"];

    /// Classify a line read from the user; `None` means end-of-input or interrupt.
    pub fn classify(line: Option<&str>) -> Self {
        let Some(line) = line else {
            return SessionInput::End;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return SessionInput::Skip;
        }
        let lowered = trimmed.to_lowercase();
        if Self::EXIT_KEYWORDS.contains(&lowered.as_str()) {
            return SessionInput::End;
        }
        SessionInput::Message(trimmed.to_string())
    }
}

/// Outcome of an authentication check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStatus {
    pub authenticated: bool,
    /// Human-readable diagnostic
    pub message: String,
    /// Suggested fix, shown when not authenticated
    pub remediation: Vec<String>,
}

impl AuthStatus {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            message: message.into(),
            remediation: Vec::new(),
        }
    }

    pub fn failed(message: impl Into<String>, remediation: Vec<String>) -> Self {
        Self {
            authenticated: false,
            message: message.into(),
            remediation,
        }
    }
}

/// Result of one setup step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Ok(String),
    Failed(String),
    Skipped(String),
}

impl StepOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, StepOutcome::Ok(_))
    }

    pub fn message(&self) -> &str {
        match self {
            StepOutcome::Ok(m) | StepOutcome::Failed(m) | StepOutcome::Skipped(m) => m,
        }
    }
}

/// A named setup step and its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupStep {
    pub name: String,
    pub outcome: StepOutcome,
    /// Extra lines shown under the outcome (install hints, next actions)
    pub hints: Vec<String>,
}

/// Ordered outcome of a setup run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupReport {
    pub steps: Vec<SetupStep>,
}

impl SetupReport {
    pub fn record(&mut self, name: impl Into<String>, outcome: StepOutcome, hints: Vec<String>) {
        self.steps.push(SetupStep {
            name: name.into(),
            outcome,
            hints,
        });
    }

    /// True only if every step succeeded.
    pub fn all_ok(&self) -> bool {
        self.steps.iter().all(|s| s.outcome.is_ok())
    }
}
