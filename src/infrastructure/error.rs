//! Infrastructure-level errors (processes, HTTP, credentials)

use thiserror::Error;

/// Errors raised at the I/O boundary: subprocesses, HTTP and token acquisition.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed: {message}")]
    Command {
        program: String,
        message: String,
        exit_code: Option<i32>,
    },

    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("{message}")]
    Authentication { message: String },

    #[error("unexpected response: {message}")]
    InvalidResponse { message: String },
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Map a process spawn/wait error, keeping timeouts distinct.
    pub fn from_process(program: &str, timeout_secs: u64, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::TimedOut => Self::Timeout {
                program: program.to_string(),
                secs: timeout_secs,
            },
            std::io::ErrorKind::NotFound => Self::Command {
                program: program.to_string(),
                message: "command not found".to_string(),
                exit_code: None,
            },
            _ => Self::io(format!("run {program}"), source),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Short category name shown as `ERROR: <kind>: <message>`.
    pub fn kind(&self) -> &'static str {
        match self {
            InfraError::Io { .. } => "IoError",
            InfraError::Command { .. } => "CommandError",
            InfraError::Timeout { .. } => "TimeoutError",
            InfraError::Transport(_) => "TransportError",
            InfraError::Service { .. } => "ServiceError",
            InfraError::Authentication { .. } => "AuthenticationError",
            InfraError::InvalidResponse { .. } => "InvalidResponse",
        }
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;
