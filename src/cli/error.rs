//! CLI-level errors (wraps application errors)

use thiserror::Error;

use crate::application::services::EnvSource;
use crate::application::ApplicationError;
use crate::domain::AuthStatus;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("PROJECT_ENDPOINT is not configured")]
    MissingEndpoint { source_info: EnvSource },

    #[error("{}", .status.message)]
    AuthenticationFailed { status: AuthStatus },

    #[error("no message given")]
    MissingMessage,

    #[error("setup incomplete: {failed} of {total} steps need attention")]
    SetupIncomplete { failed: usize, total: usize },

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Short category name shown as `ERROR: <kind>: <message>`.
    pub fn kind(&self) -> &'static str {
        match self {
            CliError::Application(e) => e.kind(),
            CliError::MissingEndpoint { .. } => "ConfigurationError",
            CliError::AuthenticationFailed { .. } => "AuthenticationError",
            CliError::MissingMessage => "UsageError",
            CliError::SetupIncomplete { .. } => "SetupIncomplete",
            CliError::Io(_) => "IoError",
        }
    }

    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        crate::exitcode::FAILURE
    }
}

impl From<crate::infrastructure::InfraError> for CliError {
    fn from(e: crate::infrastructure::InfraError) -> Self {
        CliError::Application(e.into())
    }
}

impl From<crate::domain::DomainError> for CliError {
    fn from(e: crate::domain::DomainError) -> Self {
        CliError::Application(e.into())
    }
}
