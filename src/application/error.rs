//! Application-level errors (wraps domain and infrastructure errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// Application errors wrap lower layers and add use-case context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("PROJECT_ENDPOINT is not configured")]
    MissingEndpoint,

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// Short category name shown as `ERROR: <kind>: <message>`.
    pub fn kind(&self) -> &'static str {
        match self {
            ApplicationError::Domain(_) => "InvalidInput",
            ApplicationError::Infra(e) => e.kind(),
            ApplicationError::MissingEndpoint | ApplicationError::Config { .. } => {
                "ConfigurationError"
            }
            ApplicationError::OperationFailed { .. } => "OperationFailed",
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
