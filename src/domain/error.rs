//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invalid values handed to the core types.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("message must not be empty")]
    EmptyMessage,

    #[error("agent name must not be empty")]
    EmptyAgentName,
}
