//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod dotenv;
pub mod entities;
pub mod error;

pub use dotenv::parse_env_content;
pub use entities::*;
pub use error::DomainError;

/// Expand `~`, `$VAR` and `${VAR}` in a path-like string.
///
/// Unknown variables leave the input unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
