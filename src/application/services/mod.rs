//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, CommandRunner, etc.)
//! but are themselves concrete structs, not traits.

mod agent;
mod auth;
pub mod env_file;
pub mod setup;

pub use agent::AgentService;
pub use auth::{AuthReport, AuthService, LoginPolicy};
pub use env_file::{find_project_root, EnvFileService, EnvLocations, EnvSource};
pub use setup::{SetupObserver, SetupService};
