//! Infrastructure layer: I/O implementations and DI container
//!
//! This layer implements I/O boundary traits and wires up services.

pub mod credential;
pub mod di;
pub mod error;
pub mod foundry;
pub mod input;
pub mod sse;
pub mod traits;

pub use error::{InfraError, InfraResult};
