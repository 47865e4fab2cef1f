//! Call Microsoft Foundry agents from the command line.
//!
//! Layers, innermost first: [`domain`], [`infrastructure`], [`application`], [`cli`].

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
