//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueHint};

/// Send a message to a Foundry agent, stream its reply, chat, or list agents
#[derive(Parser, Debug)]
#[command(name = "foundry-agent")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Message to send (words are joined with a single space)
    #[arg(value_name = "MESSAGE")]
    pub message: Vec<String>,

    /// Agent name [default: AGENT_NAME or ratemytask]
    #[arg(short, long)]
    pub agent: Option<String>,

    /// Print the response as it arrives
    #[arg(short, long)]
    pub stream: bool,

    /// Multi-turn conversation
    #[arg(short, long)]
    pub interactive: bool,

    /// List available agents
    #[arg(short, long)]
    pub list: bool,

    /// Print only the response text
    #[arg(short, long)]
    pub quiet: bool,

    /// Load variables from this file instead of searching for `.env`
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub env_file: Option<PathBuf>,

    /// Debug level: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count)]
    pub debug: u8,

    /// Print shell completions and exit
    #[arg(long = "generate", value_enum, value_name = "SHELL")]
    pub generator: Option<clap_complete::Shell>,
}

/// Check Azure CLI authentication and offer to log in
#[derive(Parser, Debug)]
#[command(name = "foundry-auth")]
#[command(author, version, about, long_about = None)]
pub struct AuthCli {
    /// Log in without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Only report, never start a login
    #[arg(long, conflicts_with = "yes")]
    pub no_login: bool,

    /// Load variables from this file instead of searching for `.env`
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub env_file: Option<PathBuf>,

    /// Debug level: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count)]
    pub debug: u8,
}

/// Prepare a machine for calling Foundry agents
#[derive(Parser, Debug)]
#[command(name = "foundry-setup")]
#[command(author, version, about, long_about = None)]
pub struct SetupCli {
    /// Directory holding `.env` [default: project root or current directory]
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub dir: Option<PathBuf>,

    /// Log in without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Load variables from this file instead of searching for `.env`
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub env_file: Option<PathBuf>,

    /// Debug level: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count)]
    pub debug: u8,
}
