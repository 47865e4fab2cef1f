//! First-time setup for calling Foundry agents.

use clap::Parser;

use foundry_agent::cli::commands::{bootstrap, execute_setup};
use foundry_agent::cli::output::report_error;
use foundry_agent::cli::{CliResult, SetupCli};
use foundry_agent::util::logging::setup_logging;

fn run(cli: &SetupCli) -> CliResult<()> {
    let (container, _) = bootstrap(cli.env_file.clone())?;
    execute_setup(cli, &container)
}

fn main() {
    let cli = SetupCli::parse();
    setup_logging(cli.debug);

    if let Err(e) = run(&cli) {
        report_error(&e, false);
        std::process::exit(e.exit_code());
    }
}
