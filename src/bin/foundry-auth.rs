//! Check Azure CLI authentication and offer to log in.

use clap::Parser;

use foundry_agent::cli::commands::{bootstrap, execute_auth};
use foundry_agent::cli::output::report_error;
use foundry_agent::cli::{AuthCli, CliResult};
use foundry_agent::util::logging::setup_logging;

fn run(cli: &AuthCli) -> CliResult<()> {
    let (container, _) = bootstrap(cli.env_file.clone())?;
    execute_auth(cli, &container)
}

fn main() {
    let cli = AuthCli::parse();
    setup_logging(cli.debug);

    if let Err(e) = run(&cli) {
        report_error(&e, false);
        std::process::exit(e.exit_code());
    }
}
