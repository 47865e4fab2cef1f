use std::io;

use clap::{Command, CommandFactory, Parser};
use clap_complete::{generate, Generator};

use foundry_agent::cli::commands::{bootstrap, execute};
use foundry_agent::cli::output::report_error;
use foundry_agent::cli::{Cli, CliResult};
use foundry_agent::exitcode;
use foundry_agent::util::logging::setup_logging;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

fn run(cli: &Cli) -> CliResult<()> {
    let (container, source) = bootstrap(cli.env_file.clone())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(cli, &container, &source, &mut out)
}

fn main() {
    let cli = Cli::parse();

    if let Some(generator) = cli.generator {
        let mut cmd = Cli::command();
        eprintln!("Generating completion file for {generator:?}...");
        print_completions(generator, &mut cmd);
        std::process::exit(exitcode::OK);
    }

    setup_logging(cli.debug);

    if let Err(e) = run(&cli) {
        report_error(&e, cli.quiet);
        std::process::exit(e.exit_code());
    }
}
