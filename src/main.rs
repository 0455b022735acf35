use clap::Parser;
use spectre_ingest::handlers::{handle_collect, handle_discover, handle_run, handle_validate};
use spectre_ingest::{Cli, Command};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Collect {
            ref paths,
            workers,
            timeout_secs,
            strict,
        } => handle_collect(paths, workers, timeout_secs, strict, cli.format),
        Command::Validate { ref files } => handle_validate(files, cli.format),
        Command::Discover => handle_discover(cli.format),
        Command::Run {
            ref tools,
            timeout_secs,
        } => handle_run(tools, timeout_secs, cli.format),
    }
}
