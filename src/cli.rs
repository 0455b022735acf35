use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "spectre-ingest",
    version,
    about = "Ingest, normalize, and validate spectre scanner audit reports",
    long_about = "spectre-ingest discovers installed spectre scanners, runs them, and ingests \
                  their JSON reports (legacy per-tool shapes or the spectre/v1 envelope) into a \
                  single typed model for downstream analysis."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Terminal, global = true)]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collect reports from files and/or directories
    Collect {
        /// Report files or directories to ingest
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Worker pool size
        #[arg(long, default_value_t = 10)]
        workers: usize,

        /// Whole-batch timeout in seconds
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,

        /// Also validate each report and drop invalid ones
        #[arg(long)]
        strict: bool,
    },

    /// Validate report files against their schemas
    Validate {
        /// Report files to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show which scanners are installed and runnable
    Discover,

    /// Discover runnable scanners, execute them, and collect their reports
    Run {
        /// Restrict to specific tools (repeatable)
        #[arg(long = "tool")]
        tools: Vec<String>,

        /// Per-invocation timeout in seconds
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_collect() {
        let cli = Cli::try_parse_from(["spectre-ingest", "collect", "reports/"]).unwrap();
        match cli.command {
            Command::Collect {
                paths,
                workers,
                strict,
                ..
            } => {
                assert_eq!(paths, vec![PathBuf::from("reports/")]);
                assert_eq!(workers, 10);
                assert!(!strict);
            }
            _ => panic!("expected collect"),
        }
    }

    #[test]
    fn test_collect_requires_paths() {
        assert!(Cli::try_parse_from(["spectre-ingest", "collect"]).is_err());
    }

    #[test]
    fn test_parse_format_json() {
        let cli =
            Cli::try_parse_from(["spectre-ingest", "discover", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_run_with_tools() {
        let cli = Cli::try_parse_from([
            "spectre-ingest",
            "run",
            "--tool",
            "vault",
            "--tool",
            "pg",
            "--timeout-secs",
            "60",
        ])
        .unwrap();
        match cli.command {
            Command::Run {
                tools,
                timeout_secs,
            } => {
                assert_eq!(tools, vec!["vault", "pg"]);
                assert_eq!(timeout_secs, 60);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_validate() {
        let cli =
            Cli::try_parse_from(["spectre-ingest", "validate", "a.json", "b.json"]).unwrap();
        match cli.command {
            Command::Validate { files } => assert_eq!(files.len(), 2),
            _ => panic!("expected validate"),
        }
    }
}
