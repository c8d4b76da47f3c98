//! Filescope command line
//!
//! - **select**: print the files a source tree contributes to extraction
//! - **explain**: print the decision and its reason for given paths

use clap::{Parser, Subcommand};
use filescope_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "filescope", version, about = "Select the source files to extract from a tree")]
struct Cli {
    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the files to extract, one per line
    Select(cli::select::SelectArgs),

    /// Show the decision for individual paths
    Explain(cli::explain::ExplainArgs),
}

fn command_wants_json(command: &Commands) -> bool {
    match command {
        Commands::Select(args) => args.json,
        Commands::Explain(args) => args.json,
    }
}

fn run_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Select(args) => cli::select::run(args),
        Commands::Explain(args) => cli::explain::run(args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = command_wants_json(&cli.command);

    if let Err(err) = init_logging(LogConfig {
        app_name: "filescope",
        verbose: cli.verbose,
        log_file: cli.log_file.clone(),
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }
    debug!(command = ?cli.command, "Starting");

    match run_command(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else if let Some(helpful) = err.downcast_ref::<cli::error::HelpfulError>() {
                eprint!("{}", helpful);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}
