mod commands;
mod dispatch;
mod helpers;

use clap::Parser;
use dispatch::{PROGRAM_NAME, command_alias_from_program_name};
use vaspbench_core::domain::BenchError;

pub fn run_from_env() -> i32 {
    let mut args = std::env::args();
    let program_name = args.next().unwrap_or_else(|| PROGRAM_NAME.to_string());
    let remaining: Vec<String> = args.collect();

    match run_with_program_name(&program_name, remaining) {
        Ok(code) => code,
        Err(error) => {
            let bench_error = error.as_bench_error();
            eprintln!("{}", bench_error.diagnostic_line());
            eprintln!("{}", bench_error.fatal_exit_line());
            bench_error.exit_code()
        }
    }
}

#[cfg(test)]
pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once(PROGRAM_NAME.to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn run_with_program_name(program_name: &str, args: Vec<String>) -> Result<i32, CliError> {
    let alias = command_alias_from_program_name(program_name).map(str::to_string);
    let full_args = std::iter::once(PROGRAM_NAME.to_string())
        .chain(alias)
        .chain(args)
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_tracing(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "vaspbench",
    version,
    about = "Plan, submit and summarize VASP SCF benchmark runs"
)]
struct Cli {
    /// Raise log verbosity on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Derive inputs for every benchmark structure and submit them
    Run(commands::RunArgs),
    /// Rank and report finished runs of one or more groups
    Summarize(commands::SummarizeArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Run(args) => commands::run_run_command(args),
        CliCommand::Summarize(args) => commands::run_summarize_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(BenchError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<BenchError> for CliError {
    fn from(error: BenchError) -> Self {
        Self::Compute(error)
    }
}

impl CliError {
    fn as_bench_error(&self) -> BenchError {
        match self {
            Self::Usage(message) => {
                BenchError::input_validation("INPUT.CLI_USAGE", message.clone())
            }
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => BenchError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
