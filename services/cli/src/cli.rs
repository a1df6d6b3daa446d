use crate::commands::{run_allocate, run_rules, AllocateArgs, RulesArgs};
use case_allocation::config::AppConfig;
use case_allocation::error::AppError;
use case_allocation::telemetry;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "case-allocation",
    about = "Dry-run caseworker allocation for assessments and placement work",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Choose an owner for one work item against a roster and workload export
    Allocate(AllocateArgs),
    /// Print the effective rule evaluation order
    Rules(RulesArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::Allocate(args) => run_allocate(args, &config),
        Command::Rules(args) => run_rules(args, &config),
    }
}
