mod cli;
mod commands;
mod infra;

use case_allocation::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
