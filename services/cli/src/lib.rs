mod cli;
mod commands;
mod demo;
mod infra;

use housing_allocation::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
