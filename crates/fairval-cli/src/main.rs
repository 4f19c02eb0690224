mod cli;
mod commands;
mod error;
mod logging;
mod metadata;
mod output;

use clap::Parser;
use std::process::ExitCode;

use crate::cli::Cli;
use crate::error::{CliError, ENVELOPE_ERROR_EXIT_CODE};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(&cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let envelope = commands::run(cli).await?;
    output::render(&envelope, cli.format, cli.pretty)?;

    if cli.strict && (!envelope.meta.warnings.is_empty() || !envelope.errors.is_empty()) {
        return Err(CliError::StrictModeViolation {
            warning_count: envelope.meta.warnings.len(),
            error_count: envelope.errors.len(),
        });
    }

    if !envelope.errors.is_empty() {
        return Ok(ExitCode::from(ENVELOPE_ERROR_EXIT_CODE));
    }

    Ok(ExitCode::SUCCESS)
}
