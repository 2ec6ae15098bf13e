use std::process::ExitCode;

use clap::Parser;
use qhelper_lib::cli::{self, Cli};
use qhelper_lib::config::Config;
use qhelper_lib::error::{AppError, CommandError};
use qhelper_lib::prompt::TerminalPrompt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let as_json = cli.json;

    let result = match Config::from_env() {
        Ok(config) => cli::run(cli, config, TerminalPrompt::new()).await,
        Err(e) => Err(CommandError::from(AppError::from(e))),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            cli::report(as_json, &err);
            ExitCode::FAILURE
        }
    }
}
