//! Woodex command-line tools

use std::{path::Path, process::ExitCode};

use clap::Parser;
use tracing::{error, warn};

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    let env_file = woodex::config::load_env_file(Path::new(".env"));

    let cli = cli::Cli::parse();

    if let Err(error) = woodex::observability::init_subscriber(&cli.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized, must use eprintln for this error"
        )]
        {
            eprintln!("{error}");
        }

        return ExitCode::FAILURE;
    }

    if let Err(error) = env_file {
        warn!(%error, "ignoring unreadable .env file");
    }

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            ExitCode::FAILURE
        }
    }
}
