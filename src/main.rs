//! matchday - sports events and stats aggregator
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use std::process::ExitCode;

use clap::Parser;

use matchday::cli::{self, Cli};
use matchday::core::logging::{self, LogSettings};
use matchday::render::render_error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = LogSettings::resolve(cli.log_level(), cli.json_output, cli.verbose);
    logging::init(&settings);
    let json_errors = cli.json_output;

    match cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(code = e.error_code(), "Command failed");
            eprintln!("{}", render_error(&e, json_errors));
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
