//! opencodebar - AI provider usage at a glance
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use opencodebar::cli::args::UsageArgs;
use opencodebar::cli::{Cli, Commands, OutputFormat};
use opencodebar::core::logging;
use opencodebar::storage::config::ENV_FORMAT;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(&logging::LogSettings::from_flags(
        cli.log_level.as_deref(),
        cli.json_output,
        cli.verbose,
    ));

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), "{e}");
            let format = error_format(&cli);
            let output =
                opencodebar::render::error::render_error(&e, format, cli.no_color, cli.pretty);
            eprintln!("{output}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: &Cli) -> opencodebar::Result<()> {
    match &cli.command {
        None => opencodebar::cli::usage::execute(cli, &UsageArgs::default()).await,
        Some(Commands::Usage(args)) => opencodebar::cli::usage::execute(cli, args).await,
        Some(Commands::Providers) => opencodebar::cli::providers::execute(cli),
    }
}

/// Format for error output. Config may be the thing that failed, so only
/// the command line and environment are consulted.
fn error_format(cli: &Cli) -> OutputFormat {
    cli.requested_format()
        .or_else(|| {
            std::env::var(ENV_FORMAT)
                .ok()
                .and_then(|v| OutputFormat::from_name(&v))
        })
        .unwrap_or_default()
}
