//! # Preload CLI Application
//!
//! Command-line front end for `preload_core`. Every subcommand prints a
//! readable summary followed by its JSON result; `--json` prints the JSON
//! alone.
//!
//! Logs go to stderr. The filter comes from `PRELOAD_LOG` (e.g.
//! `PRELOAD_LOG=preload_core=debug`), defaulting to `warn`, or `debug`
//! with `-v`.

mod args;
mod commands;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use args::Cli;
use commands::Context;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("PRELOAD_LOG").unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let json_only = cli.global.json;
    let result = Context::new(cli.global).and_then(|ctx| commands::run(cli.command, &ctx));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::report_error(json_only, &e);
            ExitCode::from(1)
        }
    }
}
