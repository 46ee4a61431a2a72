//! Steadyhand CLI entry point
//!
//! ```bash
//! steadyhand click "#submit"              # Click the first clickable match
//! steadyhand upload "#drop" a.pdf --mode drop
//! steadyhand screenshot                   # Into the run's report directory
//! ```

use clap::Parser;
use std::process::ExitCode;
use steadyhand::logging;
use steadyhand_cli::{Cli, CliConfig, CliResult};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            let mut cause = std::error::Error::source(&e);
            while let Some(inner) = cause {
                eprintln!("  caused by: {inner}");
                cause = inner.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = CliConfig::from_cli(&cli);
    logging::init_with_directive(config.verbosity.log_directive(), config.log_format);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(steadyhand_cli::run(&config, &cli.command))
}
