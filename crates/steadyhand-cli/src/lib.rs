//! Steadyhand CLI: resilient interactions from the command line
//!
//! Attaches to a Chromium started with `--remote-debugging-port` and runs
//! one interaction per invocation.
//!
//! ## Usage
//!
//! ```bash
//! steadyhand click "//button[text()='Save']"
//! steadyhand type "#name" "Ada Lovelace"
//! steadyhand typeahead "#city" "Paris" --dropdown "ul.suggestions li"
//! steadyhand fill form.yaml row.yaml --config run.yaml
//! steadyhand config
//! ```

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, FillArgs, LocatorArgs, ScreenshotArgs, SelectArgs, TypeArgs,
    TypeaheadArgs, UploadArgs, UploadMode,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::Printer;
pub use runner::{execute, load_settings, parse_data_row, run, show_settings};
