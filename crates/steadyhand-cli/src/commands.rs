//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Steadyhand: resilient interactions against an attached browser session
#[derive(Parser, Debug)]
#[command(name = "steadyhand")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Settings file (YAML)
    #[arg(short, long, global = true, env = "STEADYHAND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debugger address of the browser to attach to (overrides settings)
    #[arg(long, global = true, env = "STEADYHAND_DEBUGGER")]
    pub debugger: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Click the first clickable element matching a locator
    Click(LocatorArgs),

    /// Clear a field and type text into it
    Type(TypeArgs),

    /// Select a <select> option by its visible text
    Select(SelectArgs),

    /// Type into an autocomplete field and pick the matching suggestion
    Typeahead(TypeaheadArgs),

    /// Scroll an element to the viewport centre
    Scroll(LocatorArgs),

    /// Upload a file through a file input or drop zone
    Upload(UploadArgs),

    /// Fill a declared form from a data file
    Fill(FillArgs),

    /// Save a screenshot of the current tab
    Screenshot(ScreenshotArgs),

    /// Show the effective settings
    Config,
}

/// A single locator argument
#[derive(Parser, Debug)]
pub struct LocatorArgs {
    /// XPath (starting with `/` or `(`) or CSS selector
    pub locator: String,
}

/// Arguments for the type command
#[derive(Parser, Debug)]
pub struct TypeArgs {
    /// Field locator
    pub locator: String,
    /// Text to type; blank leaves the field unchanged
    pub text: String,
}

/// Arguments for the select command
#[derive(Parser, Debug)]
pub struct SelectArgs {
    /// `<select>` locator
    pub locator: String,
    /// Visible option text
    pub value: String,
}

/// Arguments for the typeahead command
#[derive(Parser, Debug)]
pub struct TypeaheadArgs {
    /// Input locator
    pub locator: String,
    /// Target text
    pub text: String,
    /// Locator of the suggestion items (defaults to the dynamic-table list)
    #[arg(long)]
    pub dropdown: Option<String>,
    /// Delay before each suggestion probe, in milliseconds
    #[arg(long, default_value = "200")]
    pub settle_ms: u64,
    /// Pick the first visible suggestion instead of an exact match
    #[arg(long)]
    pub first_visible: bool,
}

/// How an upload reaches the page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum UploadMode {
    /// Visible file input
    #[default]
    Visible,
    /// Hidden file input, revealed first
    Hidden,
    /// Drop onto a drop zone
    Drop,
}

/// Arguments for the upload command
#[derive(Parser, Debug)]
pub struct UploadArgs {
    /// File input or drop zone locator
    pub locator: String,
    /// File to upload
    pub path: PathBuf,
    /// Upload mode
    #[arg(long, value_enum, default_value = "visible")]
    pub mode: UploadMode,
}

/// Arguments for the fill command
#[derive(Parser, Debug)]
pub struct FillArgs {
    /// Form declaration (YAML)
    pub form: PathBuf,
    /// Data row (YAML or JSON mapping of field name to value)
    pub data: PathBuf,
}

/// Arguments for the screenshot command
#[derive(Parser, Debug)]
pub struct ScreenshotArgs {
    /// Output file; defaults to the run's report directory
    pub path: Option<PathBuf>,
}

/// Color argument for CLI
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_click() {
            let cli = Cli::try_parse_from(["steadyhand", "click", "//button[@id='save']"]).unwrap();
            match cli.command {
                Commands::Click(args) => assert_eq!(args.locator, "//button[@id='save']"),
                other => panic!("expected Click, got {other:?}"),
            }
        }

        #[test]
        fn test_global_flags_after_subcommand() {
            let cli = Cli::try_parse_from([
                "steadyhand",
                "type",
                "#name",
                "Ada",
                "-vv",
                "--debugger",
                "localhost:9333",
            ])
            .unwrap();
            assert_eq!(cli.verbose, 2);
            assert_eq!(cli.debugger.as_deref(), Some("localhost:9333"));
        }

        #[test]
        fn test_missing_subcommand_is_error() {
            assert!(Cli::try_parse_from(["steadyhand"]).is_err());
        }

        #[test]
        fn test_type_requires_text() {
            assert!(Cli::try_parse_from(["steadyhand", "type", "#name"]).is_err());
        }
    }

    mod typeahead_tests {
        use super::*;

        #[test]
        fn test_typeahead_defaults() {
            let cli = Cli::try_parse_from(["steadyhand", "typeahead", "#city", "Paris"]).unwrap();
            let Commands::Typeahead(args) = cli.command else {
                panic!("expected Typeahead");
            };
            assert_eq!(args.settle_ms, 200);
            assert!(args.dropdown.is_none());
            assert!(!args.first_visible);
        }

        #[test]
        fn test_typeahead_options() {
            let cli = Cli::try_parse_from([
                "steadyhand",
                "typeahead",
                "#city",
                "Paris",
                "--dropdown",
                "ul li",
                "--settle-ms",
                "0",
                "--first-visible",
            ])
            .unwrap();
            let Commands::Typeahead(args) = cli.command else {
                panic!("expected Typeahead");
            };
            assert_eq!(args.dropdown.as_deref(), Some("ul li"));
            assert_eq!(args.settle_ms, 0);
            assert!(args.first_visible);
        }
    }

    mod upload_tests {
        use super::*;

        #[test]
        fn test_upload_mode() {
            let cli = Cli::try_parse_from([
                "steadyhand",
                "upload",
                "#drop",
                "invoice.pdf",
                "--mode",
                "drop",
            ])
            .unwrap();
            let Commands::Upload(args) = cli.command else {
                panic!("expected Upload");
            };
            assert_eq!(args.mode, UploadMode::Drop);
            assert_eq!(args.path, PathBuf::from("invoice.pdf"));
        }

        #[test]
        fn test_unknown_upload_mode_rejected() {
            assert!(Cli::try_parse_from([
                "steadyhand",
                "upload",
                "#f",
                "a.txt",
                "--mode",
                "teleport"
            ])
            .is_err());
        }
    }
}
