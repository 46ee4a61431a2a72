//! CLI configuration

use crate::commands::Cli;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use steadyhand::logging::{self, LogFormat};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Map the `-v` count and `-q` flag; quiet wins
    #[must_use]
    pub const fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Log filter directive; quiet keeps errors only
    #[must_use]
    pub fn log_directive(self) -> &'static str {
        match self {
            Self::Quiet => logging::QUIET_DIRECTIVE,
            Self::Normal => logging::directive_for(0),
            Self::Verbose => logging::directive_for(1),
            Self::Debug => logging::directive_for(2),
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stdout()),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Log line format
    pub log_format: LogFormat,
    /// Settings file, if any
    pub settings_path: Option<PathBuf>,
    /// Debugger address override
    pub debugger: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
            log_format: LogFormat::Pretty,
            settings_path: None,
            debugger: None,
        }
    }
}

impl CliConfig {
    /// Build from parsed arguments
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            verbosity: Verbosity::from_flags(cli.verbose, cli.quiet),
            color: cli.color.into(),
            log_format: if cli.json_logs {
                LogFormat::Json
            } else {
                LogFormat::Pretty
            },
            settings_path: cli.config.clone(),
            debugger: cli.debugger.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::Parser;

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_default_verbosity() {
            assert_eq!(Verbosity::default(), Verbosity::Normal);
        }

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(0, false), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(1, false), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(5, false), Verbosity::Debug);
            assert_eq!(Verbosity::from_flags(3, true), Verbosity::Quiet);
        }

        #[test]
        fn test_log_directive() {
            assert_eq!(Verbosity::Quiet.log_directive(), "error");
            assert_eq!(Verbosity::Normal.log_directive(), "warn,steadyhand=info");
            assert_eq!(Verbosity::Verbose.log_directive(), "info,steadyhand=debug");
            assert_eq!(Verbosity::Debug.log_directive(), "debug,steadyhand=trace");
        }

        #[test]
        fn test_is_verbose() {
            assert!(!Verbosity::Normal.is_verbose());
            assert!(Verbosity::Verbose.is_verbose());
            assert!(Verbosity::Debug.is_verbose());
        }
    }

    mod color_tests {
        use super::*;

        #[test]
        fn test_explicit_choices() {
            assert!(ColorChoice::Always.should_color());
            assert!(!ColorChoice::Never.should_color());
        }
    }

    mod from_cli_tests {
        use super::*;

        #[test]
        fn test_from_cli() {
            let cli = Cli::try_parse_from([
                "steadyhand",
                "--json-logs",
                "--color",
                "never",
                "-q",
                "--config",
                "run.yaml",
                "scroll",
                "#footer",
            ])
            .unwrap();
            let config = CliConfig::from_cli(&cli);
            assert_eq!(config.verbosity, Verbosity::Quiet);
            assert_eq!(config.color, ColorChoice::Never);
            assert_eq!(config.log_format, LogFormat::Json);
            assert_eq!(config.settings_path, Some(PathBuf::from("run.yaml")));
        }
    }
}
