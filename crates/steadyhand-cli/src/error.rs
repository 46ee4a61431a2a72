//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// An interaction did not complete
    #[error("Interaction incomplete: {message}")]
    Incomplete {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data file parse error
    #[error("Data file error: {0}")]
    Data(#[from] serde_yaml_ng::Error),

    /// Steadyhand library error
    #[error(transparent)]
    Steady(#[from] steadyhand::SteadyError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an incomplete-interaction error
    #[must_use]
    pub fn incomplete(message: impl Into<String>) -> Self {
        Self::Incomplete {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad config");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad config"));
    }

    #[test]
    fn test_invalid_argument_error() {
        let err = CliError::invalid_argument("bad arg");
        assert!(err.to_string().contains("Invalid argument"));
    }

    #[test]
    fn test_incomplete_error() {
        let err = CliError::incomplete("click timed out");
        assert!(err.to_string().contains("click timed out"));
    }

    #[test]
    fn test_library_error_is_transparent() {
        let err: CliError = steadyhand::SteadyError::driver("socket closed").into();
        assert_eq!(err.to_string(), "Driver error: socket closed");
    }

    #[test]
    fn test_library_cause_is_reachable_once() {
        let err: CliError = steadyhand::SteadyError::driver("socket closed")
            .wrap("click", "#save")
            .into();
        assert_eq!(err.to_string(), "click failed for '#save'");
        let cause = std::error::Error::source(&err).unwrap();
        assert_eq!(cause.to_string(), "Driver error: socket closed");
        assert!(cause.source().is_none());
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.to_string().contains("I/O"));
    }
}
