//! Result and error types for Steadyhand.
//!
//! Public operations wrap every internal failure in a single
//! [`SteadyError::OperationFailed`] carrying the operation name, the locator
//! and the original cause. The taxonomy variants (`NotFound`,
//! `NotInteractable`, `VerificationFailed`, `Timeout`) only surface through
//! that chain; use [`SteadyError::root_cause`] to inspect it.

use thiserror::Error;

/// Result type for Steadyhand operations
pub type SteadyResult<T> = Result<T, SteadyError>;

/// Errors that can occur in Steadyhand
#[derive(Debug, Error)]
pub enum SteadyError {
    /// No element matched the locator within the wait window
    #[error("No element matched '{locator}' within {timeout_ms}ms")]
    NotFound {
        /// Locator that was searched for
        locator: String,
        /// Wait window in milliseconds
        timeout_ms: u64,
    },

    /// Elements matched but none became actionable within the wait window
    #[error("'{locator}' matched {matched} element(s) but none became {wanted} within {timeout_ms}ms")]
    NotInteractable {
        /// Locator that was searched for
        locator: String,
        /// Highest number of matches seen in one iteration
        matched: usize,
        /// Readiness level that was required
        wanted: String,
        /// Wait window in milliseconds
        timeout_ms: u64,
    },

    /// A post-action check did not hold
    #[error("Verification failed: expected '{expected}' but found '{actual}'")]
    VerificationFailed {
        /// Expected value
        expected: String,
        /// Observed value
        actual: String,
    },

    /// A wait condition never became true
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// Wait window in milliseconds
        ms: u64,
        /// What was waited for
        waited_for: String,
    },

    /// A public operation failed; the cause is kept as the source
    #[error("{operation} failed for '{locator}'")]
    OperationFailed {
        /// Operation name
        operation: &'static str,
        /// Locator (or other subject) of the operation
        locator: String,
        /// Original cause
        #[source]
        source: Box<SteadyError>,
    },

    /// Browser driver command failed
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Script bridge evaluation failed
    #[error("Script evaluation failed: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Connection to the browser failed
    #[error("Failed to attach to browser at {address}: {message}")]
    ConnectionFailed {
        /// Debugger address
        address: String,
        /// Error message
        message: String,
    },

    /// Retry policy violates `poll_interval < timeout`
    #[error("Invalid retry policy: poll interval {poll_ms}ms must be shorter than timeout {timeout_ms}ms")]
    InvalidPolicy {
        /// Poll interval in milliseconds
        poll_ms: u64,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Credential lookup error
    #[error("Credentials unavailable for '{account}': {message}")]
    Credentials {
        /// Account name
        account: String,
        /// Error message
        message: String,
    },

    /// Invalid state error (operation called in wrong state)
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl SteadyError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a script error
    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Wrap `self` as the cause of a failed public operation
    #[must_use]
    pub fn wrap(self, operation: &'static str, locator: impl Into<String>) -> Self {
        Self::OperationFailed {
            operation,
            locator: locator.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error of an `OperationFailed` chain
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        let mut current = self;
        while let Self::OperationFailed { source, .. } = current {
            current = source.as_ref();
        }
        current
    }

    /// Every level of the cause chain joined with `": "`
    #[must_use]
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            rendered.push_str(": ");
            rendered.push_str(&err.to_string());
            cause = err.source();
        }
        rendered
    }

    /// Name of the failed operation, if this is a wrapped failure
    #[must_use]
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::OperationFailed { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}
