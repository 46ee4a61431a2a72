//! YAML settings with dotted-key lookup.
//!
//! ```yaml
//! wait:
//!   timeout: 40            # seconds
//!   poll_interval_ms: 500
//! session:
//!   debugger_address: 127.0.0.1:9222
//! report:
//!   dir: target/steadyhand-reports
//!   name: regression
//!   title: Nightly regression
//! checkbox:
//!   uncheck: log-only      # or "click"
//! ```
//!
//! Lookups never fail: a missing key or a value of the wrong shape is
//! `None`, and each consumer picks its own default.

use crate::result::SteadyResult;
use serde_yaml_ng::Value;
use std::path::{Path, PathBuf};

/// Default debugger address of an attached browser
pub const DEFAULT_DEBUGGER_ADDRESS: &str = "127.0.0.1:9222";

/// Default report root
pub const DEFAULT_REPORT_DIR: &str = "target/steadyhand-reports";

/// Parsed settings document
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    root: Value,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: Value::Null,
        }
    }
}

impl Settings {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> SteadyResult<Self> {
        let root: Value = serde_yaml_ng::from_str(yaml)?;
        Ok(Self { root })
    }

    /// Read and parse a YAML file
    pub fn load(path: impl AsRef<Path>) -> SteadyResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Raw value at a dotted key such as `wait.timeout`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut current = &self.root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Scalar at `key` rendered as a trimmed string
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Unsigned integer at `key`, accepting numeric strings
    #[must_use]
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean at `key`, accepting `"true"`/`"false"` strings
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// `session.debugger_address`, or `127.0.0.1:9222`
    #[must_use]
    pub fn debugger_address(&self) -> String {
        self.get_str("session.debugger_address")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_DEBUGGER_ADDRESS.to_string())
    }

    /// `report.dir`, or `target/steadyhand-reports`
    #[must_use]
    pub fn report_dir(&self) -> PathBuf {
        self.get_str("report.dir")
            .filter(|s| !s.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR), PathBuf::from)
    }

    /// `report.name`, or `run`
    #[must_use]
    pub fn report_name(&self) -> String {
        self.get_str("report.name")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "run".to_string())
    }

    /// `report.title`, falling back to the report name
    #[must_use]
    pub fn report_title(&self) -> String {
        self.get_str("report.title")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.report_name())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "
wait:
  timeout: '12'
  poll_interval_ms: 250
session:
  debugger_address: ' localhost:9333 '
report:
  name: smoke
checkbox:
  uncheck: click
flags:
  strict: 'true'
";

    mod lookup_tests {
        use super::*;

        #[test]
        fn test_dotted_lookup() {
            let s = Settings::from_yaml_str(SAMPLE).unwrap();
            assert_eq!(s.get_u64("wait.timeout"), Some(12));
            assert_eq!(s.get_u64("wait.poll_interval_ms"), Some(250));
            assert_eq!(s.get_str("checkbox.uncheck").as_deref(), Some("click"));
            assert_eq!(s.get_bool("flags.strict"), Some(true));
        }

        #[test]
        fn test_missing_and_malformed_are_none() {
            let s = Settings::from_yaml_str(SAMPLE).unwrap();
            assert!(s.get("wait.missing").is_none());
            assert!(s.get_u64("checkbox.uncheck").is_none());
            assert!(s.get_str("wait").is_none());
        }

        #[test]
        fn test_empty_settings() {
            let s = Settings::default();
            assert!(s.get_u64("wait.timeout").is_none());
            assert_eq!(s.debugger_address(), DEFAULT_DEBUGGER_ADDRESS);
        }
    }

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_session_and_report_values() {
            let s = Settings::from_yaml_str(SAMPLE).unwrap();
            assert_eq!(s.debugger_address(), "localhost:9333");
            assert_eq!(s.report_dir(), PathBuf::from(DEFAULT_REPORT_DIR));
            assert_eq!(s.report_name(), "smoke");
            assert_eq!(s.report_title(), "smoke");
        }
    }

    mod file_tests {
        use super::*;

        #[test]
        fn test_load_from_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "wait:\n  timeout: 3").unwrap();
            let s = Settings::load(file.path()).unwrap();
            assert_eq!(s.get_u64("wait.timeout"), Some(3));
        }

        #[test]
        fn test_invalid_yaml_is_error() {
            assert!(Settings::from_yaml_str("wait: [unclosed").is_err());
        }
    }
}
