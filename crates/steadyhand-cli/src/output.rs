//! Output formatting

use console::{style, Term};
use steadyhand::{FieldStatus, FillReport};

/// Styled status lines on stdout; errors go to stderr
#[derive(Debug)]
pub struct Printer {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Printer {
    /// Create a new printer
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            use_color,
            quiet,
        }
    }

    /// Completed action
    pub fn success(&self, message: &str) {
        let mark = if self.use_color {
            style("✓").green().to_string()
        } else {
            "✓".to_string()
        };
        self.line(&format!("{mark} {message}"));
    }

    /// Completed with a caveat
    pub fn warn(&self, message: &str) {
        let mark = if self.use_color {
            style("!").yellow().to_string()
        } else {
            "!".to_string()
        };
        self.line(&format!("{mark} {message}"));
    }

    /// Indented key/value line
    pub fn field(&self, key: &str, value: &str) {
        let key = if self.use_color {
            style(key).cyan().to_string()
        } else {
            key.to_string()
        };
        self.line(&format!("  {key}: {value}"));
    }

    /// One line per form field
    pub fn fill_report(&self, report: &FillReport) {
        for field in &report.fields {
            let status = match &field.status {
                FieldStatus::Filled => "filled".to_string(),
                FieldStatus::SoftFailed => "entered, unverified".to_string(),
                FieldStatus::Skipped => "skipped".to_string(),
                FieldStatus::Failed { message } => format!("FAILED ({message})"),
            };
            self.field(&field.name, &status);
        }
    }

    fn line(&self, text: &str) {
        if self.quiet {
            return;
        }
        let _ = self.term.write_line(text);
    }
}
