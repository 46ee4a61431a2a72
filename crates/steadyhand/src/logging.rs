//! Log subscriber setup.
//!
//! The library only emits `tracing` events; binaries and test harnesses
//! call [`init`] once to print them to stderr. `STEADYHAND_LOG` (an `EnvFilter`
//! directive such as `steadyhand=trace`) overrides the verbosity.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive
pub const LOG_ENV: &str = "STEADYHAND_LOG";

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Filter directive for a verbosity count (`-v` repetitions)
#[must_use]
pub fn directive_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn,steadyhand=info",
        1 => "info,steadyhand=debug",
        _ => "debug,steadyhand=trace",
    }
}

/// Directive that keeps only errors
pub const QUIET_DIRECTIVE: &str = "error";

fn filter(directive: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(directive))
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed; the existing
/// one stays in place.
pub fn init(verbosity: u8, format: LogFormat) -> bool {
    init_with_directive(directive_for(verbosity), format)
}

/// Install the global subscriber with an explicit filter directive
pub fn init_with_directive(directive: &str, format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter(directive))
        .with_target(false);
    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}
