//! Steadyhand: resilient UI interaction engine for end-to-end tests
//!
//! Steadyhand drives an already-running browser session the way a patient
//! user would: every operation waits for its target to become actionable,
//! re-resolving the locator on each poll, then acts and verifies.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   STEADYHAND Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Locator    │    │ Polling    │    │ Action-    │            │
//! │   │ (XPath /   │───►│ Executor   │───►│ ability    │            │
//! │   │  CSS)      │    │ (wait)     │    │ Checker    │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │          ▲                 │                 │                   │
//! │          │                 ▼                 ▼                   │
//! │   ┌────────────┐    ┌────────────────────────────────┐          │
//! │   │ Typeahead  │───►│ InteractionEngine ──► Driver   │──► CDP   │
//! │   │ Navigator  │    │        │                       │   / Mock │
//! │   │ Forms      │    │        └──► InteractionSink    │          │
//! │   └────────────┘    └────────────────────────────────┘          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use steadyhand::prelude::*;
//!
//! # async fn demo() -> SteadyResult<()> {
//! let driver = Arc::new(MockDriver::new());
//! driver.add("#supplier", MockElement::input());
//! let mut engine = InteractionEngine::new(driver).await?;
//! engine.type_text("#supplier", "ACME").await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod actionability;
mod config;
mod context;
mod credentials;
mod dialog;
mod dom_scripts;
mod engine;
mod form;
mod locator;
mod navigator;
mod result;
mod sink;
mod typeahead;
mod wait;

/// Browser session seam and its implementations
pub mod driver;

/// Subscriber setup for binaries and test harnesses
pub mod logging;

pub use actionability::{ActionabilityChecker, ActionabilityReport, Readiness};
pub use config::{Settings, DEFAULT_DEBUGGER_ADDRESS, DEFAULT_REPORT_DIR};
pub use context::{RunContext, RunSummary, ScenarioContext};
pub use credentials::{
    CredentialProvider, Credentials, EnvCredentials, DOTENV_DIR_ENV, ENV_PREFIX,
};
pub use dialog::{Dialog, DialogAction, DialogKind};
pub use dom_scripts::PageScript;
pub use driver::{Driver, ElementRef, Gesture, Key};
pub use engine::{date_from_serial, ClickOutcome, InteractionEngine, UncheckPolicy};
pub use form::{FieldConfig, FieldKind, FieldResult, FieldStatus, FillReport, FormSpec};
pub use locator::{resolve, xpath_literal, BoundingBox, Locator, Point, Strategy};
pub use navigator::ShadowRoot;
pub use result::{SteadyError, SteadyResult};
pub use sink::{notify_all, EventOutcome, InteractionEvent, InteractionSink, MemorySink, TracingSink};
pub use typeahead::{
    default_dropdown_xpath, should_probe, MatchMode, TypeaheadOutcome, ATTEMPT_COOLDOWN,
    DEFAULT_SETTLE_DELAY, KEYSTROKE_DELAY, MAX_ATTEMPTS,
};
pub use wait::{
    poll_until, settle, wait_for_element, PollClock, PollOutcome, RetryPolicy,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_SECS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::actionability::*;
    pub use super::config::*;
    pub use super::context::*;
    pub use super::credentials::*;
    pub use super::dialog::*;
    #[cfg(feature = "browser")]
    pub use super::driver::cdp::CdpSession;
    pub use super::driver::mock::{MockDriver, MockElement, MockKind};
    pub use super::driver::*;
    pub use super::engine::*;
    pub use super::form::*;
    pub use super::locator::*;
    pub use super::navigator::*;
    pub use super::result::*;
    pub use super::sink::*;
    pub use super::typeahead::*;
    pub use super::wait::*;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    // ========================================================================
    // Public surface
    // ========================================================================

    mod surface_tests {
        use super::*;

        #[test]
        fn test_defaults_exported() {
            assert_eq!(DEFAULT_TIMEOUT_SECS, 40);
            assert_eq!(DEFAULT_POLL_INTERVAL_MS, 500);
            assert_eq!(RetryPolicy::default().timeout_ms(), 40_000);
        }

        #[test]
        fn test_prelude_resolves_strategies() {
            use crate::prelude::*;
            assert_eq!(resolve("//div"), Strategy::XPath);
            assert_eq!(resolve("div.row"), Strategy::Css);
        }
    }
}
