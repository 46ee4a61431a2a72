//! Actionability probing.
//!
//! Decides, for one element snapshot, whether it is safe to act on:
//!
//! - **displayed**: native displayed state
//! - **enabled**: native enabled state
//! - **in_viewport**: bounding rect inside the window's inner dimensions
//! - **topmost_at_center**: the element at the rect's centre is the
//!   element itself or one of its descendants
//!
//! An element is clickable iff displayed, enabled and topmost. An element
//! outside the viewport is scrolled to the centre and re-measured rather
//! than rejected.

use crate::dom_scripts::PageScript;
use crate::driver::{Driver, ElementRef};
use crate::result::{SteadyError, SteadyResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Probe results for one element snapshot. Never reused across polls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionabilityReport {
    /// Native displayed state
    pub displayed: bool,
    /// Native enabled state
    pub enabled: bool,
    /// Inside the viewport (after any corrective scroll)
    pub in_viewport: bool,
    /// Topmost at the centre of its bounding rect
    pub topmost_at_center: bool,
}

impl ActionabilityReport {
    /// displayed ∧ enabled ∧ topmost at centre
    #[must_use]
    pub const fn is_clickable(&self) -> bool {
        self.displayed && self.enabled && self.topmost_at_center
    }
}

/// How ready an element must be before an operation proceeds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Readiness {
    /// Attached to the DOM
    Present,
    /// Displayed
    Visible,
    /// Displayed, enabled and topmost at its centre
    #[default]
    Clickable,
}

impl Readiness {
    /// Short name used in logs and errors
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Visible => "visible",
            Self::Clickable => "clickable",
        }
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs the actionability probes through a driver
#[derive(Debug)]
pub struct ActionabilityChecker<'a, D: Driver + ?Sized> {
    driver: &'a D,
}

impl<'a, D: Driver + ?Sized> ActionabilityChecker<'a, D> {
    /// Create a checker borrowing the session
    #[must_use]
    pub const fn new(driver: &'a D) -> Self {
        Self { driver }
    }

    /// Probe one element.
    ///
    /// Not-displayed elements short-circuit; no further probes are issued.
    pub async fn check(&self, element: &ElementRef) -> SteadyResult<ActionabilityReport> {
        let mut report = ActionabilityReport {
            displayed: self.driver.is_displayed(element).await?,
            ..ActionabilityReport::default()
        };
        if !report.displayed {
            debug!(%element, "not displayed");
            return Ok(report);
        }

        report.enabled = self.driver.is_enabled(element).await?;
        report.in_viewport = self.script_bool(element, &PageScript::InViewport).await?;
        if !report.in_viewport {
            debug!(%element, "outside viewport, scrolling to centre");
            self.driver
                .run_script(element, &PageScript::ScrollIntoCenter)
                .await?;
            report.in_viewport = self.script_bool(element, &PageScript::InViewport).await?;
        }
        report.topmost_at_center = self
            .script_bool(element, &PageScript::TopmostAtCenter)
            .await?;

        debug!(%element, ?report, "actionability");
        Ok(report)
    }

    /// Whether the element meets `readiness` right now
    pub async fn satisfies(&self, element: &ElementRef, readiness: Readiness) -> SteadyResult<bool> {
        match readiness {
            Readiness::Present => Ok(true),
            Readiness::Visible => self.driver.is_displayed(element).await,
            Readiness::Clickable => Ok(self.check(element).await?.is_clickable()),
        }
    }

    async fn script_bool(&self, element: &ElementRef, script: &PageScript) -> SteadyResult<bool> {
        let value = self.driver.run_script(element, script).await?;
        value.as_bool().ok_or_else(|| {
            SteadyError::script(format!("{} returned {value} instead of a boolean", script.name()))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::driver::mock::{MockDriver, MockElement};

    mod report_tests {
        use super::*;

        #[test]
        fn test_clickable_requires_all_three() {
            let ok = ActionabilityReport {
                displayed: true,
                enabled: true,
                in_viewport: false,
                topmost_at_center: true,
            };
            assert!(ok.is_clickable());
            assert!(!ActionabilityReport { enabled: false, ..ok }.is_clickable());
            assert!(!ActionabilityReport { displayed: false, ..ok }.is_clickable());
            assert!(!ActionabilityReport { topmost_at_center: false, ..ok }.is_clickable());
        }

        #[test]
        fn test_readiness_default_is_clickable() {
            assert_eq!(Readiness::default(), Readiness::Clickable);
            assert_eq!(Readiness::Visible.to_string(), "visible");
        }
    }

    mod checker_tests {
        use super::*;

        #[tokio::test]
        async fn test_hidden_element_short_circuits() {
            let driver = MockDriver::new();
            let el = driver.add("#x", MockElement::new("x").hidden());
            let report = ActionabilityChecker::new(&driver).check(&el).await.unwrap();

            assert!(!report.displayed);
            assert!(!driver.was_called("is_enabled"));
            assert!(!driver.was_called("run_script"));
        }

        #[tokio::test]
        async fn test_offscreen_element_is_scrolled_then_remeasured() {
            let driver = MockDriver::new();
            let el = driver.add("#x", MockElement::new("x").offscreen());
            let report = ActionabilityChecker::new(&driver).check(&el).await.unwrap();

            assert!(report.in_viewport);
            assert!(report.is_clickable());
            assert_eq!(driver.count("run_script:scroll_into_center"), 1);
            assert_eq!(driver.count("run_script:in_viewport"), 2);
        }

        #[tokio::test]
        async fn test_covered_element_is_not_clickable() {
            let driver = MockDriver::new();
            let el = driver.add("#x", MockElement::new("x").covered());
            let report = ActionabilityChecker::new(&driver).check(&el).await.unwrap();
            assert!(report.displayed && report.enabled);
            assert!(!report.is_clickable());
        }

        #[tokio::test]
        async fn test_readiness_levels() {
            let driver = MockDriver::new();
            let el = driver.add("#x", MockElement::new("x").disabled());
            let checker = ActionabilityChecker::new(&driver);

            assert!(checker.satisfies(&el, Readiness::Present).await.unwrap());
            assert!(checker.satisfies(&el, Readiness::Visible).await.unwrap());
            assert!(!checker.satisfies(&el, Readiness::Clickable).await.unwrap());
        }

        #[tokio::test]
        async fn test_check_error_propagates() {
            let driver = MockDriver::new();
            let el = driver.add("#x", MockElement::new("x"));
            driver.fail_probes(&el, "stale element reference");
            let err = ActionabilityChecker::new(&driver).check(&el).await.unwrap_err();
            assert!(matches!(err, SteadyError::Driver { .. }));
        }
    }
}
