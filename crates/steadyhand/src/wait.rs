//! Bounded polling.
//!
//! Every "try until true or timeout" operation in the engine runs on a
//! [`PollClock`]: evaluate, and if not done sleep one poll interval
//! (capped to the remaining window) and evaluate again, until the window
//! closes. Element waits re-query *all* matches on every iteration and
//! probe them in document order, stopping at the first one that is ready.
//!
//! ```text
//! WAITING ──evaluate──► SUCCESS
//!    ▲          │
//!    └─ sleep ◄─┘ (window open)
//!               └────► TIMEOUT (window closed)
//! ```

use crate::actionability::{ActionabilityChecker, Readiness};
use crate::config::Settings;
use crate::driver::{Driver, ElementRef};
use crate::locator::Locator;
use crate::result::{SteadyError, SteadyResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default wait window (40 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 40;

/// Default pause between poll iterations (500ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

// =============================================================================
// RETRY POLICY
// =============================================================================

/// Wait window and poll spacing.
///
/// Invariant: `poll_interval < timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    timeout: Duration,
    poll_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl RetryPolicy {
    /// Create a policy, rejecting `poll_interval >= timeout`
    pub fn new(timeout: Duration, poll_interval: Duration) -> SteadyResult<Self> {
        if poll_interval >= timeout {
            return Err(SteadyError::InvalidPolicy {
                poll_ms: poll_interval.as_millis() as u64,
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        Ok(Self {
            timeout,
            poll_interval,
        })
    }

    /// Read `wait.timeout` (seconds) and `wait.poll_interval_ms`.
    ///
    /// A missing or unparsable timeout falls back to 40 seconds.
    pub fn from_settings(settings: &Settings) -> SteadyResult<Self> {
        let timeout_secs = match settings.get_u64("wait.timeout") {
            Some(secs) if secs > 0 => secs,
            _ => {
                info!(
                    default_secs = DEFAULT_TIMEOUT_SECS,
                    "wait.timeout missing or invalid, using default"
                );
                DEFAULT_TIMEOUT_SECS
            }
        };
        let poll_ms = settings
            .get_u64("wait.poll_interval_ms")
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        Self::new(
            Duration::from_secs(timeout_secs),
            Duration::from_millis(poll_ms),
        )
    }

    /// Wait window
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Pause between iterations
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Wait window in milliseconds
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

// =============================================================================
// POLL CLOCK
// =============================================================================

/// Deadline tracker for one wait
#[derive(Debug, Clone, Copy)]
pub struct PollClock {
    started: Instant,
    policy: RetryPolicy,
}

impl PollClock {
    /// Start the window now
    #[must_use]
    pub fn start(policy: RetryPolicy) -> Self {
        Self {
            started: Instant::now(),
            policy,
        }
    }

    /// Time since the window opened
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left in the window
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.policy.timeout.saturating_sub(self.elapsed())
    }

    /// Whether the window has closed
    #[must_use]
    pub fn expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Sleep one poll interval, capped to the remaining window
    pub async fn tick(&self) {
        let pause = self.policy.poll_interval.min(self.remaining());
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }
}

// =============================================================================
// POLL OUTCOME
// =============================================================================

/// Result of an element wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// An element became ready
    Ready {
        /// Document-order index among the matches of that iteration
        index: usize,
        /// The ready element
        element: ElementRef,
        /// Time spent waiting
        elapsed: Duration,
    },
    /// The window closed first
    TimedOut {
        /// Highest number of matches seen in any iteration
        matched: usize,
        /// Time spent waiting
        elapsed: Duration,
    },
}

impl PollOutcome {
    /// Convert to the ready element or a `NotFound`/`NotInteractable` error
    pub fn into_element(
        self,
        locator: &Locator,
        readiness: Readiness,
        policy: &RetryPolicy,
    ) -> SteadyResult<ElementRef> {
        match self {
            Self::Ready { element, .. } => Ok(element),
            Self::TimedOut { matched: 0, .. } => Err(SteadyError::NotFound {
                locator: locator.query().to_string(),
                timeout_ms: policy.timeout_ms(),
            }),
            Self::TimedOut { matched, .. } => Err(SteadyError::NotInteractable {
                locator: locator.query().to_string(),
                matched,
                wanted: readiness.to_string(),
                timeout_ms: policy.timeout_ms(),
            }),
        }
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Poll until an element matching `locator` meets `readiness`.
///
/// Each iteration re-queries every match and probes them in document
/// order. The first ready element wins and later ones are never probed.
/// A probe error rejects that element for the iteration only.
pub async fn wait_for_element<D: Driver + ?Sized>(
    driver: &D,
    locator: &Locator,
    readiness: Readiness,
    policy: &RetryPolicy,
) -> SteadyResult<PollOutcome> {
    let clock = PollClock::start(*policy);
    let checker = ActionabilityChecker::new(driver);
    let mut matched = 0;

    loop {
        let candidates = match driver.find_all(locator).await {
            Ok(found) => found,
            Err(err) => {
                debug!(%locator, error = %err, "query failed");
                Vec::new()
            }
        };
        matched = matched.max(candidates.len());

        for (index, element) in candidates.into_iter().enumerate() {
            match checker.satisfies(&element, readiness).await {
                Ok(true) => {
                    return Ok(PollOutcome::Ready {
                        index,
                        element,
                        elapsed: clock.elapsed(),
                    })
                }
                Ok(false) => debug!(%locator, index, %readiness, "candidate not ready"),
                Err(err) => debug!(%locator, index, error = %err, "probe failed, skipping"),
            }
        }

        if clock.expired() {
            return Ok(PollOutcome::TimedOut {
                matched,
                elapsed: clock.elapsed(),
            });
        }
        clock.tick().await;
    }
}

/// Poll `condition` until it holds, or fail with [`SteadyError::Timeout`].
///
/// Errors from the condition count as "not yet".
pub async fn poll_until<F, Fut>(
    policy: &RetryPolicy,
    waited_for: &str,
    mut condition: F,
) -> SteadyResult<Duration>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SteadyResult<bool>>,
{
    let clock = PollClock::start(*policy);
    loop {
        match condition().await {
            Ok(true) => return Ok(clock.elapsed()),
            Ok(false) => {}
            Err(err) => debug!(waited_for, error = %err, "condition errored"),
        }
        if clock.expired() {
            return Err(SteadyError::Timeout {
                ms: policy.timeout_ms(),
                waited_for: waited_for.to_string(),
            });
        }
        clock.tick().await;
    }
}

/// Fixed pause for browser-side rendering that has no completion signal
pub async fn settle(duration: Duration) {
    tokio::time::sleep(duration).await;
}

// =============================================================================
// TESTS
// =============================================================================
