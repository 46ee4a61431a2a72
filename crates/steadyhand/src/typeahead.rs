//! Debounce-aware autocomplete typing.
//!
//! Suggestion widgets tend to ignore bulk writes and populate their list
//! some time after the last keystroke. The typist therefore types one
//! character at a time and probes the suggestion list at a few prefix
//! lengths:
//!
//! ```text
//! attempt 1..=3:
//!   clear (click, clear, select-all + delete)
//!   for each char: type, wait 100ms
//!     if len >= 3 and (len == 3 or len even or len == full):
//!       wait settle delay, probe list -> click match => Selected
//!   field value == target (trimmed, case-insensitive) => Accepted
//!   cool down 2s
//! all attempts failed => press Tab => CommittedWithTab
//! ```

use crate::actionability::Readiness;
use crate::driver::{Driver, ElementRef, Key};
use crate::engine::InteractionEngine;
use crate::locator::{xpath_literal, Locator};
use crate::result::SteadyResult;
use crate::sink::EventOutcome;
use crate::wait::settle;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pause after every keystroke
pub const KEYSTROKE_DELAY: Duration = Duration::from_millis(100);

/// Attempts before falling back to Tab
pub const MAX_ATTEMPTS: u32 = 3;

/// Pause after a failed attempt
pub const ATTEMPT_COOLDOWN: Duration = Duration::from_secs(2);

/// Settle delay used by [`InteractionEngine::type_and_select_option`]
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(200);

/// How a rendered suggestion is chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// First candidate whose trimmed text equals the whole target, ignoring case
    #[default]
    MatchAll,
    /// First displayed candidate, whatever its text
    FirstVisible,
}

/// How a typeahead call ended
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum TypeaheadOutcome {
    /// A suggestion was clicked
    Selected {
        /// Attempt that selected (1-based)
        attempt: u32,
        /// Characters typed when the suggestion was clicked
        typed: usize,
        /// Text of the clicked suggestion
        text: String,
    },
    /// No suggestion clicked, but the field holds the target text
    Accepted {
        /// Attempt that succeeded (1-based)
        attempt: u32,
    },
    /// Every attempt failed; Tab was pressed to commit whatever is there
    CommittedWithTab {
        /// Field value when Tab was pressed
        final_value: String,
    },
}

impl TypeaheadOutcome {
    /// Whether the field was verified or a suggestion selected
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::CommittedWithTab { .. })
    }
}

/// Whether the suggestion list is probed after typing `typed` of `total` characters
#[must_use]
pub const fn should_probe(typed: usize, total: usize) -> bool {
    typed >= 3 && (typed == 3 || typed % 2 == 0 || typed == total)
}

/// Default suggestion locator: rows of a dynamic table containing `text`
#[must_use]
pub fn default_dropdown_xpath(text: &str) -> String {
    format!(
        "//*[starts-with(@class, 'oj-dynamic-table') and contains(text(), {})]",
        xpath_literal(text)
    )
}

fn matches_target(candidate: &str, target: &str) -> bool {
    candidate.trim().to_lowercase() == target.trim().to_lowercase()
}

/// State of one typeahead call
#[derive(Debug)]
struct TypingSession<'a> {
    target: &'a str,
    typed: String,
    attempt: u32,
    dropdown: Locator,
    mode: MatchMode,
}

impl<D: Driver + ?Sized> InteractionEngine<D> {
    /// Type into an autocomplete field and pick from its suggestion list.
    ///
    /// Never fails because of a missing suggestion: after three failed
    /// attempts Tab is pressed and [`TypeaheadOutcome::CommittedWithTab`]
    /// returned. Errors come only from the input itself (not found, not
    /// interactable, driver failures).
    pub async fn type_and_select(
        &mut self,
        locator: &str,
        text: &str,
        dropdown: &str,
        settle_delay: Duration,
        mode: MatchMode,
    ) -> SteadyResult<TypeaheadOutcome> {
        let parsed = Locator::parse(locator);
        let session = TypingSession {
            target: text,
            typed: String::with_capacity(text.len()),
            attempt: 0,
            dropdown: Locator::parse(dropdown),
            mode,
        };
        let work = async {
            let input = self.wait_for(&parsed, Readiness::Clickable).await?;
            self.run_session(&input, session, settle_delay).await
        };
        self.observe_with("type_and_select", parsed.query(), work, |outcome| {
            if outcome.is_success() {
                EventOutcome::Succeeded
            } else {
                EventOutcome::SoftFailed
            }
        })
        .await
    }

    /// [`Self::type_and_select`] against the default dynamic-table
    /// suggestions, matching the whole text, with a 200ms settle delay
    pub async fn type_and_select_option(
        &mut self,
        locator: &str,
        text: &str,
    ) -> SteadyResult<TypeaheadOutcome> {
        self.type_and_select(
            locator,
            text,
            &default_dropdown_xpath(text),
            DEFAULT_SETTLE_DELAY,
            MatchMode::MatchAll,
        )
        .await
    }

    async fn run_session(
        &self,
        input: &ElementRef,
        mut session: TypingSession<'_>,
        settle_delay: Duration,
    ) -> SteadyResult<TypeaheadOutcome> {
        let total = session.target.chars().count();

        while session.attempt < MAX_ATTEMPTS {
            session.attempt += 1;
            session.typed.clear();

            self.driver().click(input).await?;
            self.driver().clear(input).await?;
            self.driver().press_key(input, Key::SelectAll).await?;
            self.driver().press_key(input, Key::Delete).await?;

            for ch in session.target.chars() {
                session.typed.push(ch);
                self.driver().send_keys(input, &ch.to_string()).await?;
                settle(KEYSTROKE_DELAY).await;

                let typed = session.typed.chars().count();
                if !should_probe(typed, total) {
                    continue;
                }
                settle(settle_delay).await;
                if let Some(text) = self.probe_suggestions(&session).await {
                    info!(attempt = session.attempt, typed, option = %text, "suggestion selected");
                    return Ok(TypeaheadOutcome::Selected {
                        attempt: session.attempt,
                        typed,
                        text,
                    });
                }
            }

            let actual = self
                .driver()
                .property(input, "value")
                .await?
                .unwrap_or_default();
            if matches_target(&actual, session.target) {
                info!(attempt = session.attempt, value = %actual, "typed value accepted");
                return Ok(TypeaheadOutcome::Accepted {
                    attempt: session.attempt,
                });
            }
            warn!(
                attempt = session.attempt,
                expected = session.target,
                found = %actual,
                "text mismatch after attempt"
            );
            settle(ATTEMPT_COOLDOWN).await;
        }

        warn!(text = session.target, "all attempts failed, pressing Tab to continue");
        self.driver().press_key(input, Key::Tab).await?;
        let final_value = self
            .driver()
            .property(input, "value")
            .await?
            .unwrap_or_default();
        Ok(TypeaheadOutcome::CommittedWithTab { final_value })
    }

    /// Click the first acceptable suggestion, returning its text.
    ///
    /// A candidate that errors (for example because the list re-rendered)
    /// is skipped.
    async fn probe_suggestions(&self, session: &TypingSession<'_>) -> Option<String> {
        let candidates = match self.driver().find_all(&session.dropdown).await {
            Ok(found) => found,
            Err(err) => {
                debug!(error = %err, "suggestion query failed");
                return None;
            }
        };
        debug!(candidates = candidates.len(), typed = %session.typed, "probing suggestions");

        for candidate in candidates {
            let text = match session.mode {
                MatchMode::MatchAll => match self.driver().text(&candidate).await {
                    Ok(text) if matches_target(&text, session.target) => text,
                    Ok(_) => continue,
                    Err(err) => {
                        debug!(error = %err, "suggestion went stale");
                        continue;
                    }
                },
                MatchMode::FirstVisible => match self.driver().is_displayed(&candidate).await {
                    Ok(true) => self.driver().text(&candidate).await.unwrap_or_default(),
                    Ok(false) => continue,
                    Err(err) => {
                        debug!(error = %err, "suggestion went stale");
                        continue;
                    }
                },
            };
            let clicked = async {
                self.scroll_into_center(&candidate).await?;
                self.driver().click(&candidate).await
            }
            .await;
            match clicked {
                Ok(()) => return Some(text.trim().to_string()),
                Err(err) => debug!(error = %err, "suggestion click failed"),
            }
        }
        None
    }
}
