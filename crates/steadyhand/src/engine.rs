//! Interaction engine.
//!
//! The public operation surface. Every operation takes a raw locator
//! string, classifies it, waits on a [`PollClock`](crate::wait::PollClock)
//! until a matching element is ready, then acts through the driver.
//!
//! Failures leave each operation as exactly one
//! [`SteadyError::OperationFailed`] naming the operation and locator, with
//! the taxonomy error (`NotFound`, `NotInteractable`, `VerificationFailed`,
//! `Timeout`) as its source. [`InteractionEngine::click`] is the exception:
//! it is best-effort and reports a timeout as [`ClickOutcome::TimedOut`].
//!
//! Operations take `&mut self` so one engine never has two interactions
//! in flight.

use crate::actionability::Readiness;
use crate::config::Settings;
use crate::dom_scripts::PageScript;
use crate::driver::{Driver, ElementRef, Gesture, Key};
use crate::locator::{xpath_literal, Locator};
use crate::result::{SteadyError, SteadyResult};
use crate::sink::{notify_all, EventOutcome, InteractionEvent, InteractionSink};
use crate::wait::{poll_until, settle, wait_for_element, PollOutcome, RetryPolicy};
use chrono::{Duration as DayCount, NaiveDate};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Pause after opening a menu before looking for its option
const MENU_OPEN_DELAY: Duration = Duration::from_millis(500);

/// Pause after a menu option is clicked
const MENU_CLOSE_DELAY: Duration = Duration::from_millis(1000);

// =============================================================================
// POLICIES & OUTCOMES
// =============================================================================

/// What `set_checkbox_state(locator, false)` does to a checked box
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UncheckPolicy {
    /// Log that the box would be unchecked; leave it checked
    #[default]
    LogOnly,
    /// Click the box to uncheck it
    Click,
}

impl FromStr for UncheckPolicy {
    type Err = SteadyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "log-only" | "log" => Ok(Self::LogOnly),
            "click" => Ok(Self::Click),
            other => Err(SteadyError::config(format!(
                "checkbox.uncheck must be 'log-only' or 'click', got '{other}'"
            ))),
        }
    }
}

/// Result of the best-effort click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum ClickOutcome {
    /// A matching element was clicked
    Clicked {
        /// Document-order index of the clicked match
        index: usize,
    },
    /// No match became clickable within the window; nothing was clicked
    TimedOut {
        /// Time spent waiting
        elapsed: Duration,
    },
}

impl ClickOutcome {
    /// Whether an element was clicked
    #[must_use]
    pub const fn is_clicked(&self) -> bool {
        matches!(self, Self::Clicked { .. })
    }
}

/// Convert a spreadsheet day serial to a date.
///
/// Counts days from 1899-12-30, which matches spreadsheet serials for every
/// date after February 1900.
#[must_use]
pub fn date_from_serial(serial: i64) -> Option<NaiveDate> {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(DayCount::try_days(serial)?)
}

// =============================================================================
// ENGINE
// =============================================================================

/// Public interaction surface over a borrowed browser session
pub struct InteractionEngine<D: Driver + ?Sized> {
    driver: Arc<D>,
    policy: RetryPolicy,
    original_tab: String,
    uncheck: UncheckPolicy,
    sinks: Vec<Arc<dyn InteractionSink>>,
}

impl<D: Driver + ?Sized> fmt::Debug for InteractionEngine<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionEngine")
            .field("policy", &self.policy)
            .field("original_tab", &self.original_tab)
            .field("uncheck", &self.uncheck)
            .field("sinks", &self.sinks.len())
            .finish_non_exhaustive()
    }
}

impl<D: Driver + ?Sized> InteractionEngine<D> {
    /// Wrap a session, capturing the current tab as the original one
    pub async fn new(driver: Arc<D>) -> SteadyResult<Self> {
        let original_tab = driver.current_window().await?;
        debug!(%original_tab, "engine attached");
        Ok(Self {
            driver,
            policy: RetryPolicy::default(),
            original_tab,
            uncheck: UncheckPolicy::default(),
            sinks: Vec::new(),
        })
    }

    /// Wrap a session with policies read from settings
    pub async fn from_settings(driver: Arc<D>, settings: &Settings) -> SteadyResult<Self> {
        let uncheck = match settings.get_str("checkbox.uncheck") {
            Some(raw) => raw.parse()?,
            None => UncheckPolicy::default(),
        };
        Ok(Self::new(driver)
            .await?
            .with_policy(RetryPolicy::from_settings(settings)?)
            .with_uncheck_policy(uncheck))
    }

    /// Replace the retry policy
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the uncheck policy
    #[must_use]
    pub fn with_uncheck_policy(mut self, uncheck: UncheckPolicy) -> Self {
        self.uncheck = uncheck;
        self
    }

    /// Register a notification sink
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn InteractionSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// The borrowed session
    #[must_use]
    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    /// Current retry policy
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Handle of the tab that was current when the engine was built
    #[must_use]
    pub fn original_tab(&self) -> &str {
        &self.original_tab
    }

    // -------------------------------------------------------------------------
    // shared plumbing
    // -------------------------------------------------------------------------

    pub(crate) async fn wait_for(
        &self,
        locator: &Locator,
        readiness: Readiness,
    ) -> SteadyResult<ElementRef> {
        wait_for_element(self.driver.as_ref(), locator, readiness, &self.policy)
            .await?
            .into_element(locator, readiness, &self.policy)
    }

    pub(crate) async fn scroll_into_center(&self, element: &ElementRef) -> SteadyResult<()> {
        self.driver
            .run_script(element, &PageScript::ScrollIntoCenter)
            .await?;
        Ok(())
    }

    pub(crate) fn notify(
        &self,
        operation: &str,
        subject: &str,
        outcome: EventOutcome,
        started: Instant,
    ) {
        if self.sinks.is_empty() {
            return;
        }
        let event = InteractionEvent::new(operation, subject, outcome, started.elapsed());
        notify_all(&self.sinks, &event);
    }

    /// Run one public operation: notify sinks and wrap any failure
    pub(crate) async fn observe<T, F>(
        &self,
        operation: &'static str,
        subject: &str,
        work: F,
    ) -> SteadyResult<T>
    where
        F: Future<Output = SteadyResult<T>>,
    {
        self.observe_with(operation, subject, work, |_| EventOutcome::Succeeded)
            .await
    }

    /// Like [`Self::observe`], classifying successful results for the sinks
    pub(crate) async fn observe_with<T, F, C>(
        &self,
        operation: &'static str,
        subject: &str,
        work: F,
        classify: C,
    ) -> SteadyResult<T>
    where
        F: Future<Output = SteadyResult<T>>,
        C: FnOnce(&T) -> EventOutcome,
    {
        let started = Instant::now();
        match work.await {
            Ok(value) => {
                self.notify(operation, subject, classify(&value), started);
                Ok(value)
            }
            Err(err) => {
                let err = err.wrap(operation, subject);
                self.notify(
                    operation,
                    subject,
                    EventOutcome::Failed {
                        message: err.chain(),
                    },
                    started,
                );
                Err(err)
            }
        }
    }

    // -------------------------------------------------------------------------
    // click & keyboard
    // -------------------------------------------------------------------------

    /// Best-effort click on the first clickable match.
    ///
    /// Matches are probed in document order on every poll; later matches
    /// are never probed once one qualifies. When the window closes first,
    /// nothing is clicked and [`ClickOutcome::TimedOut`] is returned.
    pub async fn click(&mut self, locator: &str) -> SteadyResult<ClickOutcome> {
        let parsed = Locator::parse(locator);
        let work = async {
            let poll = wait_for_element(
                self.driver.as_ref(),
                &parsed,
                Readiness::Clickable,
                &self.policy,
            )
            .await?;
            match poll {
                PollOutcome::Ready { index, element, .. } => {
                    self.driver.click(&element).await?;
                    info!(locator = %parsed, index, "clicked");
                    Ok(ClickOutcome::Clicked { index })
                }
                PollOutcome::TimedOut { matched, elapsed } => {
                    warn!(
                        locator = %parsed,
                        matched,
                        timeout_ms = self.policy.timeout_ms(),
                        "click timed out, nothing clicked"
                    );
                    Ok(ClickOutcome::TimedOut { elapsed })
                }
            }
        };
        self.observe_with("click", parsed.query(), work, |outcome| {
            if outcome.is_clicked() {
                EventOutcome::Succeeded
            } else {
                EventOutcome::SoftFailed
            }
        })
        .await
    }

    /// Click, clear and type `text` in one operation.
    ///
    /// Blank or whitespace-only text is a no-op: the field keeps its value.
    pub async fn type_text(&mut self, locator: &str, text: &str) -> SteadyResult<()> {
        if text.trim().is_empty() {
            debug!(locator, "blank text, leaving field unchanged");
            return Ok(());
        }
        let parsed = Locator::parse(locator);
        self.observe("type_text", parsed.query(), async {
            let element = self.wait_for(&parsed, Readiness::Clickable).await?;
            self.scroll_into_center(&element).await?;
            self.driver.click(&element).await?;
            self.driver.clear(&element).await?;
            self.driver.send_keys(&element, text).await?;
            info!(locator = %parsed, "entered text");
            Ok(())
        })
        .await
    }

    /// Select all of the field's text and delete it
    pub async fn clear_field(&mut self, locator: &str) -> SteadyResult<()> {
        let parsed = Locator::parse(locator);
        self.observe("clear_field", parsed.query(), async {
            let element = self.wait_for(&parsed, Readiness::Clickable).await?;
            self.driver.press_key(&element, Key::SelectAll).await?;
            self.driver.press_key(&element, Key::Delete).await?;
            Ok(())
        })
        .await
    }

    /// Click the field, move to the end and press `key`
    pub async fn send_key_chord(&mut self, locator: &str, key: Key) -> SteadyResult<()> {
        let parsed = Locator::parse(locator);
        self.observe("send_key_chord", parsed.query(), async {
            let element = self.wait_for(&parsed, Readiness::Clickable).await?;
            self.driver.click(&element).await?;
            self.driver.press_key(&element, Key::End).await?;
            self.driver.press_key(&element, key).await?;
            Ok(())
        })
        .await
    }

    // -------------------------------------------------------------------------
    // selection state
    // -------------------------------------------------------------------------

    /// Select a `<select>` option by its visible text
    pub async fn select_dropdown_by_text(&mut self, locator: &str, value: &str) -> SteadyResult<()> {
        let parsed = Locator::parse(locator);
        self.observe("select_dropdown_by_text", parsed.query(), async {
            let element = self.wait_for(&parsed, Readiness::Clickable).await?;
            let result = self
                .driver
                .run_script(&element, &PageScript::SelectOptionByText(value.to_string()))
                .await?;
            match result.as_str() {
                Some("selected") => {
                    info!(locator = %parsed, value, "selected option");
                    Ok(())
                }
                Some("unchanged") => {
                    info!(locator = %parsed, value, "option already selected");
                    Ok(())
                }
                _ => Err(SteadyError::VerificationFailed {
                    expected: format!("option '{value}'"),
                    actual: "no option with that text".to_string(),
                }),
            }
        })
        .await
    }

    /// Select a radio button unless it already is
    pub async fn select_radio(&mut self, locator: &str) -> SteadyResult<()> {
        let parsed = Locator::parse(locator);
        self.observe("select_radio", parsed.query(), async {
            let element = self.wait_for(&parsed, Readiness::Clickable).await?;
            if self.driver.is_selected(&element).await? {
                info!(locator = %parsed, "radio already selected");
                return Ok(());
            }
            self.scroll_into_center(&element).await?;
            self.driver.click(&element).await?;
            info!(locator = %parsed, "radio selected");
            Ok(())
        })
        .await
    }

    /// Bring a checkbox to `desired`, clicking only when needed.
    ///
    /// Unchecking follows the engine's [`UncheckPolicy`].
    pub async fn set_checkbox_state(&mut self, locator: &str, desired: bool) -> SteadyResult<()> {
        let parsed = Locator::parse(locator);
        self.observe("set_checkbox_state", parsed.query(), async {
            let element = self.wait_for(&parsed, Readiness::Clickable).await?;
            let checked = self.driver.is_selected(&element).await?;
            match (desired, checked) {
                (true, false) => {
                    self.driver.click(&element).await?;
                    info!(locator = %parsed, "checkbox checked");
                }
                (false, true) => match self.uncheck {
                    UncheckPolicy::LogOnly => {
                        warn!(locator = %parsed, "checkbox would be unchecked; uncheck policy is log-only");
                    }
                    UncheckPolicy::Click => {
                        self.driver.click(&element).await?;
                        info!(locator = %parsed, "checkbox unchecked");
                    }
                },
                _ => info!(locator = %parsed, desired, "checkbox already in requested state"),
            }
            Ok(())
        })
        .await
    }

    /// Open a custom dropdown and click the entry whose `title` is `value`
    pub async fn select_option_by_clicks(&mut self, locator: &str, value: &str) -> SteadyResult<()> {
        let parsed = Locator::parse(locator);
        self.observe("select_option_by_clicks", parsed.query(), async {
            let opener = self.wait_for(&parsed, Readiness::Clickable).await?;
            self.driver.click(&opener).await?;
            let option = Locator::parse(&format!("//*[@title={}]", xpath_literal(value)));
            let entry = self.wait_for(&option, Readiness::Clickable).await?;
            self.driver.click(&entry).await?;
            info!(locator = %parsed, value, "selected entry");
            Ok(())
        })
        .await
    }

    /// Click `input`, wait for `items` to render, then click the item whose
    /// trimmed text equals `value` case-insensitively
    pub async fn select_from_dynamic_list(
        &mut self,
        input: &str,
        items: &str,
        value: &str,
    ) -> SteadyResult<()> {
        let input_locator = Locator::parse(input);
        let items_locator = Locator::parse(items);
        self.observe("select_from_dynamic_list", input_locator.query(), async {
            let field = self.wait_for(&input_locator, Readiness::Clickable).await?;
            self.driver.click(&field).await?;
            self.wait_for(&items_locator, Readiness::Visible).await?;

            let wanted = value.trim();
            let mut seen = Vec::new();
            for item in self.driver.find_all(&items_locator).await? {
                let text = self.driver.text(&item).await?;
                if text.trim().eq_ignore_ascii_case(wanted) {
                    self.scroll_into_center(&item).await?;
                    self.driver.click(&item).await?;
                    info!(value = wanted, "selected list item");
                    return Ok(());
                }
                seen.push(text.trim().to_string());
            }
            Err(SteadyError::VerificationFailed {
                expected: wanted.to_string(),
                actual: format!("list of [{}]", seen.join(", ")),
            })
        })
        .await
    }

    /// Open a menu, then script-click one of its options.
    ///
    /// The option click does not go through actionability checks; menu
    /// entries are often covered by their own animation layer.
    pub async fn select_menu_option(&mut self, menu: &str, option: &str) -> SteadyResult<()> {
        let menu_locator = Locator::parse(menu);
        let option_locator = Locator::parse(option);
        self.observe("select_menu_option", menu_locator.query(), async {
            self.wait_for(&menu_locator, Readiness::Visible).await?;
            let poll = wait_for_element(
                self.driver.as_ref(),
                &menu_locator,
                Readiness::Clickable,
                &self.policy,
            )
            .await?;
            match poll {
                PollOutcome::Ready { element, .. } => self.driver.click(&element).await?,
                PollOutcome::TimedOut { .. } => {
                    warn!(menu = %menu_locator, "menu never became clickable, trying option anyway");
                }
            }
            settle(MENU_OPEN_DELAY).await;
            let entry = self.wait_for(&option_locator, Readiness::Present).await?;
            self.driver
                .run_script(&entry, &PageScript::ScriptClick)
                .await?;
            settle(MENU_CLOSE_DELAY).await;
            info!(menu = %menu_locator, option = %option_locator, "menu option clicked");
            Ok(())
        })
        .await
    }

    /// Type a spreadsheet day serial into a date field as `dd/MM/yyyy`, then Tab
    pub async fn select_date_from_calendar(&mut self, locator: &str, serial: &str) -> SteadyResult<()> {
        let parsed = Locator::parse(locator);
        self.observe("select_date_from_calendar", parsed.query(), async {
            let date = serial
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(date_from_serial)
                .ok_or_else(|| SteadyError::InvalidState {
                    message: format!("'{serial}' is not a spreadsheet day serial"),
                })?;
            let formatted = date.format("%d/%m/%Y").to_string();
            let element = self.wait_for(&parsed, Readiness::Clickable).await?;
            self.driver.click(&element).await?;
            self.driver.clear(&element).await?;
            self.driver.send_keys(&element, &formatted).await?;
            self.driver.press_key(&element, Key::Tab).await?;
            info!(locator = %parsed, date = %formatted, "date entered");
            Ok(())
        })
        .await
    }

    // -------------------------------------------------------------------------
    // pointer gestures
    // -------------------------------------------------------------------------

    async fn perform_gesture(
        &self,
        operation: &'static str,
        locator: &str,
        gesture: Gesture,
    ) -> SteadyResult<()> {
        let parsed = Locator::parse(locator);
        self.observe(operation, parsed.query(), async {
            let element = self.wait_for(&parsed, Readiness::Clickable).await?;
            self.scroll_into_center(&element).await?;
            self.driver.gesture(&element, gesture).await?;
            debug!(locator = %parsed, gesture = gesture.as_str(), "gesture performed");
            Ok(())
        })
        .await
    }

    /// Move the pointer over the element
    pub async fn hover(&mut self, locator: &str) -> SteadyResult<()> {
        self.perform_gesture("hover", locator, Gesture::Hover).await
    }

    /// Double-click the element
    pub async fn double_click(&mut self, locator: &str) -> SteadyResult<()> {
        self.perform_gesture("double_click", locator, Gesture::DoubleClick)
            .await
    }

    /// Right-click the element
    pub async fn right_click(&mut self, locator: &str) -> SteadyResult<()> {
        self.perform_gesture("right_click", locator, Gesture::ContextClick)
            .await
    }

    /// Wait for visibility, centre the element, move the pointer onto it and click
    pub async fn mouse_over_and_click(&mut self, locator: &str) -> SteadyResult<()> {
        let parsed = Locator::parse(locator);
        self.observe("mouse_over_and_click", parsed.query(), async {
            let element = self.wait_for(&parsed, Readiness::Visible).await?;
            self.scroll_into_center(&element).await?;
            self.driver.gesture(&element, Gesture::Hover).await?;
            self.driver.click(&element).await?;
            info!(locator = %parsed, "hovered and clicked");
            Ok(())
        })
        .await
    }

    /// Click the focused element when its `attribute` equals `value`.
    ///
    /// Returns whether a click happened; no waiting.
    pub async fn click_active_element_by_attribute(
        &mut self,
        attribute: &str,
        value: &str,
    ) -> SteadyResult<bool> {
        self.observe("click_active_element_by_attribute", attribute, async {
            let Some(active) = self.driver.active_element().await? else {
                debug!(attribute, "no focused element");
                return Ok(false);
            };
            let actual = self.driver.property(&active, attribute).await?;
            if actual.as_deref() != Some(value) {
                debug!(attribute, value, actual = ?actual, "focused element does not match");
                return Ok(false);
            }
            self.driver.click(&active).await?;
            info!(attribute, value, "clicked focused element");
            Ok(true)
        })
        .await
    }

    // -------------------------------------------------------------------------
    // uploads
    // -------------------------------------------------------------------------

    /// Populate a visible file input
    pub async fn upload_file(&mut self, locator: &str, path: impl AsRef<Path>) -> SteadyResult<()> {
        let parsed = Locator::parse(locator);
        let path = path.as_ref();
        self.observe("upload_file", parsed.query(), async {
            let file = absolute_file(path)?;
            let input = self.wait_for(&parsed, Readiness::Visible).await?;
            self.driver.set_files(&input, &[file]).await?;
            debug!(locator = %parsed, path = %path.display(), "file uploaded");
            Ok(())
        })
        .await
    }

    /// Make a hidden file input displayable, then populate it
    pub async fn upload_hidden_file(&mut self, locator: &str, path: impl AsRef<Path>) -> SteadyResult<()> {
        let parsed = Locator::parse(locator);
        let path = path.as_ref();
        self.observe("upload_hidden_file", parsed.query(), async {
            let file = absolute_file(path)?;
            let input = self.wait_for(&parsed, Readiness::Present).await?;
            self.driver
                .run_script(&input, &PageScript::RevealHidden)
                .await?;
            self.driver.set_files(&input, &[file]).await?;
            debug!(locator = %parsed, path = %path.display(), "hidden input uploaded");
            Ok(())
        })
        .await
    }

    /// Drop a file onto a drop zone through a temporary injected input
    pub async fn upload_file_via_drag_and_drop(
        &mut self,
        drop_zone: &str,
        path: impl AsRef<Path>,
    ) -> SteadyResult<()> {
        let parsed = Locator::parse(drop_zone);
        let path = path.as_ref();
        self.observe("upload_file_via_drag_and_drop", parsed.query(), async {
            let file = absolute_file(path)?;
            let zone = self.wait_for(&parsed, Readiness::Visible).await?;
            let input = self
                .driver
                .run_script_for_element(&zone, &PageScript::InjectDropInput)
                .await?
                .ok_or_else(|| SteadyError::script("drop input was not created"))?;
            self.driver.set_files(&input, &[file]).await?;
            debug!(locator = %parsed, path = %path.display(), "drop dispatched");
            Ok(())
        })
        .await
    }

    // -------------------------------------------------------------------------
    // scrolling & waits
    // -------------------------------------------------------------------------

    /// Scroll the element to the viewport centre and assert it is visible there
    pub async fn scroll_to(&mut self, locator: &str) -> SteadyResult<()> {
        let parsed = Locator::parse(locator);
        self.observe("scroll_to", parsed.query(), async {
            let element = self.wait_for(&parsed, Readiness::Visible).await?;
            let visible = self
                .driver
                .run_script(&element, &PageScript::ScrollIntoCenterChecked)
                .await?;
            if visible.as_bool() == Some(true) {
                info!(locator = %parsed, "scrolled into view");
                Ok(())
            } else {
                Err(SteadyError::VerificationFailed {
                    expected: "non-zero size inside the window after scroll".to_string(),
                    actual: "zero size or outside the window".to_string(),
                })
            }
        })
        .await
    }

    /// Centre the first match if it is present but outside the viewport.
    ///
    /// Looks once without waiting. Returns whether a scroll happened; an
    /// absent element is logged and skipped.
    pub async fn scroll_to_if_present(&mut self, locator: &str) -> SteadyResult<bool> {
        let parsed = Locator::parse(locator);
        self.observe("scroll_to_if_present", parsed.query(), async {
            let Some(first) = self.driver.find_all(&parsed).await?.into_iter().next() else {
                warn!(locator = %parsed, "element not present, nothing to scroll");
                return Ok(false);
            };
            let in_view = self
                .driver
                .run_script(&first, &PageScript::InViewport)
                .await?
                .as_bool()
                .unwrap_or(false);
            if in_view {
                debug!(locator = %parsed, "already in viewport");
                return Ok(false);
            }
            self.scroll_into_center(&first).await?;
            info!(locator = %parsed, "scrolled into view");
            Ok(true)
        })
        .await
    }

    /// Wait until any of `locators` matches something.
    ///
    /// Locators are tried in order on every poll; returns the index of the
    /// first one with a match together with its first element.
    pub async fn wait_for_any(&mut self, locators: &[&str]) -> SteadyResult<(usize, ElementRef)> {
        let subject = locators.join(" | ");
        self.observe("wait_for_any", &subject, async {
            if locators.is_empty() {
                return Err(SteadyError::invalid_state("no locators to wait for"));
            }
            let parsed: Vec<Locator> = locators.iter().map(|l| Locator::parse(l)).collect();
            let driver = self.driver.as_ref();
            let found: std::sync::Mutex<Option<(usize, ElementRef)>> = std::sync::Mutex::new(None);
            let (candidates, slot) = (&parsed, &found);
            poll_until(&self.policy, "any locator to match", move || async move {
                for (index, locator) in candidates.iter().enumerate() {
                    if let Some(first) = driver.find_all(locator).await?.into_iter().next() {
                        if let Ok(mut guard) = slot.lock() {
                            *guard = Some((index, first));
                        }
                        return Ok(true);
                    }
                }
                Ok::<_, SteadyError>(false)
            })
            .await
            .map_err(|_| SteadyError::NotFound {
                locator: subject.clone(),
                timeout_ms: self.policy.timeout_ms(),
            })?;
            let (index, element) = found
                .into_inner()
                .ok()
                .flatten()
                .ok_or_else(|| SteadyError::invalid_state("match vanished before it was read"))?;
            info!(locator = locators[index], index, "present");
            Ok((index, element))
        })
        .await
    }

    /// Wait until some match is displayed (`true`) or none is (`false`)
    pub async fn wait_until_visible(&mut self, locator: &str, visible: bool) -> SteadyResult<()> {
        let parsed = Locator::parse(locator);
        self.observe("wait_until_visible", parsed.query(), async {
            if visible {
                self.wait_for(&parsed, Readiness::Visible).await?;
            } else {
                let driver = self.driver.as_ref();
                let parsed = &parsed;
                poll_until(&self.policy, "element to disappear", move || async move {
                    for element in driver.find_all(parsed).await? {
                        if driver.is_displayed(&element).await? {
                            return Ok(false);
                        }
                    }
                    Ok::<_, SteadyError>(true)
                })
                .await?;
            }
            info!(locator = %parsed, visible, "visibility reached");
            Ok(())
        })
        .await
    }

    /// Wait until the first match's trimmed text equals `text`
    pub async fn wait_until_text(&mut self, locator: &str, text: &str) -> SteadyResult<()> {
        let parsed = Locator::parse(locator);
        self.observe("wait_until_text", parsed.query(), async {
            let driver = self.driver.as_ref();
            let wanted = text.trim();
            let query = &parsed;
            poll_until(&self.policy, &format!("text '{wanted}'"), move || async move {
                let Some(first) = driver.find_all(query).await?.into_iter().next() else {
                    return Ok(false);
                };
                Ok::<_, SteadyError>(driver.text(&first).await?.trim() == wanted)
            })
            .await?;
            info!(locator = %parsed, text = wanted, "text appeared");
            Ok(())
        })
        .await
    }

    /// Whether the first match exists and is displayed right now (no waiting)
    pub async fn element_exists(&mut self, locator: &str) -> bool {
        let parsed = Locator::parse(locator);
        let Ok(found) = self.driver.find_all(&parsed).await else {
            return false;
        };
        match found.first() {
            Some(first) => self.driver.is_displayed(first).await.unwrap_or(false),
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // reads & assertions
    // -------------------------------------------------------------------------

    /// Rendered text of the first visible match
    pub async fn text_of(&mut self, locator: &str) -> SteadyResult<String> {
        let parsed = Locator::parse(locator);
        self.observe("text_of", parsed.query(), async {
            let element = self.wait_for(&parsed, Readiness::Visible).await?;
            self.driver.text(&element).await
        })
        .await
    }

    /// `value` property of the first visible match
    pub async fn input_value(&mut self, locator: &str) -> SteadyResult<String> {
        let parsed = Locator::parse(locator);
        self.observe("input_value", parsed.query(), async {
            let element = self.wait_for(&parsed, Readiness::Visible).await?;
            Ok(self
                .driver
                .property(&element, "value")
                .await?
                .unwrap_or_default())
        })
        .await
    }

    /// `title` property of the first visible match (empty when absent)
    pub async fn tooltip_of(&mut self, locator: &str) -> SteadyResult<String> {
        let parsed = Locator::parse(locator);
        self.observe("tooltip_of", parsed.query(), async {
            let element = self.wait_for(&parsed, Readiness::Visible).await?;
            let title = self
                .driver
                .property(&element, "title")
                .await?
                .unwrap_or_default();
            info!(locator = %parsed, tooltip = %title, "tooltip read");
            Ok(title)
        })
        .await
    }

    /// Wait until property `name` equals `expected` (case-insensitive)
    pub async fn expect_property(&mut self, locator: &str, name: &str, expected: &str) -> SteadyResult<()> {
        let parsed = Locator::parse(locator);
        self.observe("expect_property", parsed.query(), async {
            let element = self.wait_for(&parsed, Readiness::Present).await?;
            let driver = self.driver.as_ref();
            let target = &element;
            let matched = poll_until(&self.policy, &format!("property '{name}'"), move || async move {
                Ok::<_, SteadyError>(
                    driver
                        .property(target, name)
                        .await?
                        .is_some_and(|v| v.eq_ignore_ascii_case(expected)),
                )
            })
            .await;
            if matched.is_ok() {
                info!(locator = %parsed, name, expected, "property matched");
                return Ok(());
            }
            let actual = driver.property(&element, name).await?.unwrap_or_default();
            Err(SteadyError::VerificationFailed {
                expected: format!("{name}={expected}"),
                actual: format!("{name}={actual}"),
            })
        })
        .await
    }

    /// Assert a checkbox or radio's selected state
    pub async fn expect_selected(&mut self, locator: &str, expected: bool) -> SteadyResult<()> {
        let parsed = Locator::parse(locator);
        self.observe("expect_selected", parsed.query(), async {
            let element = self.wait_for(&parsed, Readiness::Visible).await?;
            let actual = self.driver.is_selected(&element).await?;
            if actual == expected {
                Ok(())
            } else {
                Err(SteadyError::VerificationFailed {
                    expected: format!("selected={expected}"),
                    actual: format!("selected={actual}"),
                })
            }
        })
        .await
    }

    /// Draw a red border around the element; failures are only logged
    pub async fn highlight(&mut self, locator: &str) {
        let parsed = Locator::parse(locator);
        let started = Instant::now();
        let result = async {
            let element = self.wait_for(&parsed, Readiness::Visible).await?;
            self.driver
                .run_script(&element, &PageScript::Highlight)
                .await
        }
        .await;
        match result {
            Ok(_) => self.notify("highlight", parsed.query(), EventOutcome::Succeeded, started),
            Err(err) => {
                warn!(locator = %parsed, error = %err, "highlight failed");
                self.notify("highlight", parsed.query(), EventOutcome::SoftFailed, started);
            }
        }
    }

    // -------------------------------------------------------------------------
    // page
    // -------------------------------------------------------------------------

    /// Load `url` in the current tab
    pub async fn navigate_to(&mut self, url: &str) -> SteadyResult<()> {
        info!(url, "navigating");
        self.observe("navigate_to", url, self.driver.navigate(url))
            .await
    }

    /// PNG screenshot of the current tab
    pub async fn screenshot(&mut self) -> SteadyResult<Vec<u8>> {
        self.observe("screenshot", "page", self.driver.screenshot())
            .await
    }

    /// Write a PNG screenshot to `path`
    pub async fn save_screenshot(&mut self, path: impl AsRef<Path>) -> SteadyResult<PathBuf> {
        let path = path.as_ref().to_path_buf();
        let subject = path.display().to_string();
        self.observe("save_screenshot", &subject, async {
            let png = self.driver.screenshot().await?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, png).await?;
            Ok(path.clone())
        })
        .await
    }
}

fn absolute_file(path: &Path) -> SteadyResult<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    if !absolute.is_file() {
        return Err(SteadyError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("upload source {} does not exist", absolute.display()),
        )));
    }
    Ok(absolute)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::driver::mock::{MockDriver, MockElement};
    use crate::sink::MemorySink;

    async fn engine(driver: &Arc<MockDriver>) -> InteractionEngine<MockDriver> {
        InteractionEngine::new(Arc::clone(driver))
            .await
            .unwrap()
            .with_policy(RetryPolicy::new(Duration::from_secs(2), Duration::from_millis(500)).unwrap())
    }

    mod policy_tests {
        use super::*;

        #[test]
        fn test_uncheck_policy_parse() {
            assert_eq!("log-only".parse::<UncheckPolicy>().unwrap(), UncheckPolicy::LogOnly);
            assert_eq!("LOG_ONLY".parse::<UncheckPolicy>().unwrap(), UncheckPolicy::LogOnly);
            assert_eq!(" click ".parse::<UncheckPolicy>().unwrap(), UncheckPolicy::Click);
            assert!("toggle".parse::<UncheckPolicy>().is_err());
        }

        #[test]
        fn test_date_from_serial() {
            assert_eq!(date_from_serial(1), NaiveDate::from_ymd_opt(1899, 12, 31));
            assert_eq!(date_from_serial(45292), NaiveDate::from_ymd_opt(2024, 1, 1));
        }

        #[test]
        fn test_date_from_serial_out_of_range() {
            assert_eq!(date_from_serial(i64::MIN), None);
            assert_eq!(date_from_serial(i64::MAX), None);
            assert_eq!(date_from_serial(-1_000_000_000), None);
        }

        #[tokio::test(start_paused = true)]
        async fn test_from_settings() {
            let driver = Arc::new(MockDriver::new());
            let settings =
                Settings::from_yaml_str("wait:\n  timeout: 7\ncheckbox:\n  uncheck: click\n").unwrap();
            let engine = InteractionEngine::from_settings(driver, &settings).await.unwrap();
            assert_eq!(engine.policy().timeout(), Duration::from_secs(7));
            assert_eq!(engine.uncheck, UncheckPolicy::Click);
            assert_eq!(engine.original_tab(), "tab-0");
        }
    }

    mod click_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_click_skips_covered_and_stops_at_first_clickable() {
            let driver = Arc::new(MockDriver::new());
            let a = driver.add("//button", MockElement::new("a").covered());
            let b = driver.add("//button", MockElement::new("b").disabled());
            let c = driver.add("//button", MockElement::new("c"));
            let d = driver.add("//button", MockElement::new("d"));
            let mut engine = engine(&driver).await;

            let outcome = engine.click("//button").await.unwrap();

            assert_eq!(outcome, ClickOutcome::Clicked { index: 2 });
            assert!(driver.was_called(&format!("is_displayed:{}", a.id())));
            assert!(driver.was_called(&format!("is_displayed:{}", b.id())));
            assert!(driver.was_called(&format!("click:{}", c.id())));
            assert!(!driver.was_called(&format!("is_displayed:{}", d.id())));
            assert_eq!(driver.count("click:"), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_click_waits_for_overlay_to_clear() {
            let driver = Arc::new(MockDriver::new());
            let el = driver.add("#save", MockElement::new("Save").covered_for(Duration::from_millis(800)));
            let mut engine = engine(&driver).await;

            assert!(engine.click("#save").await.unwrap().is_clicked());
            let clicks = driver.times_of(&format!("click:{}", el.id()));
            assert_eq!(clicks.len(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_click_on_ghost_times_out_softly() {
            let driver = Arc::new(MockDriver::new());
            let sink = Arc::new(MemorySink::new());
            let mut engine = engine(&driver).await.with_sink(sink.clone());

            let outcome = engine.click("//input[@id='ghost']").await.unwrap();

            assert!(matches!(outcome, ClickOutcome::TimedOut { elapsed } if elapsed == Duration::from_secs(2)));
            assert!(!driver.was_called("click:"));
            let outcomes: Vec<_> = sink.events().into_iter().map(|e| e.outcome).collect();
            assert!(outcomes.contains(&EventOutcome::SoftFailed));
        }
    }

    mod typing_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_type_text_replaces_value() {
            let driver = Arc::new(MockDriver::new());
            let input = driver.add("#name", MockElement::input().with_value("old"));
            let mut engine = engine(&driver).await;

            engine.type_text("#name", "Ada Lovelace").await.unwrap();
            assert_eq!(driver.value_of(&input), "Ada Lovelace");
            assert_eq!(driver.count("send_keys"), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_blank_text_is_noop() {
            let driver = Arc::new(MockDriver::new());
            let input = driver.add("#name", MockElement::input().with_value("keep"));
            let mut engine = engine(&driver).await;

            engine.type_text("#name", "   ").await.unwrap();
            engine.type_text("#name", "").await.unwrap();
            assert_eq!(driver.value_of(&input), "keep");
            assert!(!driver.was_called("find_all"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_type_into_ghost_is_wrapped_not_found() {
            let driver = Arc::new(MockDriver::new());
            let mut engine = engine(&driver).await;

            let err = engine.type_text("//input[@id='ghost']", "x").await.unwrap_err();
            assert_eq!(err.operation(), Some("type_text"));
            assert!(matches!(err.root_cause(), SteadyError::NotFound { .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_type_into_disabled_is_not_interactable() {
            let driver = Arc::new(MockDriver::new());
            driver.add("#name", MockElement::input().disabled());
            let mut engine = engine(&driver).await;

            let err = engine.type_text("#name", "x").await.unwrap_err();
            assert!(matches!(err.root_cause(), SteadyError::NotInteractable { matched: 1, .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_clear_field_and_key_chord() {
            let driver = Arc::new(MockDriver::new());
            let input = driver.add("#q", MockElement::input().with_value("abc"));
            let mut engine = engine(&driver).await;

            engine.clear_field("#q").await.unwrap();
            assert_eq!(driver.value_of(&input), "");

            engine.send_key_chord("#q", Key::Enter).await.unwrap();
            let entries = driver.entries();
            let end = entries.iter().position(|e| e.ends_with(":End")).unwrap();
            let enter = entries.iter().position(|e| e.ends_with(":Enter")).unwrap();
            assert!(end < enter);
        }

        #[tokio::test(start_paused = true)]
        async fn test_date_serial_is_typed_then_tabbed() {
            let driver = Arc::new(MockDriver::new());
            let input = driver.add("#dob", MockElement::input());
            let mut engine = engine(&driver).await;

            engine.select_date_from_calendar("#dob", "45292").await.unwrap();
            assert_eq!(driver.value_of(&input), "01/01/2024");
            assert!(driver.was_called(&format!("press_key:{}:Tab", input.id())));

            let err = engine.select_date_from_calendar("#dob", "soon").await.unwrap_err();
            assert!(matches!(err.root_cause(), SteadyError::InvalidState { .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_extreme_date_serial_is_rejected() {
            let driver = Arc::new(MockDriver::new());
            let input = driver.add("#dob", MockElement::input().with_value("kept"));
            let mut engine = engine(&driver).await;

            let err = engine
                .select_date_from_calendar("#dob", "-9223372036854775808")
                .await
                .unwrap_err();
            assert!(matches!(err.root_cause(), SteadyError::InvalidState { .. }));
            assert_eq!(driver.value_of(&input), "kept");
        }
    }

    mod selection_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_checked_box_stays_checked_under_log_only() {
            let driver = Arc::new(MockDriver::new());
            let cb = driver.add("#agree", MockElement::checkbox(true));
            let mut engine = engine(&driver).await;

            engine.set_checkbox_state("#agree", false).await.unwrap();
            assert!(driver.element(&cb).unwrap().selected);
            assert!(!driver.was_called("click:"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_click_policy_unchecks() {
            let driver = Arc::new(MockDriver::new());
            let cb = driver.add("#agree", MockElement::checkbox(true));
            let mut engine = engine(&driver).await.with_uncheck_policy(UncheckPolicy::Click);

            engine.set_checkbox_state("#agree", false).await.unwrap();
            assert!(!driver.element(&cb).unwrap().selected);
        }

        #[tokio::test(start_paused = true)]
        async fn test_checkbox_only_clicked_when_needed() {
            let driver = Arc::new(MockDriver::new());
            let cb = driver.add("#agree", MockElement::checkbox(false));
            let mut engine = engine(&driver).await;

            engine.set_checkbox_state("#agree", true).await.unwrap();
            engine.set_checkbox_state("#agree", true).await.unwrap();
            assert!(driver.element(&cb).unwrap().selected);
            assert_eq!(driver.count("click:"), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_radio_selected_once() {
            let driver = Arc::new(MockDriver::new());
            let radio = driver.add("#yes", MockElement::radio(false));
            let mut engine = engine(&driver).await;

            engine.select_radio("#yes").await.unwrap();
            engine.select_radio("#yes").await.unwrap();
            assert!(driver.element(&radio).unwrap().selected);
            assert_eq!(driver.count("click:"), 1);
            engine.expect_selected("#yes", true).await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_dropdown_by_text() {
            let driver = Arc::new(MockDriver::new());
            let select = driver.add("#country", MockElement::select(["France", "Spain"]));
            let mut engine = engine(&driver).await;

            engine.select_dropdown_by_text("#country", "Spain").await.unwrap();
            assert_eq!(driver.value_of(&select), "Spain");

            let err = engine
                .select_dropdown_by_text("#country", "Atlantis")
                .await
                .unwrap_err();
            assert!(matches!(err.root_cause(), SteadyError::VerificationFailed { .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_dynamic_list_matches_case_insensitively() {
            let driver = Arc::new(MockDriver::new());
            driver.add("#city", MockElement::input());
            driver.add("li.city", MockElement::new("Lyon"));
            let paris = driver.add("li.city", MockElement::new(" PARIS "));
            let mut engine = engine(&driver).await;

            engine
                .select_from_dynamic_list("#city", "li.city", "paris")
                .await
                .unwrap();
            assert!(driver.was_called(&format!("click:{}", paris.id())));

            let err = engine
                .select_from_dynamic_list("#city", "li.city", "Rome")
                .await
                .unwrap_err();
            assert!(matches!(err.root_cause(), SteadyError::VerificationFailed { .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_option_by_clicks_uses_title() {
            let driver = Arc::new(MockDriver::new());
            driver.add("#picker", MockElement::new("Pick"));
            let entry = driver.add("//*[@title='Blue']", MockElement::new("Blue"));
            let mut engine = engine(&driver).await;

            engine.select_option_by_clicks("#picker", "Blue").await.unwrap();
            assert!(driver.was_called(&format!("click:{}", entry.id())));
        }

        #[tokio::test(start_paused = true)]
        async fn test_menu_option_is_script_clicked() {
            let driver = Arc::new(MockDriver::new());
            driver.add("#menu", MockElement::new("Menu"));
            let logout = driver.add("//a[@id='logout']", MockElement::new("Log out").covered());
            let mut engine = engine(&driver).await;

            let started = Instant::now();
            engine.select_menu_option("#menu", "//a[@id='logout']").await.unwrap();
            assert!(driver.was_called(&format!("run_script:script_click:{}", logout.id())));
            assert!(started.elapsed() >= MENU_OPEN_DELAY + MENU_CLOSE_DELAY);
        }
    }

    mod upload_tests {
        use super::*;
        use std::io::Write;

        fn temp_file() -> tempfile::NamedTempFile {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "payload").unwrap();
            file
        }

        #[tokio::test(start_paused = true)]
        async fn test_upload_file_sets_absolute_path() {
            let driver = Arc::new(MockDriver::new());
            let input = driver.add("#file", MockElement::file_input());
            let file = temp_file();
            let mut engine = engine(&driver).await;

            engine.upload_file("#file", file.path()).await.unwrap();
            assert_eq!(driver.element(&input).unwrap().files, vec![file.path().to_path_buf()]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_upload_hidden_file_reveals_input() {
            let driver = Arc::new(MockDriver::new());
            let input = driver.add("#file", MockElement::file_input().hidden());
            let file = temp_file();
            let mut engine = engine(&driver).await;

            engine.upload_hidden_file("#file", file.path()).await.unwrap();
            let el = driver.element(&input).unwrap();
            assert!(el.displayed);
            assert_eq!(el.files.len(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_drag_and_drop_upload() {
            let driver = Arc::new(MockDriver::new());
            let zone = driver.add(".dropzone", MockElement::new("Drop files"));
            let file = temp_file();
            let mut engine = engine(&driver).await;

            engine
                .upload_file_via_drag_and_drop(".dropzone", file.path())
                .await
                .unwrap();
            assert_eq!(driver.element(&zone).unwrap().dropped, vec![file.path().to_path_buf()]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_missing_upload_source_fails() {
            let driver = Arc::new(MockDriver::new());
            driver.add("#file", MockElement::file_input());
            let mut engine = engine(&driver).await;

            let err = engine
                .upload_file("#file", "/definitely/not/here.txt")
                .await
                .unwrap_err();
            assert!(matches!(err.root_cause(), SteadyError::Io(_)));
            assert!(!driver.was_called("set_files"));
        }
    }

    mod read_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_reads() {
            let driver = Arc::new(MockDriver::new());
            driver.add("#msg", MockElement::new("Saved").with_prop("title", "Saved at noon"));
            driver.add("#q", MockElement::input().with_value("rust"));
            let mut engine = engine(&driver).await;

            assert_eq!(engine.text_of("#msg").await.unwrap(), "Saved");
            assert_eq!(engine.tooltip_of("#msg").await.unwrap(), "Saved at noon");
            assert_eq!(engine.input_value("#q").await.unwrap(), "rust");
            assert!(engine.element_exists("#msg").await);
            assert!(!engine.element_exists("#nope").await);
        }

        #[tokio::test(start_paused = true)]
        async fn test_expect_property_mismatch_reports_actual() {
            let driver = Arc::new(MockDriver::new());
            driver.add("#status", MockElement::new("").with_prop("ariaBusy", "TRUE"));
            let mut engine = engine(&driver).await;

            engine.expect_property("#status", "ariaBusy", "true").await.unwrap();
            let err = engine
                .expect_property("#status", "ariaBusy", "false")
                .await
                .unwrap_err();
            match err.root_cause() {
                SteadyError::VerificationFailed { actual, .. } => assert_eq!(actual, "ariaBusy=TRUE"),
                other => panic!("unexpected {other:?}"),
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_until_visible_both_ways() {
            let driver = Arc::new(MockDriver::new());
            driver.add("#spinner", MockElement::new("...").hidden());
            driver.add("#late", MockElement::new("x").appearing_after(Duration::from_secs(1)));
            let mut engine = engine(&driver).await;

            engine.wait_until_visible("#spinner", false).await.unwrap();
            engine.wait_until_visible("#late", true).await.unwrap();
            let err = engine.wait_until_visible("#spinner", true).await.unwrap_err();
            assert!(matches!(err.root_cause(), SteadyError::NotInteractable { .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_until_text_times_out() {
            let driver = Arc::new(MockDriver::new());
            driver.add("#msg", MockElement::new("Loading"));
            let mut engine = engine(&driver).await;

            engine.wait_until_text("#msg", " Loading ").await.unwrap();
            let err = engine.wait_until_text("#msg", "Done").await.unwrap_err();
            assert!(matches!(err.root_cause(), SteadyError::Timeout { ms: 2000, .. }));
        }
    }

    mod gesture_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_gestures_scroll_then_act() {
            let driver = Arc::new(MockDriver::new());
            let el = driver.add("#row", MockElement::new("row"));
            let mut engine = engine(&driver).await;

            engine.hover("#row").await.unwrap();
            engine.double_click("#row").await.unwrap();
            engine.right_click("#row").await.unwrap();

            assert!(driver.was_called(&format!("gesture:hover:{}", el.id())));
            assert!(driver.was_called(&format!("gesture:double_click:{}", el.id())));
            assert!(driver.was_called(&format!("gesture:context_click:{}", el.id())));
            assert_eq!(driver.count("run_script:scroll_into_center:"), 3);
        }

        #[tokio::test(start_paused = true)]
        async fn test_scroll_to_zero_size_fails_verification() {
            let driver = Arc::new(MockDriver::new());
            driver.add("#ok", MockElement::new("ok").offscreen());
            driver.add("#flat", MockElement::new("").zero_size());
            let mut engine = engine(&driver).await;

            engine.scroll_to("#ok").await.unwrap();
            let err = engine.scroll_to("#flat").await.unwrap_err();
            assert_eq!(err.operation(), Some("scroll_to"));
            assert!(matches!(err.root_cause(), SteadyError::VerificationFailed { .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_highlight_never_fails() {
            let driver = Arc::new(MockDriver::new());
            let el = driver.add("#row", MockElement::new("row"));
            let mut engine = engine(&driver).await;

            engine.highlight("#row").await;
            engine.highlight("#missing").await;
            assert!(driver.element(&el).unwrap().props.contains_key("style.border"));
        }
    }

    mod presence_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_scroll_to_if_present_only_scrolls_offscreen() {
            let driver = Arc::new(MockDriver::new());
            let below = driver.add("#below", MockElement::new("below").offscreen());
            driver.add("#top", MockElement::new("top"));
            let mut engine = engine(&driver).await;

            assert!(engine.scroll_to_if_present("#below").await.unwrap());
            assert!(driver.element(&below).unwrap().in_viewport);
            assert!(!engine.scroll_to_if_present("#top").await.unwrap());
            assert_eq!(driver.count("run_script:scroll_into_center:"), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_scroll_to_if_present_skips_absent_without_waiting() {
            let driver = Arc::new(MockDriver::new());
            let mut engine = engine(&driver).await;
            let started = Instant::now();

            assert!(!engine.scroll_to_if_present("#ghost").await.unwrap());
            assert_eq!(started.elapsed(), Duration::ZERO);
            assert_eq!(driver.count("find_all:#ghost"), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_for_any_returns_first_locator_with_match() {
            let driver = Arc::new(MockDriver::new());
            let banner = driver.add(
                ".banner",
                MockElement::new("welcome").appearing_after(Duration::from_millis(900)),
            );
            driver.add(
                ".error",
                MockElement::new("denied").appearing_after(Duration::from_secs(5)),
            );
            let mut engine = engine(&driver).await;

            let (index, element) = engine.wait_for_any(&[".error", ".banner"]).await.unwrap();
            assert_eq!(index, 1);
            assert_eq!(element, banner);
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_for_any_prefers_earlier_locator() {
            let driver = Arc::new(MockDriver::new());
            let first = driver.add("#a", MockElement::new("a").hidden());
            driver.add("#b", MockElement::new("b"));
            let mut engine = engine(&driver).await;

            let (index, element) = engine.wait_for_any(&["#a", "#b"]).await.unwrap();
            assert_eq!(index, 0);
            assert_eq!(element, first);
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_for_any_rejects_empty_and_times_out() {
            let driver = Arc::new(MockDriver::new());
            let mut engine = engine(&driver).await;

            let err = engine.wait_for_any(&[]).await.unwrap_err();
            assert!(matches!(err.root_cause(), SteadyError::InvalidState { .. }));
            assert_eq!(driver.count("find_all:"), 0);

            let err = engine.wait_for_any(&["#x", "#y"]).await.unwrap_err();
            assert_eq!(err.operation(), Some("wait_for_any"));
            match err.root_cause() {
                SteadyError::NotFound { locator, timeout_ms } => {
                    assert_eq!(locator, "#x | #y");
                    assert_eq!(*timeout_ms, 2_000);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_mouse_over_and_click_hovers_before_clicking() {
            let driver = Arc::new(MockDriver::new());
            let menu = driver.add("#menu", MockElement::new("menu").offscreen());
            let mut engine = engine(&driver).await;

            engine.mouse_over_and_click("#menu").await.unwrap();
            let entries = driver.entries();
            let scroll = entries
                .iter()
                .position(|e| e == &format!("run_script:scroll_into_center:{}", menu.id()))
                .unwrap();
            let hover = entries
                .iter()
                .position(|e| e == &format!("gesture:hover:{}", menu.id()))
                .unwrap();
            let click = entries
                .iter()
                .position(|e| e == &format!("click:{}", menu.id()))
                .unwrap();
            assert!(scroll < hover && hover < click);
        }

        #[tokio::test(start_paused = true)]
        async fn test_click_active_element_by_attribute() {
            let driver = Arc::new(MockDriver::new());
            let save = driver.add("#save", MockElement::new("Save").with_prop("name", "save"));
            let mut engine = engine(&driver).await;

            assert!(!engine.click_active_element_by_attribute("name", "save").await.unwrap());
            driver.focus(&save);
            assert!(!engine.click_active_element_by_attribute("name", "cancel").await.unwrap());
            assert_eq!(driver.count("click:"), 0);
            assert!(engine.click_active_element_by_attribute("name", "save").await.unwrap());
            assert_eq!(driver.count(&format!("click:{}", save.id())), 1);
        }
    }

    mod page_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_navigate_and_screenshot() {
            let driver = Arc::new(MockDriver::new());
            let mut engine = engine(&driver).await;
            let dir = tempfile::tempdir().unwrap();

            engine.navigate_to("https://example.com/login").await.unwrap();
            assert_eq!(driver.url(), "https://example.com/login");

            let path = engine
                .save_screenshot(dir.path().join("shots/login.png"))
                .await
                .unwrap();
            assert!(path.is_file());
            assert!(!engine.screenshot().await.unwrap().is_empty());
        }
    }
}
