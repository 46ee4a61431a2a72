//! JavaScript dialog handling (alert, confirm, prompt, beforeunload)

use crate::driver::Driver;
use crate::engine::InteractionEngine;
use crate::result::{SteadyError, SteadyResult};
use crate::wait::poll_until;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::info;

/// Kind of browser dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogKind {
    /// OK button only
    Alert,
    /// OK/Cancel buttons
    Confirm,
    /// Text input plus OK/Cancel
    Prompt,
    /// Leave/Stay buttons
    BeforeUnload,
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alert => write!(f, "alert"),
            Self::Confirm => write!(f, "confirm"),
            Self::Prompt => write!(f, "prompt"),
            Self::BeforeUnload => write!(f, "beforeunload"),
        }
    }
}

/// A dialog currently open on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    /// Dialog kind
    pub kind: DialogKind,
    /// Message shown to the user
    pub message: String,
    /// Prefilled prompt text
    pub default_prompt: Option<String>,
}

impl Dialog {
    /// Create a dialog of `kind`
    #[must_use]
    pub fn new(kind: DialogKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            default_prompt: None,
        }
    }

    /// Create an alert
    #[must_use]
    pub fn alert(message: impl Into<String>) -> Self {
        Self::new(DialogKind::Alert, message)
    }

    /// Create a confirm
    #[must_use]
    pub fn confirm(message: impl Into<String>) -> Self {
        Self::new(DialogKind::Confirm, message)
    }

    /// Create a prompt
    #[must_use]
    pub fn prompt(message: impl Into<String>, default: Option<String>) -> Self {
        Self {
            default_prompt: default,
            ..Self::new(DialogKind::Prompt, message)
        }
    }
}

/// How to answer a dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogAction {
    /// OK/Yes/Leave
    Accept,
    /// Cancel/No/Stay
    Dismiss,
    /// Type into the prompt, then accept
    AcceptWith(String),
}

impl DialogAction {
    /// Build from an action name (`accept`, `dismiss`, `input`) and prompt text
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` for any other action name
    pub fn from_name(action: &str, input: &str) -> SteadyResult<Self> {
        match action.trim().to_ascii_lowercase().as_str() {
            "accept" => Ok(Self::Accept),
            "dismiss" => Ok(Self::Dismiss),
            "input" => Ok(Self::AcceptWith(input.to_string())),
            other => Err(SteadyError::invalid_state(format!(
                "invalid dialog action '{other}'"
            ))),
        }
    }

    /// Whether the dialog is accepted
    #[must_use]
    pub const fn accepts(&self) -> bool {
        !matches!(self, Self::Dismiss)
    }

    /// Text typed into a prompt, if any
    #[must_use]
    pub fn prompt_text(&self) -> Option<&str> {
        match self {
            Self::AcceptWith(text) => Some(text),
            _ => None,
        }
    }

    /// Short name used in logs and events
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Dismiss => "dismiss",
            Self::AcceptWith(_) => "input",
        }
    }
}

impl FromStr for DialogAction {
    type Err = SteadyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s, "")
    }
}

impl<D: Driver + ?Sized> InteractionEngine<D> {
    /// Wait for a dialog to open, then answer it with `action`
    ///
    /// Returns the dialog that was answered.
    pub async fn handle_dialog(&mut self, action: DialogAction) -> SteadyResult<Dialog> {
        self.observe("handle_dialog", action.name(), async {
            let driver = self.driver();
            let seen: Mutex<Option<Dialog>> = Mutex::new(None);
            let slot = &seen;
            poll_until(self.policy(), "javascript dialog", move || async move {
                let pending = driver.pending_dialog().await?;
                let open = pending.is_some();
                if let Ok(mut guard) = slot.lock() {
                    *guard = pending;
                }
                Ok::<_, SteadyError>(open)
            })
            .await?;
            let dialog = seen
                .into_inner()
                .ok()
                .flatten()
                .ok_or_else(|| SteadyError::invalid_state("dialog closed before answering"))?;
            driver
                .respond_to_dialog(action.accepts(), action.prompt_text())
                .await?;
            info!(kind = %dialog.kind, action = action.name(), "dialog answered");
            Ok(dialog)
        })
        .await
    }
}

// =============================================================================
// TESTS
// =============================================================================
