//! Driver - the browser session seam.
//!
//! The engine never launches a browser. It borrows an already attached
//! session through the [`Driver`] trait, which exposes element queries,
//! native input, a script bridge and frame/tab switching.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  InteractionEngine                                           │
//! │      │ find_all / probes / input / run_script                │
//! │      ▼                                                       │
//! │  Driver (trait)                                              │
//! │      ├── CdpSession  (feature "browser", chromiumoxide)      │
//! │      └── MockDriver  (scripted page for tests)               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session serialises commands itself; nothing here takes a lock
//! across calls. Two engines driving one session from different threads
//! is the caller's problem.

#[cfg(feature = "browser")]
pub mod cdp;
pub mod mock;

use crate::dialog::Dialog;
use crate::dom_scripts::PageScript;
use crate::locator::Locator;
use crate::result::SteadyResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Opaque reference to an element issued by a driver.
///
/// Only meaningful to the driver that produced it; it can go stale when
/// the page re-renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef(String);

impl ElementRef {
    /// Create a reference from a driver-specific id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Driver-specific id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Non-text keys the engine sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Tab (commit / move focus)
    Tab,
    /// Enter
    Enter,
    /// Delete
    Delete,
    /// Backspace
    Backspace,
    /// End
    End,
    /// Escape
    Escape,
    /// Ctrl+A (select all)
    SelectAll,
}

impl Key {
    /// DOM `key` value
    #[must_use]
    pub const fn dom_key(&self) -> &'static str {
        match self {
            Self::Tab => "Tab",
            Self::Enter => "Enter",
            Self::Delete => "Delete",
            Self::Backspace => "Backspace",
            Self::End => "End",
            Self::Escape => "Escape",
            Self::SelectAll => "a",
        }
    }

    /// Windows virtual key code
    #[must_use]
    pub const fn virtual_key_code(&self) -> i64 {
        match self {
            Self::Tab => 9,
            Self::Enter => 13,
            Self::Delete => 46,
            Self::Backspace => 8,
            Self::End => 35,
            Self::Escape => 27,
            Self::SelectAll => 65,
        }
    }
}

/// Pointer gestures performed over an element's centre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gesture {
    /// Move the pointer over the element
    Hover,
    /// Two left clicks
    DoubleClick,
    /// Right click (context menu)
    ContextClick,
}

impl Gesture {
    /// Short name used in logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hover => "hover",
            Self::DoubleClick => "double_click",
            Self::ContextClick => "context_click",
        }
    }
}

/// Abstract browser session used by every engine component
#[async_trait]
pub trait Driver: Send + Sync {
    /// All elements matching `locator` under the current resolution root, in document order
    async fn find_all(&self, locator: &Locator) -> SteadyResult<Vec<ElementRef>>;

    /// Shadow root of `host`, if it has an open one
    async fn shadow_root(&self, host: &ElementRef) -> SteadyResult<Option<ElementRef>>;

    /// All elements matching a CSS selector under a shadow root
    async fn find_in_shadow(&self, root: &ElementRef, css: &str) -> SteadyResult<Vec<ElementRef>>;

    /// Native "is displayed" state
    async fn is_displayed(&self, element: &ElementRef) -> SteadyResult<bool>;

    /// Native "is enabled" state
    async fn is_enabled(&self, element: &ElementRef) -> SteadyResult<bool>;

    /// Checked/selected state of checkboxes, radios and options
    async fn is_selected(&self, element: &ElementRef) -> SteadyResult<bool>;

    /// Rendered text
    async fn text(&self, element: &ElementRef) -> SteadyResult<String>;

    /// DOM property as a string, `None` when absent
    async fn property(&self, element: &ElementRef, name: &str) -> SteadyResult<Option<String>>;

    /// Native click at the element's centre
    async fn click(&self, element: &ElementRef) -> SteadyResult<()>;

    /// Clear an editable element's value
    async fn clear(&self, element: &ElementRef) -> SteadyResult<()>;

    /// Type text into the element as one operation
    async fn send_keys(&self, element: &ElementRef, text: &str) -> SteadyResult<()>;

    /// Press a single non-text key on the element
    async fn press_key(&self, element: &ElementRef, key: Key) -> SteadyResult<()>;

    /// Pointer-action sequence over the element
    async fn gesture(&self, element: &ElementRef, gesture: Gesture) -> SteadyResult<()>;

    /// Populate a file input
    async fn set_files(&self, element: &ElementRef, files: &[PathBuf]) -> SteadyResult<()>;

    /// Run a page script against the element and return its JSON result
    async fn run_script(
        &self,
        element: &ElementRef,
        script: &PageScript,
    ) -> SteadyResult<serde_json::Value>;

    /// Run a page script that returns an element
    async fn run_script_for_element(
        &self,
        element: &ElementRef,
        script: &PageScript,
    ) -> SteadyResult<Option<ElementRef>>;

    /// Navigate the current tab
    async fn navigate(&self, url: &str) -> SteadyResult<()>;

    /// Resolve later queries inside `frame`'s content document
    async fn switch_to_frame(&self, frame: &ElementRef) -> SteadyResult<()>;

    /// Resolve later queries in the top-level document again
    async fn switch_to_default_content(&self) -> SteadyResult<()>;

    /// Live list of tab handles
    async fn window_handles(&self) -> SteadyResult<Vec<String>>;

    /// Handle of the tab commands currently go to
    async fn current_window(&self) -> SteadyResult<String>;

    /// Direct commands to another tab
    async fn switch_to_window(&self, handle: &str) -> SteadyResult<()>;

    /// Open a new tab at `url`, switch to it and return its handle
    async fn open_tab(&self, url: &str) -> SteadyResult<String>;

    /// Close the current tab
    async fn close_window(&self) -> SteadyResult<()>;

    /// PNG screenshot of the current tab
    async fn screenshot(&self) -> SteadyResult<Vec<u8>>;

    /// Element holding focus in the current context, if any
    async fn active_element(&self) -> SteadyResult<Option<ElementRef>>;

    /// JavaScript dialog currently blocking the tab, if any
    async fn pending_dialog(&self) -> SteadyResult<Option<Dialog>>;

    /// Accept or dismiss the open dialog, typing `prompt_text` into prompts
    async fn respond_to_dialog(&self, accept: bool, prompt_text: Option<&str>) -> SteadyResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_ref_display() {
        let el = ElementRef::new("7");
        assert_eq!(el.id(), "7");
        assert_eq!(el.to_string(), "element#7");
    }

    #[test]
    fn test_key_codes() {
        assert_eq!(Key::Tab.dom_key(), "Tab");
        assert_eq!(Key::Tab.virtual_key_code(), 9);
        assert_eq!(Key::SelectAll.dom_key(), "a");
    }

    #[test]
    fn test_gesture_names() {
        assert_eq!(Gesture::ContextClick.as_str(), "context_click");
    }
}
