//! Frame, shadow-root and tab navigation.
//!
//! Switching frames changes the resolution root of every later query on
//! the session. Shadow roots are different: [`ShadowRoot`] is an explicit
//! root for one descendant query and does not pierce nested roots.
//!
//! Tab indices address the *live* handle list. Once tabs close, index 0 is
//! not necessarily the tab the engine started on; use
//! [`InteractionEngine::switch_to_original_tab`] to go home.

use crate::actionability::Readiness;
use crate::driver::{Driver, ElementRef};
use crate::engine::InteractionEngine;
use crate::locator::Locator;
use crate::result::{SteadyError, SteadyResult};
use std::sync::Arc;
use tracing::{debug, info};

/// An open shadow root, usable for a single descendant query
#[derive(Debug)]
pub struct ShadowRoot<D: Driver + ?Sized> {
    driver: Arc<D>,
    host: String,
    root: ElementRef,
}

impl<D: Driver + ?Sized> ShadowRoot<D> {
    /// Locator of the host element
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// First element under the root matching a CSS selector
    pub async fn find(self, css: &str) -> SteadyResult<ElementRef> {
        let selector = Locator::css(css);
        let found = self
            .driver
            .find_in_shadow(&self.root, selector.query())
            .await
            .map_err(|err| err.wrap("find_in_shadow_root", selector.query()))?;
        found.into_iter().next().ok_or_else(|| {
            SteadyError::NotFound {
                locator: format!("{} >>> {}", self.host, selector.query()),
                timeout_ms: 0,
            }
            .wrap("find_in_shadow_root", selector.query())
        })
    }
}

impl<D: Driver + ?Sized> InteractionEngine<D> {
    /// Resolve later queries inside the frame matched by `locator`
    pub async fn switch_to_frame(&mut self, locator: &str) -> SteadyResult<()> {
        let parsed = Locator::parse(locator);
        self.observe("switch_to_frame", parsed.query(), async {
            let frame = self.wait_for(&parsed, Readiness::Visible).await?;
            self.driver().switch_to_frame(&frame).await?;
            debug!(locator = %parsed, "switched to frame");
            Ok(())
        })
        .await
    }

    /// Resolve later queries in the top-level document
    pub async fn switch_to_default_content(&mut self) -> SteadyResult<()> {
        self.observe("switch_to_default_content", "document", async {
            self.driver().switch_to_default_content().await?;
            debug!("switched to default content");
            Ok(())
        })
        .await
    }

    /// Open shadow root of the element matched by `host`
    pub async fn expand_shadow_root(&mut self, host: &str) -> SteadyResult<ShadowRoot<D>> {
        let parsed = Locator::parse(host);
        self.observe("expand_shadow_root", parsed.query(), async {
            let element = self.wait_for(&parsed, Readiness::Present).await?;
            let root = self
                .driver()
                .shadow_root(&element)
                .await?
                .ok_or_else(|| SteadyError::InvalidState {
                    message: format!("{element} has no open shadow root"),
                })?;
            Ok(ShadowRoot {
                driver: Arc::clone(self.driver()),
                host: parsed.query().to_string(),
                root,
            })
        })
        .await
    }

    /// Switch to the tab at `index` in the current handle list
    pub async fn switch_to_tab(&mut self, index: usize) -> SteadyResult<()> {
        let subject = format!("tab[{index}]");
        self.observe("switch_to_tab", &subject, self.switch_to_index(index))
            .await
    }

    /// Switch back to the tab captured when the engine was built
    pub async fn switch_to_original_tab(&mut self) -> SteadyResult<()> {
        let original = self.original_tab().to_string();
        self.observe("switch_to_original_tab", &original, async {
            self.driver().switch_to_window(&original).await?;
            info!(handle = %original, "switched to original tab");
            Ok(())
        })
        .await
    }

    /// Open `url` in a new tab and switch to it, returning its handle
    pub async fn open_new_tab(&mut self, url: &str) -> SteadyResult<String> {
        self.observe("open_new_tab", url, async {
            let handle = self.driver().open_tab(url).await?;
            info!(url, %handle, "opened tab");
            Ok(handle)
        })
        .await
    }

    /// Close the current tab, then switch to `index` in the remaining list
    pub async fn close_current_tab_and_switch_to(&mut self, index: usize) -> SteadyResult<()> {
        let subject = format!("tab[{index}]");
        self.observe("close_current_tab_and_switch_to", &subject, async {
            self.driver().close_window().await?;
            self.switch_to_index(index).await
        })
        .await
    }

    async fn switch_to_index(&self, index: usize) -> SteadyResult<()> {
        let handles = self.driver().window_handles().await?;
        let handle = handles.get(index).ok_or_else(|| SteadyError::InvalidState {
            message: format!("tab index {index} out of bounds ({} open)", handles.len()),
        })?;
        self.driver().switch_to_window(handle).await?;
        info!(index, %handle, "switched tab");
        Ok(())
    }
}
