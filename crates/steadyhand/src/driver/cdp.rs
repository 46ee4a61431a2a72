//! Chrome DevTools Protocol driver.
//!
//! Attaches to a browser that is already running with
//! `--remote-debugging-port`; it never launches or closes one.
//!
//! Element references live in a page-side registry
//! (`window.__steadyhand`) keyed by generated ids. A reference whose node
//! has left the document reports "stale element reference". Frames are
//! resolved through `contentDocument`, so only same-origin frames can be
//! entered.

use super::{Driver, ElementRef, Gesture, Key};
use crate::dialog::{Dialog, DialogKind};
use crate::dom_scripts::PageScript;
use crate::locator::{BoundingBox, Locator};
use crate::result::{SteadyError, SteadyResult};
use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, EventJavascriptDialogOpening,
    HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Page-side registry bootstrap; defines `reg` and `put(node) -> id`
const REGISTRY: &str = "const reg = (window.__steadyhand = window.__steadyhand || { next: 0, els: new Map(), ids: new WeakMap() });
  const sweep = () => { for (const [id, node] of reg.els) { if (!node.isConnected) { reg.els.delete(id); } } };
  const put = (node) => {
    const known = reg.ids.get(node);
    if (known && reg.els.get(known) === node) { return known; }
    sweep();
    const id = 'e' + (reg.next++);
    reg.els.set(id, node);
    reg.ids.set(node, id);
    return id;
  };
  const get = (id) => {
    const node = reg.els.get(id);
    if (!node || !node.isConnected) { reg.els.delete(id); throw new Error('stale element reference: ' + id); }
    return node;
  };";

const IS_DISPLAYED: &str = "function (el) {
  const style = (el.ownerDocument.defaultView || window).getComputedStyle(el);
  if (style.visibility === 'hidden' || style.display === 'none') return false;
  return !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
}";

const BOUNDS_IN_TOP_WINDOW: &str = "function (el) {
  const r = el.getBoundingClientRect();
  let x = r.left, y = r.top;
  let win = el.ownerDocument.defaultView;
  while (win && win.frameElement) {
    const f = win.frameElement.getBoundingClientRect();
    x += f.left; y += f.top;
    win = win.parent;
  }
  return { x: x, y: y, width: r.width, height: r.height };
}";

const CLEAR: &str = "function (el) {
  if ('value' in el) { el.value = ''; } else if (el.isContentEditable) { el.textContent = ''; }
  el.dispatchEvent(new Event('input', { bubbles: true }));
  el.dispatchEvent(new Event('change', { bubbles: true }));
  return true;
}";

/// Attached browser session
pub struct CdpSession {
    address: String,
    browser: Browser,
    current: Mutex<Option<Page>>,
    frame: Mutex<Option<String>>,
    handler: JoinHandle<()>,
    dialog: Arc<Mutex<Option<Dialog>>>,
    dialog_watch: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for CdpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpSession")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Drop for CdpSession {
    fn drop(&mut self) {
        self.handler.abort();
        if let Some(watch) = self.dialog_watch.get_mut().take() {
            watch.abort();
        }
    }
}

fn driver_err(err: impl std::fmt::Display) -> SteadyError {
    SteadyError::driver(err.to_string())
}

fn js_string(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

fn dialog_kind(name: &str) -> DialogKind {
    match name {
        "alert" => DialogKind::Alert,
        "confirm" => DialogKind::Confirm,
        "prompt" => DialogKind::Prompt,
        _ => DialogKind::BeforeUnload,
    }
}

fn handle_of(page: &Page) -> String {
    let id: &str = page.target_id().as_ref();
    id.to_string()
}

impl CdpSession {
    /// Attach to the browser debugging endpoint at `host:port`
    pub async fn attach(address: &str) -> SteadyResult<Self> {
        let url = if address.starts_with("http://") || address.starts_with("ws://") {
            address.to_string()
        } else {
            format!("http://{address}")
        };
        let failed = |message: String| SteadyError::ConnectionFailed {
            address: address.to_string(),
            message,
        };

        let (mut browser, mut handler) = Browser::connect(url)
            .await
            .map_err(|e| failed(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        browser
            .fetch_targets()
            .await
            .map_err(|e| failed(e.to_string()))?;
        // Attached targets surface through the handler asynchronously.
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        let pages = browser.pages().await.map_err(|e| failed(e.to_string()))?;
        let first = pages
            .into_iter()
            .next()
            .ok_or_else(|| failed("browser has no open tab".to_string()))?;

        info!(address, tab = %handle_of(&first), "attached to browser");
        let session = Self {
            address: address.to_string(),
            browser,
            current: Mutex::new(Some(first.clone())),
            frame: Mutex::new(None),
            handler,
            dialog: Arc::new(Mutex::new(None)),
            dialog_watch: Mutex::new(None),
        };
        session.watch_dialogs(&first).await?;
        Ok(session)
    }

    /// Track `Page.javascriptDialogOpening` on `page`, replacing any earlier watch
    async fn watch_dialogs(&self, page: &Page) -> SteadyResult<()> {
        let mut events = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(driver_err)?;
        let slot = Arc::clone(&self.dialog);
        let watch = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let dialog = Dialog {
                    kind: dialog_kind(event.r#type.as_ref()),
                    message: event.message.clone(),
                    default_prompt: event.default_prompt.clone(),
                };
                debug!(kind = %dialog.kind, "dialog opened");
                *slot.lock().await = Some(dialog);
            }
        });
        if let Some(previous) = self.dialog_watch.lock().await.replace(watch) {
            previous.abort();
        }
        *self.dialog.lock().await = None;
        Ok(())
    }

    /// Debugger address this session is attached to
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    async fn page(&self) -> SteadyResult<Page> {
        self.current
            .lock()
            .await
            .clone()
            .ok_or_else(|| SteadyError::driver("no such window: current tab was closed"))
    }

    async fn eval<T: DeserializeOwned>(&self, body: &str) -> SteadyResult<T> {
        let page = self.page().await?;
        let expression = format!("(() => {{\n  {REGISTRY}\n  {body}\n}})()");
        let result = page
            .evaluate_expression(expression)
            .await
            .map_err(|e| SteadyError::script(e.to_string()))?;
        let value = result.value().cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    async fn call<T: DeserializeOwned>(&self, element: &ElementRef, function: &str) -> SteadyResult<T> {
        self.eval(&format!(
            "return ({function})(get({}));",
            js_string(element.id())
        ))
        .await
    }

    async fn root_expression(&self) -> String {
        match self.frame.lock().await.as_deref() {
            Some(frame) => format!("get({}).contentDocument", js_string(frame)),
            None => "document".to_string(),
        }
    }

    async fn center(&self, element: &ElementRef) -> SteadyResult<(f64, f64)> {
        let bounds: BoundingBox = self.call(element, BOUNDS_IN_TOP_WINDOW).await?;
        let center = bounds.center();
        Ok((center.x, center.y))
    }

    async fn mouse(
        &self,
        kind: DispatchMouseEventType,
        (x, y): (f64, f64),
        button: MouseButton,
        click_count: i64,
    ) -> SteadyResult<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(x)
            .y(y)
            .button(button)
            .click_count(click_count)
            .build()
            .map_err(driver_err)?;
        self.page().await?.execute(params).await.map_err(driver_err)?;
        Ok(())
    }

    async fn press(&self, point: (f64, f64), button: MouseButton, click_count: i64) -> SteadyResult<()> {
        self.mouse(DispatchMouseEventType::MousePressed, point, button.clone(), click_count)
            .await?;
        self.mouse(DispatchMouseEventType::MouseReleased, point, button, click_count)
            .await
    }

    async fn key_event(&self, kind: DispatchKeyEventType, key: Key) -> SteadyResult<()> {
        let mut builder = DispatchKeyEventParams::builder()
            .r#type(kind.clone())
            .key(key.dom_key())
            .windows_virtual_key_code(key.virtual_key_code());
        if key == Key::SelectAll {
            // Ctrl
            builder = builder.modifiers(2);
        }
        if kind == DispatchKeyEventType::KeyDown && key == Key::Enter {
            builder = builder.text("\r");
        }
        let params = builder.build().map_err(driver_err)?;
        self.page().await?.execute(params).await.map_err(driver_err)?;
        Ok(())
    }

    async fn focus(&self, element: &ElementRef) -> SteadyResult<()> {
        let _: Value = self.call(element, "function (el) { el.focus(); return true; }").await?;
        Ok(())
    }
}

#[async_trait]
impl Driver for CdpSession {
    async fn find_all(&self, locator: &Locator) -> SteadyResult<Vec<ElementRef>> {
        let root = self.root_expression().await;
        let body = format!("return {}.map(put);", locator.to_query_all(&root));
        let ids: Vec<String> = self.eval(&body).await?;
        debug!(locator = %locator, matched = ids.len(), "queried");
        Ok(ids.into_iter().map(ElementRef::new).collect())
    }

    async fn shadow_root(&self, host: &ElementRef) -> SteadyResult<Option<ElementRef>> {
        let id: Option<String> = self
            .call(host, "function (el) { return el.shadowRoot ? put(el.shadowRoot) : null; }")
            .await?;
        Ok(id.map(ElementRef::new))
    }

    async fn find_in_shadow(&self, root: &ElementRef, css: &str) -> SteadyResult<Vec<ElementRef>> {
        let ids: Vec<String> = self
            .eval(&format!(
                "return {}.map(put);",
                Locator::css(css).to_query_all(&format!("get({})", js_string(root.id())))
            ))
            .await?;
        Ok(ids.into_iter().map(ElementRef::new).collect())
    }

    async fn is_displayed(&self, element: &ElementRef) -> SteadyResult<bool> {
        self.call(element, IS_DISPLAYED).await
    }

    async fn is_enabled(&self, element: &ElementRef) -> SteadyResult<bool> {
        self.call(element, "function (el) { return !el.disabled; }").await
    }

    async fn is_selected(&self, element: &ElementRef) -> SteadyResult<bool> {
        self.call(element, "function (el) { return !!(el.checked || el.selected); }")
            .await
    }

    async fn text(&self, element: &ElementRef) -> SteadyResult<String> {
        self.call(
            element,
            "function (el) { return (el.innerText !== undefined ? el.innerText : el.textContent) || ''; }",
        )
        .await
    }

    async fn property(&self, element: &ElementRef, name: &str) -> SteadyResult<Option<String>> {
        let name = js_string(name);
        self.call(
            element,
            &format!(
                "function (el) {{
  const v = el[{name}];
  if (v !== undefined && v !== null && typeof v !== 'object' && typeof v !== 'function') return String(v);
  return el.getAttribute({name});
}}"
            ),
        )
        .await
    }

    async fn click(&self, element: &ElementRef) -> SteadyResult<()> {
        let point = self.center(element).await?;
        self.mouse(DispatchMouseEventType::MouseMoved, point, MouseButton::None, 0)
            .await?;
        self.press(point, MouseButton::Left, 1).await
    }

    async fn clear(&self, element: &ElementRef) -> SteadyResult<()> {
        let _: Value = self.call(element, CLEAR).await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> SteadyResult<()> {
        self.focus(element).await?;
        let page = self.page().await?;
        for ch in text.chars() {
            let down = DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::KeyDown)
                .text(ch.to_string())
                .key(ch.to_string())
                .build()
                .map_err(driver_err)?;
            page.execute(down).await.map_err(driver_err)?;
            let up = DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::KeyUp)
                .key(ch.to_string())
                .build()
                .map_err(driver_err)?;
            page.execute(up).await.map_err(driver_err)?;
        }
        Ok(())
    }

    async fn press_key(&self, element: &ElementRef, key: Key) -> SteadyResult<()> {
        self.focus(element).await?;
        self.key_event(DispatchKeyEventType::KeyDown, key).await?;
        self.key_event(DispatchKeyEventType::KeyUp, key).await
    }

    async fn gesture(&self, element: &ElementRef, gesture: Gesture) -> SteadyResult<()> {
        let point = self.center(element).await?;
        self.mouse(DispatchMouseEventType::MouseMoved, point, MouseButton::None, 0)
            .await?;
        match gesture {
            Gesture::Hover => Ok(()),
            Gesture::DoubleClick => {
                self.press(point, MouseButton::Left, 1).await?;
                self.press(point, MouseButton::Left, 2).await
            }
            Gesture::ContextClick => self.press(point, MouseButton::Right, 1).await,
        }
    }

    async fn set_files(&self, element: &ElementRef, files: &[PathBuf]) -> SteadyResult<()> {
        let page = self.page().await?;
        let lookup = EvaluateParams::builder()
            .expression(format!(
                "(() => {{\n  {REGISTRY}\n  return get({});\n}})()",
                js_string(element.id())
            ))
            .return_by_value(false)
            .build()
            .map_err(driver_err)?;
        let evaluated = page.execute(lookup).await.map_err(driver_err)?;
        let object_id = evaluated
            .result
            .result
            .object_id
            .clone()
            .ok_or_else(|| SteadyError::driver(format!("{element} has no remote object")))?;
        let params = SetFileInputFilesParams::builder()
            .files(files.iter().map(|p| p.display().to_string()))
            .object_id(object_id)
            .build()
            .map_err(driver_err)?;
        page.execute(params).await.map_err(driver_err)?;
        Ok(())
    }

    async fn run_script(&self, element: &ElementRef, script: &PageScript) -> SteadyResult<Value> {
        self.call(element, &script.source()).await
    }

    async fn run_script_for_element(
        &self,
        element: &ElementRef,
        script: &PageScript,
    ) -> SteadyResult<Option<ElementRef>> {
        let id: Option<String> = self
            .eval(&format!(
                "const out = ({})(get({}));\n  return out ? put(out) : null;",
                script.source(),
                js_string(element.id())
            ))
            .await?;
        Ok(id.map(ElementRef::new))
    }

    async fn navigate(&self, url: &str) -> SteadyResult<()> {
        self.page().await?.goto(url).await.map_err(driver_err)?;
        *self.frame.lock().await = None;
        Ok(())
    }

    async fn switch_to_frame(&self, frame: &ElementRef) -> SteadyResult<()> {
        let accessible: bool = self
            .call(frame, "function (el) { return !!el.contentDocument; }")
            .await?;
        if !accessible {
            return Err(SteadyError::driver(format!(
                "{frame} is not a same-origin frame"
            )));
        }
        *self.frame.lock().await = Some(frame.id().to_string());
        Ok(())
    }

    async fn switch_to_default_content(&self) -> SteadyResult<()> {
        *self.frame.lock().await = None;
        Ok(())
    }

    async fn window_handles(&self) -> SteadyResult<Vec<String>> {
        let pages = self.browser.pages().await.map_err(driver_err)?;
        Ok(pages.iter().map(handle_of).collect())
    }

    async fn current_window(&self) -> SteadyResult<String> {
        Ok(handle_of(&self.page().await?))
    }

    async fn switch_to_window(&self, handle: &str) -> SteadyResult<()> {
        let pages = self.browser.pages().await.map_err(driver_err)?;
        let page = pages
            .into_iter()
            .find(|p| handle_of(p) == handle)
            .ok_or_else(|| SteadyError::driver(format!("no such window: {handle}")))?;
        page.bring_to_front().await.map_err(driver_err)?;
        self.watch_dialogs(&page).await?;
        *self.current.lock().await = Some(page);
        *self.frame.lock().await = None;
        Ok(())
    }

    async fn open_tab(&self, url: &str) -> SteadyResult<String> {
        let page = self.browser.new_page(url).await.map_err(driver_err)?;
        let handle = handle_of(&page);
        self.watch_dialogs(&page).await?;
        *self.current.lock().await = Some(page);
        *self.frame.lock().await = None;
        Ok(handle)
    }

    async fn close_window(&self) -> SteadyResult<()> {
        let page = self
            .current
            .lock()
            .await
            .take()
            .ok_or_else(|| SteadyError::driver("no such window"))?;
        *self.frame.lock().await = None;
        if let Err(err) = page.close().await {
            warn!(error = %err, "closing tab failed");
            return Err(driver_err(err));
        }
        Ok(())
    }

    async fn screenshot(&self) -> SteadyResult<Vec<u8>> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = self
            .page()
            .await?
            .execute(params)
            .await
            .map_err(driver_err)?;
        base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(driver_err)
    }

    async fn active_element(&self) -> SteadyResult<Option<ElementRef>> {
        let root = self.root_expression().await;
        let id: Option<String> = self
            .eval(&format!(
                "const doc = {root};
  let el = doc.activeElement;
  while (el && el.shadowRoot && el.shadowRoot.activeElement) {{ el = el.shadowRoot.activeElement; }}
  return el && el !== doc.body ? put(el) : null;"
            ))
            .await?;
        Ok(id.map(ElementRef::new))
    }

    async fn pending_dialog(&self) -> SteadyResult<Option<Dialog>> {
        Ok(self.dialog.lock().await.clone())
    }

    async fn respond_to_dialog(&self, accept: bool, prompt_text: Option<&str>) -> SteadyResult<()> {
        let mut builder = HandleJavaScriptDialogParams::builder().accept(accept);
        if let Some(text) = prompt_text {
            builder = builder.prompt_text(text);
        }
        let params = builder.build().map_err(driver_err)?;
        self.page().await?.execute(params).await.map_err(driver_err)?;
        *self.dialog.lock().await = None;
        info!(accept, "dialog closed");
        Ok(())
    }
}
