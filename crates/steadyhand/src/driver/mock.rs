//! Mock driver for unit testing.
//!
//! [`MockDriver`] models a small page: elements registered under locator
//! strings (in document order), frames, open shadow roots, tabs, and
//! debounced suggestion lists whose contents depend on an input's current
//! value, focus, and queued JavaScript dialogs. Every driver call is appended to a timestamped call history so
//! tests can assert which elements were probed and when.

use super::{Driver, ElementRef, Gesture, Key};
use crate::dialog::Dialog;
use crate::dom_scripts::PageScript;
use crate::locator::Locator;
use crate::result::{SteadyError, SteadyResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Element kinds with distinct click/keyboard behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockKind {
    /// Anything without special behaviour (div, span, button)
    Generic,
    /// Text input or textarea
    TextInput,
    /// Checkbox (click toggles)
    Checkbox,
    /// Radio button (click selects)
    Radio,
    /// `<select>` with options
    Select,
    /// `<input type=file>`
    FileInput,
    /// `<iframe>`
    Frame,
}

/// What a click on the element does to the page
#[derive(Debug, Clone, PartialEq, Eq)]
enum ClickEffect {
    None,
    /// Suggestion entry: copy its text into the owning input
    FillInput(usize),
}

/// A modelled DOM element
#[derive(Debug, Clone)]
pub struct MockElement {
    /// Behaviour kind
    pub kind: MockKind,
    /// Native displayed state
    pub displayed: bool,
    /// Native enabled state
    pub enabled: bool,
    /// Checked/selected state
    pub selected: bool,
    /// Whether the bounding rect is inside the viewport
    pub in_viewport: bool,
    /// Whether the element is topmost at its centre
    pub topmost: bool,
    /// Rendered width
    pub width: f64,
    /// Rendered height
    pub height: f64,
    /// Rendered text
    pub text: String,
    /// Current `value` property
    pub value: String,
    /// Options of a `<select>`
    pub options: Vec<String>,
    /// Truncate typed values to this many characters
    pub max_length: Option<usize>,
    /// Files set on a file input
    pub files: Vec<PathBuf>,
    /// Files received through a synthetic drop
    pub dropped: Vec<PathBuf>,
    /// Other DOM properties
    pub props: BTreeMap<String, String>,
    appears_after: Option<Duration>,
    covered_until: Option<Duration>,
    removed: bool,
    select_all: bool,
    click_effect: ClickEffect,
    drop_target: Option<usize>,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            kind: MockKind::Generic,
            displayed: true,
            enabled: true,
            selected: false,
            in_viewport: true,
            topmost: true,
            width: 120.0,
            height: 24.0,
            text: String::new(),
            value: String::new(),
            options: Vec::new(),
            max_length: None,
            files: Vec::new(),
            dropped: Vec::new(),
            props: BTreeMap::new(),
            appears_after: None,
            covered_until: None,
            removed: false,
            select_all: false,
            click_effect: ClickEffect::None,
            drop_target: None,
        }
    }
}

impl MockElement {
    /// A visible, enabled, uncovered generic element with text
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// An empty text input
    #[must_use]
    pub fn input() -> Self {
        Self {
            kind: MockKind::TextInput,
            ..Self::default()
        }
    }

    /// A checkbox in the given state
    #[must_use]
    pub fn checkbox(checked: bool) -> Self {
        Self {
            kind: MockKind::Checkbox,
            selected: checked,
            ..Self::default()
        }
    }

    /// A radio button in the given state
    #[must_use]
    pub fn radio(selected: bool) -> Self {
        Self {
            kind: MockKind::Radio,
            selected,
            ..Self::default()
        }
    }

    /// A `<select>` with the given option texts
    #[must_use]
    pub fn select<S: Into<String>>(options: impl IntoIterator<Item = S>) -> Self {
        Self {
            kind: MockKind::Select,
            options: options.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// A file input
    #[must_use]
    pub fn file_input() -> Self {
        Self {
            kind: MockKind::FileInput,
            ..Self::default()
        }
    }

    /// An iframe
    #[must_use]
    pub fn frame() -> Self {
        Self {
            kind: MockKind::Frame,
            ..Self::default()
        }
    }

    /// Not displayed
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Not enabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Another element sits on top of this one's centre
    #[must_use]
    pub fn covered(mut self) -> Self {
        self.topmost = false;
        self
    }

    /// Covered by an overlay that goes away after `delay`
    #[must_use]
    pub fn covered_for(mut self, delay: Duration) -> Self {
        self.covered_until = Some(delay);
        self
    }

    /// Outside the viewport until scrolled
    #[must_use]
    pub fn offscreen(mut self) -> Self {
        self.in_viewport = false;
        self
    }

    /// Rendered with zero size
    #[must_use]
    pub fn zero_size(mut self) -> Self {
        self.width = 0.0;
        self.height = 0.0;
        self
    }

    /// Not in the DOM until `delay` has passed
    #[must_use]
    pub fn appearing_after(mut self, delay: Duration) -> Self {
        self.appears_after = Some(delay);
        self
    }

    /// Initial `value`
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Truncate typed text to `max` characters
    #[must_use]
    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Set an arbitrary DOM property
    #[must_use]
    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    fn push_text(&mut self, text: &str) {
        if self.select_all {
            self.value.clear();
            self.select_all = false;
        }
        self.value.push_str(text);
        if let Some(max) = self.max_length {
            self.value = self.value.chars().take(max).collect();
        }
    }
}

/// One recorded driver call
#[derive(Debug, Clone)]
pub struct MockCall {
    /// When the call happened
    pub at: Instant,
    /// `method:detail` description
    pub entry: String,
}

type SuggestFn = Box<dyn Fn(&str) -> Vec<String> + Send + Sync>;

struct SuggestionList {
    query: String,
    input: usize,
    suggest: SuggestFn,
    rendered: HashMap<String, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Document,
    Frame(usize),
}

struct MockPage {
    started: Instant,
    elements: Vec<MockElement>,
    // (query, scope, element index) in document order
    registry: Vec<(String, Scope, usize)>,
    shadow_roots: HashMap<usize, usize>,
    shadow_children: Vec<(usize, String, usize)>,
    suggestions: Vec<SuggestionList>,
    scope: Scope,
    tabs: Vec<String>,
    current_tab: Option<String>,
    next_tab: usize,
    url: String,
    history: Vec<MockCall>,
    failing_probes: HashMap<usize, String>,
    focused: Option<usize>,
    dialogs: VecDeque<Dialog>,
}

impl MockPage {
    fn record(&mut self, entry: String) {
        self.history.push(MockCall {
            at: Instant::now(),
            entry,
        });
    }

    fn index(&self, element: &ElementRef) -> SteadyResult<usize> {
        element
            .id()
            .parse::<usize>()
            .ok()
            .filter(|i| *i < self.elements.len() && !self.elements[*i].removed)
            .ok_or_else(|| SteadyError::driver(format!("stale element reference: {element}")))
    }

    fn element_mut(&mut self, element: &ElementRef) -> SteadyResult<&mut MockElement> {
        let i = self.index(element)?;
        Ok(&mut self.elements[i])
    }

    fn present(&self, i: usize) -> bool {
        let el = &self.elements[i];
        !el.removed
            && el
                .appears_after
                .map_or(true, |d| self.started.elapsed() >= d)
    }

    fn topmost(&self, i: usize) -> bool {
        let el = &self.elements[i];
        el.topmost
            && el
                .covered_until
                .map_or(true, |d| self.started.elapsed() >= d)
    }

    fn probe(&mut self, method: &str, element: &ElementRef) -> SteadyResult<usize> {
        self.record(format!("{method}:{}", element.id()));
        let i = self.index(element)?;
        if let Some(message) = self.failing_probes.get(&i) {
            return Err(SteadyError::driver(message.clone()));
        }
        Ok(i)
    }

    fn insert(&mut self, element: MockElement) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    fn render_suggestions(&mut self, list: usize) -> Vec<usize> {
        let input = self.suggestions[list].input;
        let typed = self.elements[input].value.clone();
        let texts = (self.suggestions[list].suggest)(&typed);
        let mut ids = Vec::with_capacity(texts.len());
        for text in texts {
            let existing = self.suggestions[list].rendered.get(&text).copied();
            let id = if let Some(id) = existing {
                id
            } else {
                let mut option = MockElement::new(text.clone());
                option.click_effect = ClickEffect::FillInput(input);
                let id = self.insert(option);
                self.suggestions[list].rendered.insert(text, id);
                id
            };
            ids.push(id);
        }
        ids
    }

    fn apply_click(&mut self, i: usize) {
        let kind = self.elements[i].kind;
        match kind {
            MockKind::Checkbox => self.elements[i].selected = !self.elements[i].selected,
            MockKind::Radio => self.elements[i].selected = true,
            _ => {}
        }
        if let ClickEffect::FillInput(input) = self.elements[i].click_effect.clone() {
            let text = self.elements[i].text.clone();
            self.elements[input].value = text;
        }
    }
}

/// Mock driver for unit testing
pub struct MockDriver {
    page: Mutex<MockPage>,
}

impl fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let page = self.page();
        f.debug_struct("MockDriver")
            .field("elements", &page.elements.len())
            .field("calls", &page.history.len())
            .finish_non_exhaustive()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// Create an empty page with one tab
    #[must_use]
    pub fn new() -> Self {
        Self {
            page: Mutex::new(MockPage {
                started: Instant::now(),
                elements: Vec::new(),
                registry: Vec::new(),
                shadow_roots: HashMap::new(),
                shadow_children: Vec::new(),
                suggestions: Vec::new(),
                scope: Scope::Document,
                tabs: vec!["tab-0".to_string()],
                current_tab: Some("tab-0".to_string()),
                next_tab: 1,
                url: String::from("about:blank"),
                history: Vec::new(),
                failing_probes: HashMap::new(),
                focused: None,
                dialogs: VecDeque::new(),
            }),
        }
    }

    fn page(&self) -> MutexGuard<'_, MockPage> {
        self.page.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an element under `locator` in the top-level document
    pub fn add(&self, locator: &str, element: MockElement) -> ElementRef {
        let mut page = self.page();
        let i = page.insert(element);
        page.registry
            .push((Locator::parse(locator).query().to_string(), Scope::Document, i));
        ElementRef::new(i.to_string())
    }

    /// Register an element under `locator` inside a frame's document
    pub fn add_in_frame(&self, frame: &ElementRef, locator: &str, element: MockElement) -> ElementRef {
        let mut page = self.page();
        let frame_index = frame.id().parse::<usize>().unwrap_or(usize::MAX);
        let i = page.insert(element);
        page.registry.push((
            Locator::parse(locator).query().to_string(),
            Scope::Frame(frame_index),
            i,
        ));
        ElementRef::new(i.to_string())
    }

    /// Attach an element to `host`'s open shadow root under a CSS selector
    pub fn add_in_shadow(&self, host: &ElementRef, css: &str, element: MockElement) -> ElementRef {
        let mut page = self.page();
        let host_index = host.id().parse::<usize>().unwrap_or(usize::MAX);
        let root = if let Some(root) = page.shadow_roots.get(&host_index) {
            *root
        } else {
            let root = page.insert(MockElement::new(""));
            page.shadow_roots.insert(host_index, root);
            root
        };
        let i = page.insert(element);
        page.shadow_children.push((root, css.trim().to_string(), i));
        ElementRef::new(i.to_string())
    }

    /// Render a suggestion list under `locator`, derived from `input`'s current value.
    ///
    /// Clicking a rendered suggestion copies its text into the input.
    pub fn add_suggestions<F>(&self, locator: &str, input: &ElementRef, suggest: F)
    where
        F: Fn(&str) -> Vec<String> + Send + Sync + 'static,
    {
        let mut page = self.page();
        let input_index = input.id().parse::<usize>().unwrap_or(usize::MAX);
        page.suggestions.push(SuggestionList {
            query: Locator::parse(locator).query().to_string(),
            input: input_index,
            suggest: Box::new(suggest),
            rendered: HashMap::new(),
        });
    }

    /// Make every probe of `element` fail with a driver error
    pub fn fail_probes(&self, element: &ElementRef, message: &str) {
        let mut page = self.page();
        if let Ok(i) = page.index(element) {
            page.failing_probes.insert(i, message.to_string());
        }
    }

    /// Give `element` keyboard focus
    pub fn focus(&self, element: &ElementRef) {
        let mut page = self.page();
        page.focused = page.index(element).ok();
    }

    /// Queue a JavaScript dialog; the oldest one blocks the tab until answered
    pub fn open_dialog(&self, dialog: Dialog) {
        self.page().dialogs.push_back(dialog);
    }

    /// Snapshot of an element's current state
    #[must_use]
    pub fn element(&self, element: &ElementRef) -> Option<MockElement> {
        let page = self.page();
        element
            .id()
            .parse::<usize>()
            .ok()
            .and_then(|i| page.elements.get(i).cloned())
    }

    /// Current `value` of an element (empty when unknown)
    #[must_use]
    pub fn value_of(&self, element: &ElementRef) -> String {
        self.element(element).map(|e| e.value).unwrap_or_default()
    }

    /// Whether an element has been removed from the page
    #[must_use]
    pub fn is_removed(&self, element: &ElementRef) -> bool {
        self.element(element).map_or(true, |e| e.removed)
    }

    /// Currently loaded URL
    #[must_use]
    pub fn url(&self) -> String {
        self.page().url.clone()
    }

    /// Full call history
    #[must_use]
    pub fn history(&self) -> Vec<MockCall> {
        self.page().history.clone()
    }

    /// Call history entries only
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.page().history.iter().map(|c| c.entry.clone()).collect()
    }

    /// Check if any call starts with `prefix`
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.page().history.iter().any(|c| c.entry.starts_with(prefix))
    }

    /// Number of calls starting with `prefix`
    #[must_use]
    pub fn count(&self, prefix: &str) -> usize {
        self.page()
            .history
            .iter()
            .filter(|c| c.entry.starts_with(prefix))
            .count()
    }

    /// Timestamps of calls starting with `prefix`
    #[must_use]
    pub fn times_of(&self, prefix: &str) -> Vec<Instant> {
        self.page()
            .history
            .iter()
            .filter(|c| c.entry.starts_with(prefix))
            .map(|c| c.at)
            .collect()
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn find_all(&self, locator: &Locator) -> SteadyResult<Vec<ElementRef>> {
        let mut page = self.page();
        page.record(format!("find_all:{}", locator.query()));
        let scope = page.scope;

        let mut found: Vec<usize> = page
            .registry
            .iter()
            .filter(|(query, s, _)| query == locator.query() && *s == scope)
            .map(|(_, _, i)| *i)
            .collect();
        found.retain(|i| page.present(*i));

        if scope == Scope::Document {
            let lists: Vec<usize> = (0..page.suggestions.len())
                .filter(|l| page.suggestions[*l].query == locator.query())
                .collect();
            for list in lists {
                found.extend(page.render_suggestions(list));
            }
        }

        Ok(found.into_iter().map(|i| ElementRef::new(i.to_string())).collect())
    }

    async fn shadow_root(&self, host: &ElementRef) -> SteadyResult<Option<ElementRef>> {
        let mut page = self.page();
        page.record(format!("shadow_root:{}", host.id()));
        let i = page.index(host)?;
        Ok(page
            .shadow_roots
            .get(&i)
            .map(|root| ElementRef::new(root.to_string())))
    }

    async fn find_in_shadow(&self, root: &ElementRef, css: &str) -> SteadyResult<Vec<ElementRef>> {
        let mut page = self.page();
        page.record(format!("find_in_shadow:{}:{css}", root.id()));
        let r = page.index(root)?;
        let css = css.trim();
        Ok(page
            .shadow_children
            .iter()
            .filter(|(owner, sel, _)| *owner == r && sel == css)
            .map(|(_, _, i)| ElementRef::new(i.to_string()))
            .collect())
    }

    async fn is_displayed(&self, element: &ElementRef) -> SteadyResult<bool> {
        let mut page = self.page();
        let i = page.probe("is_displayed", element)?;
        Ok(page.elements[i].displayed)
    }

    async fn is_enabled(&self, element: &ElementRef) -> SteadyResult<bool> {
        let mut page = self.page();
        let i = page.probe("is_enabled", element)?;
        Ok(page.elements[i].enabled)
    }

    async fn is_selected(&self, element: &ElementRef) -> SteadyResult<bool> {
        let mut page = self.page();
        let i = page.probe("is_selected", element)?;
        Ok(page.elements[i].selected)
    }

    async fn text(&self, element: &ElementRef) -> SteadyResult<String> {
        let mut page = self.page();
        let i = page.probe("text", element)?;
        Ok(page.elements[i].text.clone())
    }

    async fn property(&self, element: &ElementRef, name: &str) -> SteadyResult<Option<String>> {
        let mut page = self.page();
        page.record(format!("property:{name}:{}", element.id()));
        let i = page.index(element)?;
        let el = &page.elements[i];
        Ok(match name {
            "value" => Some(el.value.clone()),
            "checked" => Some(el.selected.to_string()),
            _ => el.props.get(name).cloned(),
        })
    }

    async fn click(&self, element: &ElementRef) -> SteadyResult<()> {
        let mut page = self.page();
        page.record(format!("click:{}", element.id()));
        let i = page.index(element)?;
        page.focused = Some(i);
        page.apply_click(i);
        Ok(())
    }

    async fn clear(&self, element: &ElementRef) -> SteadyResult<()> {
        let mut page = self.page();
        page.record(format!("clear:{}", element.id()));
        let el = page.element_mut(element)?;
        el.value.clear();
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> SteadyResult<()> {
        let mut page = self.page();
        page.record(format!("send_keys:{}:{text}", element.id()));
        let i = page.index(element)?;
        page.focused = Some(i);
        let el = &mut page.elements[i];
        el.push_text(text);
        Ok(())
    }

    async fn press_key(&self, element: &ElementRef, key: Key) -> SteadyResult<()> {
        let mut page = self.page();
        page.record(format!("press_key:{}:{key:?}", element.id()));
        let el = page.element_mut(element)?;
        match key {
            Key::SelectAll => el.select_all = true,
            Key::Delete | Key::Backspace if el.select_all => {
                el.value.clear();
                el.select_all = false;
            }
            Key::Backspace => {
                el.value.pop();
            }
            _ => el.select_all = false,
        }
        Ok(())
    }

    async fn gesture(&self, element: &ElementRef, gesture: Gesture) -> SteadyResult<()> {
        let mut page = self.page();
        page.record(format!("gesture:{}:{}", gesture.as_str(), element.id()));
        page.index(element)?;
        Ok(())
    }

    async fn set_files(&self, element: &ElementRef, files: &[PathBuf]) -> SteadyResult<()> {
        let mut page = self.page();
        page.record(format!("set_files:{}", element.id()));
        let i = page.index(element)?;
        if page.elements[i].kind != MockKind::FileInput {
            return Err(SteadyError::driver("element is not a file input"));
        }
        if !page.elements[i].displayed {
            return Err(SteadyError::driver("element not interactable"));
        }
        page.elements[i].files = files.to_vec();
        if let Some(target) = page.elements[i].drop_target {
            page.elements[target].dropped.extend(files.iter().cloned());
            page.elements[i].removed = true;
            page.record(format!("drop:{target}"));
        }
        Ok(())
    }

    async fn run_script(&self, element: &ElementRef, script: &PageScript) -> SteadyResult<Value> {
        let mut page = self.page();
        let i = page.probe(&format!("run_script:{}", script.name()), element)?;
        let value = match script {
            PageScript::InViewport => json!(page.elements[i].in_viewport),
            PageScript::TopmostAtCenter => json!(page.topmost(i)),
            PageScript::ScrollIntoCenter => {
                page.elements[i].in_viewport = true;
                json!(true)
            }
            PageScript::ScrollIntoCenterChecked => {
                let el = &mut page.elements[i];
                el.in_viewport = true;
                json!(el.displayed && el.width > 0.0 && el.height > 0.0)
            }
            PageScript::RevealHidden => {
                page.elements[i].displayed = true;
                json!(true)
            }
            PageScript::ScriptClick => {
                page.apply_click(i);
                json!(true)
            }
            PageScript::Highlight => {
                page.elements[i]
                    .props
                    .insert("style.border".into(), "3px solid red".into());
                json!(true)
            }
            PageScript::SelectOptionByText(text) => {
                let el = &mut page.elements[i];
                let wanted = text.trim();
                if !el.options.iter().any(|o| o.trim() == wanted) {
                    json!("missing")
                } else if el.value == wanted {
                    json!("unchanged")
                } else {
                    el.value = wanted.to_string();
                    json!("selected")
                }
            }
            PageScript::InjectDropInput => {
                return Err(SteadyError::script(
                    "inject_drop_input returns an element; use run_script_for_element",
                ))
            }
        };
        Ok(value)
    }

    async fn run_script_for_element(
        &self,
        element: &ElementRef,
        script: &PageScript,
    ) -> SteadyResult<Option<ElementRef>> {
        let mut page = self.page();
        let target = page.probe(&format!("run_script:{}", script.name()), element)?;
        match script {
            PageScript::InjectDropInput => {
                let mut input = MockElement::file_input();
                input.drop_target = Some(target);
                let i = page.insert(input);
                Ok(Some(ElementRef::new(i.to_string())))
            }
            _ => Ok(None),
        }
    }

    async fn navigate(&self, url: &str) -> SteadyResult<()> {
        let mut page = self.page();
        page.record(format!("navigate:{url}"));
        page.url = url.to_string();
        Ok(())
    }

    async fn switch_to_frame(&self, frame: &ElementRef) -> SteadyResult<()> {
        let mut page = self.page();
        page.record(format!("switch_to_frame:{}", frame.id()));
        let i = page.index(frame)?;
        if page.elements[i].kind != MockKind::Frame {
            return Err(SteadyError::driver("element is not a frame"));
        }
        page.scope = Scope::Frame(i);
        Ok(())
    }

    async fn switch_to_default_content(&self) -> SteadyResult<()> {
        let mut page = self.page();
        page.record("switch_to_default_content".to_string());
        page.scope = Scope::Document;
        Ok(())
    }

    async fn window_handles(&self) -> SteadyResult<Vec<String>> {
        let mut page = self.page();
        page.record("window_handles".to_string());
        Ok(page.tabs.clone())
    }

    async fn current_window(&self) -> SteadyResult<String> {
        let mut page = self.page();
        page.record("current_window".to_string());
        page.current_tab
            .clone()
            .ok_or_else(|| SteadyError::driver("no such window: current tab was closed"))
    }

    async fn switch_to_window(&self, handle: &str) -> SteadyResult<()> {
        let mut page = self.page();
        page.record(format!("switch_to_window:{handle}"));
        if !page.tabs.iter().any(|t| t == handle) {
            return Err(SteadyError::driver(format!("no such window: {handle}")));
        }
        page.current_tab = Some(handle.to_string());
        page.scope = Scope::Document;
        Ok(())
    }

    async fn open_tab(&self, url: &str) -> SteadyResult<String> {
        let mut page = self.page();
        page.record(format!("open_tab:{url}"));
        let handle = format!("tab-{}", page.next_tab);
        page.next_tab += 1;
        page.tabs.push(handle.clone());
        page.current_tab = Some(handle.clone());
        page.url = url.to_string();
        Ok(handle)
    }

    async fn close_window(&self) -> SteadyResult<()> {
        let mut page = self.page();
        page.record("close_window".to_string());
        let current = page
            .current_tab
            .take()
            .ok_or_else(|| SteadyError::driver("no such window"))?;
        page.tabs.retain(|t| *t != current);
        Ok(())
    }

    async fn screenshot(&self) -> SteadyResult<Vec<u8>> {
        let mut page = self.page();
        page.record("screenshot".to_string());
        Ok(vec![0x89, 0x50, 0x4E, 0x47])
    }

    async fn active_element(&self) -> SteadyResult<Option<ElementRef>> {
        let mut page = self.page();
        page.record("active_element".to_string());
        let focused = page.focused.filter(|i| page.present(*i));
        Ok(focused.map(|i| ElementRef::new(i.to_string())))
    }

    async fn pending_dialog(&self) -> SteadyResult<Option<Dialog>> {
        let mut page = self.page();
        page.record("pending_dialog".to_string());
        Ok(page.dialogs.front().cloned())
    }

    async fn respond_to_dialog(&self, accept: bool, prompt_text: Option<&str>) -> SteadyResult<()> {
        let mut page = self.page();
        page.record(format!(
            "respond_to_dialog:{accept}:{}",
            prompt_text.unwrap_or_default()
        ));
        page.dialogs
            .pop_front()
            .map(|_| ())
            .ok_or_else(|| SteadyError::driver("no dialog is open"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_all_returns_document_order() {
        let driver = MockDriver::new();
        let a = driver.add("li", MockElement::new("a"));
        let b = driver.add("li", MockElement::new("b"));
        driver.add("p", MockElement::new("c"));

        let found = driver.find_all(&Locator::parse("li")).await.unwrap();
        assert_eq!(found, vec![a, b]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_element_appears_after_delay() {
        let driver = MockDriver::new();
        driver.add("#late", MockElement::new("x").appearing_after(Duration::from_secs(2)));
        let locator = Locator::parse("#late");

        assert!(driver.find_all(&locator).await.unwrap().is_empty());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(driver.find_all(&locator).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_select_all_then_delete_clears() {
        let driver = MockDriver::new();
        let input = driver.add("#q", MockElement::input().with_value("old"));
        driver.press_key(&input, Key::SelectAll).await.unwrap();
        driver.press_key(&input, Key::Delete).await.unwrap();
        assert_eq!(driver.value_of(&input), "");
    }

    #[tokio::test]
    async fn test_max_length_truncates() {
        let driver = MockDriver::new();
        let input = driver.add("#q", MockElement::input().with_max_length(3));
        driver.send_keys(&input, "abcdef").await.unwrap();
        assert_eq!(driver.value_of(&input), "abc");
    }

    #[tokio::test]
    async fn test_suggestion_click_fills_input() {
        let driver = MockDriver::new();
        let input = driver.add("#city", MockElement::input().with_value("Par"));
        driver.add_suggestions("li.suggestion", &input, |typed| {
            vec![format!("{typed}is"), format!("{typed}ma")]
        });

        let options = driver.find_all(&Locator::parse("li.suggestion")).await.unwrap();
        assert_eq!(options.len(), 2);
        driver.click(&options[1]).await.unwrap();
        assert_eq!(driver.value_of(&input), "Parma");
    }

    #[tokio::test]
    async fn test_frame_scoping() {
        let driver = MockDriver::new();
        let frame = driver.add("iframe", MockElement::frame());
        let inner = driver.add_in_frame(&frame, "#inside", MockElement::new("in"));
        let locator = Locator::parse("#inside");

        assert!(driver.find_all(&locator).await.unwrap().is_empty());
        driver.switch_to_frame(&frame).await.unwrap();
        assert_eq!(driver.find_all(&locator).await.unwrap(), vec![inner]);
        driver.switch_to_default_content().await.unwrap();
        assert!(driver.find_all(&locator).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tabs_lifecycle() {
        let driver = MockDriver::new();
        let new_tab = driver.open_tab("https://example.com").await.unwrap();
        assert_eq!(driver.window_handles().await.unwrap().len(), 2);
        assert_eq!(driver.current_window().await.unwrap(), new_tab);

        driver.close_window().await.unwrap();
        assert!(driver.current_window().await.is_err());
        assert_eq!(driver.window_handles().await.unwrap(), vec!["tab-0".to_string()]);
    }

    #[tokio::test]
    async fn test_drop_input_delivers_files_and_removes_itself() {
        let driver = MockDriver::new();
        let zone = driver.add("#drop", MockElement::new("drop here"));
        let input = driver
            .run_script_for_element(&zone, &PageScript::InjectDropInput)
            .await
            .unwrap()
            .unwrap();
        driver.set_files(&input, &[PathBuf::from("/tmp/a.txt")]).await.unwrap();

        assert!(driver.is_removed(&input));
        assert_eq!(driver.element(&zone).unwrap().dropped, vec![PathBuf::from("/tmp/a.txt")]);
    }

    #[tokio::test]
    async fn test_click_moves_focus() {
        let driver = MockDriver::new();
        let a = driver.add("#a", MockElement::input());
        let b = driver.add("#b", MockElement::new("b"));
        assert_eq!(driver.active_element().await.unwrap(), None);

        driver.send_keys(&a, "x").await.unwrap();
        assert_eq!(driver.active_element().await.unwrap(), Some(a));
        driver.click(&b).await.unwrap();
        assert_eq!(driver.active_element().await.unwrap(), Some(b));
    }

    #[tokio::test]
    async fn test_dialogs_answered_in_order() {
        let driver = MockDriver::new();
        driver.open_dialog(Dialog::alert("first"));
        driver.open_dialog(Dialog::confirm("second"));

        assert_eq!(driver.pending_dialog().await.unwrap().unwrap().message, "first");
        driver.respond_to_dialog(true, None).await.unwrap();
        assert_eq!(driver.pending_dialog().await.unwrap().unwrap().message, "second");
        driver.respond_to_dialog(false, None).await.unwrap();
        assert!(driver.pending_dialog().await.unwrap().is_none());
        assert!(driver.respond_to_dialog(true, None).await.is_err());
    }

    #[tokio::test]
    async fn test_stale_reference_errors() {
        let driver = MockDriver::new();
        let err = driver.click(&ElementRef::new("99")).await.unwrap_err();
        assert!(err.to_string().contains("stale element reference"));
    }
}
