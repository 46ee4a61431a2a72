//! In-page scripts run through the driver's script bridge.
//!
//! Each script is a JavaScript function taking the target element as its
//! only argument. Drivers that talk to a real page evaluate [`PageScript::source`];
//! the mock driver interprets the variant directly.

use serde_json::Value;

/// A script the engine asks the page to run against one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageScript {
    /// `bool`: bounding rect lies inside the window's inner dimensions
    InViewport,
    /// `bool`: the element at the rect's centre is the element or a descendant
    TopmostAtCenter,
    /// Scroll the element to the viewport centre
    ScrollIntoCenter,
    /// `bool`: scroll to centre, then report non-zero size and vertical visibility
    ScrollIntoCenterChecked,
    /// Force a hidden element to `display: block`
    RevealHidden,
    /// Inject a temporary file input that replays its files as a drop on the element.
    /// Returns the injected input.
    InjectDropInput,
    /// Click through `HTMLElement.click()` without pointer simulation
    ScriptClick,
    /// Draw a red border around the element
    Highlight,
    /// `"selected"`, `"unchanged"` or `"missing"`: select the `<option>` whose
    /// visible text matches, firing `input` and `change` only when it was not
    /// already selected
    SelectOptionByText(String),
}

const IN_VIEWPORT: &str = r"function (el) {
  const box = el.getBoundingClientRect();
  const doc = el.ownerDocument || document;
  const win = doc.defaultView || window;
  const vh = win.innerHeight || doc.documentElement.clientHeight;
  const vw = win.innerWidth || doc.documentElement.clientWidth;
  return box.top >= 0 && box.left >= 0 && box.bottom <= vh && box.right <= vw;
}";

const TOPMOST_AT_CENTER: &str = r"function (el) {
  const rect = el.getBoundingClientRect();
  const doc = el.ownerDocument || document;
  const top = doc.elementFromPoint(rect.left + rect.width / 2, rect.top + rect.height / 2);
  return top === el || el.contains(top);
}";

const SCROLL_INTO_CENTER: &str = r"function (el) {
  el.scrollIntoView({ block: 'center' });
  return true;
}";

const SCROLL_INTO_CENTER_CHECKED: &str = r"function (el) {
  el.scrollIntoView({ behavior: 'instant', block: 'center', inline: 'nearest' });
  const rect = el.getBoundingClientRect();
  const win = (el.ownerDocument || document).defaultView || window;
  return !(rect.height === 0 || rect.width === 0 || rect.bottom < 0 || rect.top > win.innerHeight);
}";

const REVEAL_HIDDEN: &str = r"function (el) {
  el.style.display = 'block';
  return true;
}";

const INJECT_DROP_INPUT: &str = r"function (target) {
  const doc = target.ownerDocument || document;
  const win = doc.defaultView || window;
  const input = doc.createElement('INPUT');
  input.type = 'file';
  input.style.display = 'none';
  input.onchange = function () {
    const rect = target.getBoundingClientRect();
    const x = rect.left + (rect.width >> 1);
    const y = rect.top + (rect.height >> 1);
    const dataTransfer = { files: this.files };
    ['dragenter', 'dragover', 'drop'].forEach(function (name) {
      const evt = doc.createEvent('MouseEvent');
      evt.initMouseEvent(name, true, true, win, 0, 0, 0, x, y, false, false, false, false, 0, null);
      evt.dataTransfer = dataTransfer;
      target.dispatchEvent(evt);
    });
    setTimeout(function () { doc.body.removeChild(input); }, 25);
  };
  doc.body.appendChild(input);
  return input;
}";

const SCRIPT_CLICK: &str = r"function (el) {
  el.click();
  return true;
}";

const HIGHLIGHT: &str = r"function (el) {
  el.style.border = '3px solid red';
  return true;
}";

impl PageScript {
    /// JavaScript function source, `function (el) { ... }`
    #[must_use]
    pub fn source(&self) -> String {
        match self {
            Self::InViewport => IN_VIEWPORT.to_string(),
            Self::TopmostAtCenter => TOPMOST_AT_CENTER.to_string(),
            Self::ScrollIntoCenter => SCROLL_INTO_CENTER.to_string(),
            Self::ScrollIntoCenterChecked => SCROLL_INTO_CENTER_CHECKED.to_string(),
            Self::RevealHidden => REVEAL_HIDDEN.to_string(),
            Self::InjectDropInput => INJECT_DROP_INPUT.to_string(),
            Self::ScriptClick => SCRIPT_CLICK.to_string(),
            Self::Highlight => HIGHLIGHT.to_string(),
            Self::SelectOptionByText(text) => {
                let wanted = Value::String(text.clone());
                format!(
                    "function (el) {{\n  \
                       const wanted = {wanted};\n  \
                       const opt = Array.from(el.options || []).find(o => o.text.trim() === wanted.trim());\n  \
                       if (!opt) return 'missing';\n  \
                       if (opt.selected) return 'unchanged';\n  \
                       el.value = opt.value;\n  \
                       opt.selected = true;\n  \
                       el.dispatchEvent(new Event('input', {{ bubbles: true }}));\n  \
                       el.dispatchEvent(new Event('change', {{ bubbles: true }}));\n  \
                       return 'selected';\n\
                     }}"
                )
            }
        }
    }

    /// Short name used in logs and mock call history
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InViewport => "in_viewport",
            Self::TopmostAtCenter => "topmost_at_center",
            Self::ScrollIntoCenter => "scroll_into_center",
            Self::ScrollIntoCenterChecked => "scroll_into_center_checked",
            Self::RevealHidden => "reveal_hidden",
            Self::InjectDropInput => "inject_drop_input",
            Self::ScriptClick => "script_click",
            Self::Highlight => "highlight",
            Self::SelectOptionByText(_) => "select_option_by_text",
        }
    }
}
