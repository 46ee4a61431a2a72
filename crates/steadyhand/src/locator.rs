//! Locator classification for element selection.
//!
//! A locator is a raw string that is auto-classified as XPath or CSS:
//! after trimming, anything starting with `/` or `(` is XPath, everything
//! else is CSS. No syntax validation happens here; a malformed selector
//! only shows up later as "no match" from the query layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Query strategy for a locator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// XPath expression (e.g. `//input[@id='q']`)
    XPath,
    /// CSS selector (e.g. `button.primary`)
    Css,
}

impl Strategy {
    /// Short name used in logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::XPath => "xpath",
            Self::Css => "css",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw locator string
#[must_use]
pub fn resolve(raw: &str) -> Strategy {
    let trimmed = raw.trim();
    if trimmed.starts_with('/') || trimmed.starts_with('(') {
        Strategy::XPath
    } else {
        Strategy::Css
    }
}

/// Quote `text` as an XPath string literal.
///
/// XPath 1.0 has no escape sequences, so text containing both quote kinds
/// is split into a `concat(...)` call.
#[must_use]
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{text}'")
    } else if !text.contains('"') {
        format!("\"{text}\"")
    } else {
        let parts: Vec<String> = text
            .split('\'')
            .map(|part| format!("'{part}'"))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// A trimmed locator together with its resolved strategy.
///
/// Built fresh for every operation call and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    query: String,
    strategy: Strategy,
}

impl Locator {
    /// Parse and classify a raw locator
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self {
            query: raw.trim().to_string(),
            strategy: resolve(raw),
        }
    }

    /// Create a CSS locator without classification (used for shadow-root queries)
    #[must_use]
    pub fn css(selector: &str) -> Self {
        Self {
            query: selector.trim().to_string(),
            strategy: Strategy::Css,
        }
    }

    /// The trimmed query text
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The resolved strategy
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// JavaScript expression returning an array of all matches under `root`,
    /// in document order. `root` must evaluate to a `Document`, `Element` or
    /// `ShadowRoot`; XPath is evaluated against the root's owner document.
    #[must_use]
    pub fn to_query_all(&self, root: &str) -> String {
        let q = &self.query;
        match self.strategy {
            Strategy::Css => format!("Array.from(({root}).querySelectorAll({q:?}))"),
            Strategy::XPath => format!(
                "(function (r) {{ \
                   const d = r.ownerDocument || r; \
                   const s = d.evaluate({q:?}, r, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                   const out = []; \
                   for (let i = 0; i < s.snapshotLength; i++) out.push(s.snapshotItem(i)); \
                   return out; \
                 }})({root})"
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy, self.query)
    }
}

/// A point in 2D space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding box for an element, in CSS pixels relative to the viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the center point
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}
