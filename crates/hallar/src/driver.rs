//! The driver boundary: the abstract page-automation adapter.
//!
//! Everything Hallar knows about the live document goes through the
//! [`Driver`] trait. A driver resolves selectors to [`ElementHandle`]s,
//! performs single-shot reads and actions on them, and signals a handle that
//! no longer maps to a live DOM node by returning
//! [`HallarError::StaleElement`](crate::HallarError::StaleElement) — the one
//! error family the core treats as recoverable.
//!
//! The core assumes exclusive, non-reentrant access to the document for the
//! duration of a poll; drivers are shared behind `Arc` but are not expected
//! to multiplex concurrent sessions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::query::Selector;
use crate::result::HallarResult;

/// Opaque identity of one located DOM element.
///
/// Two handles refer to the same live element iff they are equal. A replaced
/// DOM node gets a fresh handle; the old one becomes stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(u64);

impl ElementHandle {
    /// Create a handle from a driver-assigned id
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The driver-assigned id
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element #{}", self.0)
    }
}

/// An attribute read result: either string content or a boolean flag.
///
/// HTML boolean attributes (checked, disabled, selected) read as flags, so
/// callers get `true`/`false` rather than `"checked"` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrValue {
    /// String-valued attribute
    Text(String),
    /// Boolean attribute
    Flag(bool),
}

impl AttrValue {
    /// The string content, if this is a text attribute
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Flag(_) => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Abstract page-automation driver.
///
/// Every method is a synchronous single shot against the live document. Any
/// method taking an [`ElementHandle`] must return
/// [`HallarError::StaleElement`](crate::HallarError::StaleElement) when the
/// handle no longer corresponds to a live node, and must reserve that
/// variant for exactly that condition.
pub trait Driver: Send + Sync + fmt::Debug {
    /// Evaluate a selector, scoped to `scope` (or the document when `None`),
    /// returning matches in document order.
    fn resolve(
        &self,
        selector: &Selector,
        scope: Option<&ElementHandle>,
    ) -> HallarResult<Vec<ElementHandle>>;

    /// The element's text content, including descendants
    fn text(&self, element: &ElementHandle) -> HallarResult<String>;

    /// Read one attribute
    fn attribute(&self, element: &ElementHandle, name: &str) -> HallarResult<Option<AttrValue>>;

    /// The element's form value
    fn value(&self, element: &ElementHandle) -> HallarResult<String>;

    /// The element's tag name, lowercased
    fn tag_name(&self, element: &ElementHandle) -> HallarResult<String>;

    /// Whether the element is rendered visible
    fn is_visible(&self, element: &ElementHandle) -> HallarResult<bool>;

    /// Whether the element (or a disabling ancestor control) is disabled
    fn is_disabled(&self, element: &ElementHandle) -> HallarResult<bool>;

    /// Whether a checkbox or radio button is checked
    fn is_checked(&self, element: &ElementHandle) -> HallarResult<bool>;

    /// Whether an option is selected
    fn is_selected(&self, element: &ElementHandle) -> HallarResult<bool>;

    /// Click the element
    fn click(&self, element: &ElementHandle) -> HallarResult<()>;

    /// Set a form field's value verbatim
    fn set_value(&self, element: &ElementHandle, value: &str) -> HallarResult<()>;

    /// Select an `<option>` element
    fn select_option(&self, element: &ElementHandle) -> HallarResult<()>;

    /// Whether the driver executes page scripts.
    ///
    /// Script-capable pages mutate the DOM asynchronously, so queries
    /// against them poll until satisfied; for non-capable drivers a single
    /// evaluation is definitive.
    fn is_js_capable(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_identity() {
        assert_eq!(ElementHandle::new(3), ElementHandle::new(3));
        assert_ne!(ElementHandle::new(3), ElementHandle::new(4));
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(ElementHandle::new(42).to_string(), "element #42");
    }

    #[test]
    fn test_attr_value_text() {
        let attr = AttrValue::from("simple");
        assert_eq!(attr.as_text(), Some("simple"));
    }

    #[test]
    fn test_attr_value_flag() {
        assert_eq!(AttrValue::from(true), AttrValue::Flag(true));
        assert_eq!(AttrValue::from(true).as_text(), None);
    }
}
