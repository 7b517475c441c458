//! Stale-reference-safe element handles.
//!
//! An [`Element`] wraps one located DOM element together with the scope it
//! was searched from and the query that produced it. The underlying
//! [`ElementHandle`] is owned exclusively by the element until a reload
//! replaces it.
//!
//! Lifecycle: an element is *live* while its handle maps to a DOM node,
//! becomes *stale* when the driver signals invalidity, and returns to live
//! when [`Element::reload`] re-resolves its originating query. An element
//! never silently returns stale data — every read or action either operates
//! on a live node or fails with the stale-reference error, unless automatic
//! reload intervenes first.
//!
//! Elements taken out of `find_all` by index carry no re-executable
//! single-result query, so they cannot be reloaded: once their backing node
//! is gone they keep raising the stale-reference error, even under
//! `automatic_reload`. This is deliberate; re-resolving an index into a
//! changed collection could silently hand back the wrong member.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::config;
use crate::driver::{AttrValue, Driver, ElementHandle};
use crate::poller;
use crate::query::Query;
use crate::result::{HallarError, HallarResult};

/// The scope a query is evaluated against: the whole document or one
/// element's subtree.
///
/// Scope chains are tree-structured from the document root, so recursive
/// reload along the chain always terminates.
#[derive(Clone)]
pub enum Scope {
    /// The document root
    Document,
    /// An element's subtree; the reference is non-owning in spirit — the
    /// child never mutates its parent beyond asking it to reload
    Node(Element),
}

impl Scope {
    /// The current raw handle of the scope, or `None` for the document
    pub(crate) fn handle(&self) -> Option<ElementHandle> {
        match self {
            Self::Document => None,
            Self::Node(element) => Some(element.handle()),
        }
    }

    /// Whether this is the document root
    #[must_use]
    pub const fn is_document(&self) -> bool {
        matches!(self, Self::Document)
    }

    /// The scope element, if any
    #[must_use]
    pub const fn element(&self) -> Option<&Element> {
        match self {
            Self::Document => None,
            Self::Node(element) => Some(element),
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => write!(f, "Scope::Document"),
            Self::Node(element) => write!(f, "Scope::Node({})", element.handle()),
        }
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Document, Self::Document) => true,
            (Self::Node(a), Self::Node(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug)]
struct ElementInner {
    driver: Arc<dyn Driver>,
    scope: Scope,
    query: Option<Query>,
    handle: Mutex<ElementHandle>,
}

/// A handle to one located element.
///
/// Cloning is cheap and shares the underlying handle cell, so a reload
/// through any clone is visible to all of them.
#[derive(Debug, Clone)]
pub struct Element {
    inner: Arc<ElementInner>,
}

impl Element {
    pub(crate) fn new(
        driver: Arc<dyn Driver>,
        scope: Scope,
        query: Option<Query>,
        handle: ElementHandle,
    ) -> Self {
        Self {
            inner: Arc::new(ElementInner {
                driver,
                scope,
                query,
                handle: Mutex::new(handle),
            }),
        }
    }

    /// The current raw driver handle
    pub(crate) fn handle(&self) -> ElementHandle {
        *self.inner.handle.lock()
    }

    pub(crate) fn driver(&self) -> &Arc<dyn Driver> {
        &self.inner.driver
    }

    /// The scope this element was searched from
    #[must_use]
    pub fn query_scope(&self) -> &Scope {
        &self.inner.scope
    }

    /// Whether this element can be reloaded by re-executing its query.
    ///
    /// False for elements indexed out of a `find_all` collection.
    #[must_use]
    pub fn reloadable(&self) -> bool {
        self.inner.query.is_some()
    }

    /// Run one driver operation against the current handle, recovering from
    /// a stale reference via one reload when automatic reload is enabled.
    fn with_handle<T>(
        &self,
        op: impl Fn(&dyn Driver, &ElementHandle) -> HallarResult<T>,
    ) -> HallarResult<T> {
        let handle = self.handle();
        match op(self.inner.driver.as_ref(), &handle) {
            Err(err) if err.is_stale() && config::automatic_reload() => {
                debug!(%handle, "stale reference, attempting automatic reload");
                self.reload()?;
                let handle = self.handle();
                op(self.inner.driver.as_ref(), &handle)
            }
            outcome => outcome,
        }
    }

    /// Re-execute this element's originating query and adopt the fresh
    /// handle, returning `self` for chaining.
    ///
    /// The scope chain is reloaded first, recursively. If the query no
    /// longer matches (or matches ambiguously) the stored handle is left
    /// untouched and the next operation surfaces the stale-reference error.
    /// Elements without a re-executable query are returned unchanged.
    pub fn reload(&self) -> HallarResult<Element> {
        let Some(query) = &self.inner.query else {
            debug!("reload skipped: element has no re-executable query");
            return Ok(self.clone());
        };
        if let Scope::Node(parent) = &self.inner.scope {
            parent.reload()?;
        }
        match poller::find_one(&self.inner.driver, query, &self.inner.scope) {
            Ok(fresh) => {
                let fresh_handle = fresh.handle();
                debug!(from = %self.handle(), to = %fresh_handle, "element reloaded");
                *self.inner.handle.lock() = fresh_handle;
                Ok(self.clone())
            }
            Err(
                HallarError::ElementNotFound { .. } | HallarError::AmbiguousMatch { .. },
            ) => {
                debug!(handle = %self.handle(), "reload found no replacement");
                Ok(self.clone())
            }
            Err(err) => Err(err),
        }
    }

    /// The element's text content
    pub fn text(&self) -> HallarResult<String> {
        self.with_handle(|driver, handle| driver.text(handle))
    }

    /// Read one attribute
    pub fn attribute(&self, name: &str) -> HallarResult<Option<AttrValue>> {
        self.with_handle(|driver, handle| driver.attribute(handle, name))
    }

    /// The element's form value
    pub fn value(&self) -> HallarResult<String> {
        self.with_handle(|driver, handle| driver.value(handle))
    }

    /// The element's tag name
    pub fn tag_name(&self) -> HallarResult<String> {
        self.with_handle(|driver, handle| driver.tag_name(handle))
    }

    /// Whether the element is visible
    pub fn is_visible(&self) -> HallarResult<bool> {
        self.with_handle(|driver, handle| driver.is_visible(handle))
    }

    /// Whether the element is disabled
    pub fn is_disabled(&self) -> HallarResult<bool> {
        self.with_handle(|driver, handle| driver.is_disabled(handle))
    }

    /// Whether the element is checked
    pub fn is_checked(&self) -> HallarResult<bool> {
        self.with_handle(|driver, handle| driver.is_checked(handle))
    }

    /// Whether the element is selected
    pub fn is_selected(&self) -> HallarResult<bool> {
        self.with_handle(|driver, handle| driver.is_selected(handle))
    }

    /// Click the element
    pub fn click(&self) -> HallarResult<()> {
        self.with_handle(|driver, handle| driver.click(handle))
    }

    /// Set a form field's value, preserved verbatim
    pub fn set(&self, value: &str) -> HallarResult<()> {
        self.with_handle(|driver, handle| driver.set_value(handle, value))
    }

    /// Select this `<option>` element
    pub fn select_option(&self) -> HallarResult<()> {
        self.with_handle(|driver, handle| driver.select_option(handle))
    }
}

/// Identity equality: two elements are equal iff they currently wrap the
/// same live driver element. Query and scope are not considered.
impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        // Same handle cell: trivially equal, and locking twice would deadlock
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        self.handle() == other.handle()
    }
}

impl Eq for Element {}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.handle())
    }
}
