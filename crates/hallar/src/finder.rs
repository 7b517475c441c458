//! The public find/has/click surface.
//!
//! [`Finder`] is implemented by anything that can serve as a query scope:
//! the [`Session`](crate::Session) (document scope) and [`Element`] (subtree
//! scope). The convenience methods are one-line compositions over the
//! poller; the engine itself lives in `poller`.

use std::sync::Arc;

use crate::driver::Driver;
use crate::element::{Element, Scope};
use crate::poller;
use crate::query::{Query, Selector};
use crate::query_result::QueryResult;
use crate::result::{HallarError, HallarResult};

/// Element lookup scoped to a document or a node subtree.
///
/// If the driver executes page scripts, lookups wait for asynchronous DOM
/// updates, retrying until satisfied or until the wait budget (the query's
/// override or the process-wide default) runs out.
pub trait Finder {
    /// The driver lookups go through
    fn driver(&self) -> &Arc<dyn Driver>;

    /// The scope lookups are evaluated against
    fn scope(&self) -> Scope;

    /// Find exactly one element (or exactly the query's expected count,
    /// returning the first). Fails with `ElementNotFound` or
    /// `AmbiguousMatch` once the wait budget is spent.
    fn find(&self, query: impl Into<Query>) -> HallarResult<Element> {
        poller::find_one(self.driver(), &query.into(), &self.scope())
    }

    /// Find all matching elements; zero matches is a valid result.
    fn find_all(&self, query: impl Into<Query>) -> HallarResult<QueryResult> {
        poller::find_all(self.driver(), &query.into(), &self.scope())
    }

    /// Find the first matching element without requiring it to be the only
    /// one. Like an index into `find_all`, the returned element carries no
    /// re-executable query.
    fn find_first(&self, query: impl Into<Query>) -> HallarResult<Element> {
        let result = self.find_all(query)?;
        result
            .first()
            .cloned()
            .ok_or_else(|| HallarError::ElementNotFound {
                message: result.failure_message(),
            })
    }

    /// Whether the query matches (positive assertion: waits until it does)
    fn has_selector(&self, query: impl Into<Query>) -> HallarResult<bool> {
        poller::satisfies(self.driver(), &query.into(), &self.scope(), true)
    }

    /// Whether the query does not match (negative assertion: returns
    /// immediately once already absent)
    fn has_no_selector(&self, query: impl Into<Query>) -> HallarResult<bool> {
        poller::satisfies(self.driver(), &query.into(), &self.scope(), false)
    }

    /// Whether a CSS selector matches in this scope
    fn has_css(&self, selector: impl Into<String>) -> HallarResult<bool> {
        self.has_selector(Selector::css(selector))
    }

    /// Whether a CSS selector has no match in this scope
    fn has_no_css(&self, selector: impl Into<String>) -> HallarResult<bool> {
        self.has_no_selector(Selector::css(selector))
    }

    /// Whether an XPath selector matches in this scope
    fn has_xpath(&self, selector: impl Into<String>) -> HallarResult<bool> {
        self.has_selector(Selector::xpath(selector))
    }

    /// Whether an XPath selector has no match in this scope
    fn has_no_xpath(&self, selector: impl Into<String>) -> HallarResult<bool> {
        self.has_no_selector(Selector::xpath(selector))
    }

    /// Whether this scope contains the given text
    fn has_text(&self, text: impl Into<String>) -> HallarResult<bool> {
        self.has_selector(Selector::text(text))
    }

    /// Whether this scope does not contain the given text
    fn has_no_text(&self, text: impl Into<String>) -> HallarResult<bool> {
        self.has_no_selector(Selector::text(text))
    }

    /// Whether a button with the given locator exists
    fn has_button(&self, locator: impl Into<String>) -> HallarResult<bool> {
        self.has_selector(Selector::button(locator))
    }

    /// Whether a link with the given locator exists
    fn has_link(&self, locator: impl Into<String>) -> HallarResult<bool> {
        self.has_selector(Selector::link(locator))
    }

    /// Whether a form field with the given locator exists
    fn has_field(&self, locator: impl Into<String>) -> HallarResult<bool> {
        self.has_selector(Selector::field(locator))
    }

    /// Find a button by id, value, title, or text content and click it
    fn click_button(&self, locator: impl Into<String>) -> HallarResult<Element> {
        let button = self.find(Selector::button(locator))?;
        button.click()?;
        Ok(button)
    }

    /// Find a link by id, text, or title and click it
    fn click_link(&self, locator: impl Into<String>) -> HallarResult<Element> {
        let link = self.find(Selector::link(locator))?;
        link.click()?;
        Ok(link)
    }

    /// Find a form field by id, name, or label and set its value
    fn fill_in(&self, locator: impl Into<String>, value: &str) -> HallarResult<Element> {
        let field = self.find(Selector::field(locator))?;
        field.set(value)?;
        Ok(field)
    }
}

impl Finder for Element {
    fn driver(&self) -> &Arc<dyn Driver> {
        Element::driver(self)
    }

    fn scope(&self) -> Scope {
        Scope::Node(self.clone())
    }
}
