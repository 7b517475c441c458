//! Queries: immutable descriptions of "what to find".
//!
//! A [`Query`] bundles a [`Selector`], filter predicates, and wait/count
//! options. It is pure data: constructed once, then re-executed verbatim on
//! every poll and on every element reload. The human-readable
//! [`Query::description`] is rendered lazily and used only for failure
//! messages, never for matching.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;

use crate::config::Settings;

/// Selector kinds for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g. "button.primary")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Any element whose text content contains the given string
    Text(String),
    /// A button, found by id, value, title, or text content
    Button(String),
    /// A link, found by id, text, or title
    Link(String),
    /// A form field, found by id, name, or label text
    Field(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::XPath(selector.into())
    }

    /// Create a text-content selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a button selector
    #[must_use]
    pub fn button(locator: impl Into<String>) -> Self {
        Self::Button(locator.into())
    }

    /// Create a link selector
    #[must_use]
    pub fn link(locator: impl Into<String>) -> Self {
        Self::Link(locator.into())
    }

    /// Create a form-field selector
    #[must_use]
    pub fn field(locator: impl Into<String>) -> Self {
        Self::Field(locator.into())
    }

    /// The selector kind name used in descriptions
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Css(_) => "css",
            Self::XPath(_) => "xpath",
            Self::Text(_) => "text",
            Self::Button(_) => "button",
            Self::Link(_) => "link",
            Self::Field(_) => "field",
        }
    }

    /// The raw locator string
    #[must_use]
    pub fn locator(&self) -> &str {
        match self {
            Self::Css(s)
            | Self::XPath(s)
            | Self::Text(s)
            | Self::Button(s)
            | Self::Link(s)
            | Self::Field(s) => s,
        }
    }
}

/// Filter predicates applied to resolved candidates.
///
/// Each filter is a read through the driver; a candidate survives only if
/// every set predicate matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    /// Element text must contain (or, in exact mode, equal) this string
    pub text: Option<String>,
    /// Required visibility state
    pub visible: Option<bool>,
    /// Required disabled state
    pub disabled: Option<bool>,
    /// Required checked state
    pub checked: Option<bool>,
    /// Required selected state
    pub selected: Option<bool>,
}

impl Filters {
    /// Whether no filter is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    fn describe(&self, out: &mut String) {
        if let Some(text) = &self.text {
            let _ = write!(out, " with text {text:?}");
        }
        for (name, state) in [
            ("visible", self.visible),
            ("disabled", self.disabled),
            ("checked", self.checked),
            ("selected", self.selected),
        ] {
            if let Some(expected) = state {
                let _ = write!(out, " that is{} {name}", if expected { "" } else { " not" });
            }
        }
    }
}

/// Options controlling wait and count behavior of a query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Wait budget override; falls back to the process-wide default
    pub wait: Option<Duration>,
    /// Exact text matching instead of substring containment
    pub exact: bool,
    /// Require exactly this many matches
    pub count: Option<usize>,
    /// Require at least this many matches
    pub minimum: Option<usize>,
    /// Require at most this many matches
    pub maximum: Option<usize>,
}

/// An immutable description of an element search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    selector: Selector,
    filters: Filters,
    options: QueryOptions,
}

impl Query {
    /// Create a query from a bare selector
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            filters: Filters::default(),
            options: QueryOptions::default(),
        }
    }

    /// Filter by text content (substring, or exact if [`Self::exact`] set)
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.filters.text = Some(text.into());
        self
    }

    /// Filter by visibility
    #[must_use]
    pub const fn with_visible(mut self, visible: bool) -> Self {
        self.filters.visible = Some(visible);
        self
    }

    /// Filter by disabled state
    #[must_use]
    pub const fn with_disabled(mut self, disabled: bool) -> Self {
        self.filters.disabled = Some(disabled);
        self
    }

    /// Filter by checked state
    #[must_use]
    pub const fn with_checked(mut self, checked: bool) -> Self {
        self.filters.checked = Some(checked);
        self
    }

    /// Filter by selected state
    #[must_use]
    pub const fn with_selected(mut self, selected: bool) -> Self {
        self.filters.selected = Some(selected);
        self
    }

    /// Require exact text matching
    #[must_use]
    pub const fn exact(mut self, exact: bool) -> Self {
        self.options.exact = exact;
        self
    }

    /// Override the wait budget for this query
    #[must_use]
    pub const fn with_wait(mut self, wait: Duration) -> Self {
        self.options.wait = Some(wait);
        self
    }

    /// Require exactly `count` matches
    #[must_use]
    pub const fn with_count(mut self, count: usize) -> Self {
        self.options.count = Some(count);
        self
    }

    /// Require at least `minimum` matches
    #[must_use]
    pub const fn with_minimum(mut self, minimum: usize) -> Self {
        self.options.minimum = Some(minimum);
        self
    }

    /// Require at most `maximum` matches
    #[must_use]
    pub const fn with_maximum(mut self, maximum: usize) -> Self {
        self.options.maximum = Some(maximum);
        self
    }

    /// The selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// The filter predicates
    #[must_use]
    pub const fn filters(&self) -> &Filters {
        &self.filters
    }

    /// The options
    #[must_use]
    pub const fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// The wait budget for one poll sequence, resolved against a settings
    /// snapshot. Fixed for the duration of that sequence.
    #[must_use]
    pub fn resolved_wait(&self, settings: &Settings) -> Duration {
        self.options.wait.unwrap_or(settings.default_max_wait_time)
    }

    /// The number of matches a find-one caller requires
    #[must_use]
    pub fn expected_count(&self) -> usize {
        self.options.count.unwrap_or(1)
    }

    /// Whether `actual` satisfies this query's count constraints.
    ///
    /// With no constraint set, any count of at least one matches (the
    /// existence reading used by boolean queries).
    #[must_use]
    pub fn matches_count(&self, actual: usize) -> bool {
        if let Some(count) = self.options.count {
            return actual == count;
        }
        let minimum = self.options.minimum.unwrap_or(1);
        if actual < minimum {
            return false;
        }
        if let Some(maximum) = self.options.maximum {
            if actual > maximum {
                return false;
            }
        }
        true
    }

    /// Human-readable rendering used in failure messages
    #[must_use]
    pub fn description(&self) -> String {
        let mut out = format!("{} {:?}", self.selector.kind(), self.selector.locator());
        self.filters.describe(&mut out);
        out
    }
}

impl From<Selector> for Query {
    fn from(selector: Selector) -> Self {
        Self::new(selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_selector_kinds() {
            assert_eq!(Selector::css("#x").kind(), "css");
            assert_eq!(Selector::xpath("//a").kind(), "xpath");
            assert_eq!(Selector::text("Foo").kind(), "text");
            assert_eq!(Selector::button("Save").kind(), "button");
            assert_eq!(Selector::link("Home").kind(), "link");
            assert_eq!(Selector::field("Name").kind(), "field");
        }

        #[test]
        fn test_locator_accessor() {
            assert_eq!(Selector::css("ul > li").locator(), "ul > li");
            assert_eq!(Selector::button("med").locator(), "med");
        }
    }

    mod description_tests {
        use super::*;

        #[test]
        fn test_bare_description() {
            let query = Query::new(Selector::css("#foo"));
            assert_eq!(query.description(), "css \"#foo\"");
        }

        #[test]
        fn test_description_with_text_filter() {
            let query = Query::new(Selector::css("li")).with_text("banana");
            assert_eq!(query.description(), "css \"li\" with text \"banana\"");
        }

        #[test]
        fn test_description_with_state_filters() {
            let query = Query::new(Selector::xpath("//input"))
                .with_checked(true)
                .with_disabled(false);
            assert_eq!(
                query.description(),
                "xpath \"//input\" that is not disabled that is checked"
            );
        }
    }

    mod count_tests {
        use super::*;

        #[test]
        fn test_default_matches_any_positive_count() {
            let query = Query::new(Selector::css("li"));
            assert!(!query.matches_count(0));
            assert!(query.matches_count(1));
            assert!(query.matches_count(7));
        }

        #[test]
        fn test_exact_count() {
            let query = Query::new(Selector::css("li")).with_count(3);
            assert!(!query.matches_count(2));
            assert!(query.matches_count(3));
            assert!(!query.matches_count(4));
        }

        #[test]
        fn test_minimum_and_maximum() {
            let query = Query::new(Selector::css("li"))
                .with_minimum(2)
                .with_maximum(4);
            assert!(!query.matches_count(1));
            assert!(query.matches_count(2));
            assert!(query.matches_count(4));
            assert!(!query.matches_count(5));
        }

        #[test]
        fn test_expected_count_defaults_to_one() {
            assert_eq!(Query::new(Selector::css("li")).expected_count(), 1);
            assert_eq!(
                Query::new(Selector::css("li")).with_count(2).expected_count(),
                2
            );
        }
    }

    mod serde_tests {
        use super::*;

        #[test]
        fn test_query_round_trips_through_json() {
            let query = Query::new(Selector::css("li"))
                .with_text("banana")
                .with_count(2)
                .exact(true);
            let json = serde_json::to_string(&query).unwrap();
            let restored: Query = serde_json::from_str(&json).unwrap();
            assert_eq!(restored, query);
        }

        #[test]
        fn test_selector_json_shape() {
            let json = serde_json::to_string(&Selector::css("#main")).unwrap();
            assert_eq!(json, r##"{"Css":"#main"}"##);
        }
    }

    mod wait_tests {
        use super::*;
        use crate::config::Settings;
        use std::time::Duration;

        #[test]
        fn test_resolved_wait_falls_back_to_settings() {
            let settings = Settings::standard();
            let query = Query::new(Selector::css("#x"));
            assert_eq!(
                query.resolved_wait(&settings),
                settings.default_max_wait_time
            );
        }

        #[test]
        fn test_resolved_wait_prefers_override() {
            let settings = Settings::standard();
            let query = Query::new(Selector::css("#x")).with_wait(Duration::from_millis(10));
            assert_eq!(query.resolved_wait(&settings), Duration::from_millis(10));
        }
    }
}
