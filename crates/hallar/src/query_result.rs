//! The ordered collection of elements produced by one query evaluation.

use std::ops::Index;

use crate::element::Element;
use crate::query::Query;

/// A read-only, ordered view of the elements one [`Query`] evaluation
/// matched, in document order.
///
/// Zero length is a valid state: "not found yet" at a wait boundary, or
/// "not found at all" once the budget is spent — the caller's context
/// decides which.
#[derive(Debug, Clone)]
pub struct QueryResult {
    elements: Vec<Element>,
    query: Query,
}

impl QueryResult {
    pub(crate) fn new(elements: Vec<Element>, query: Query) -> Self {
        Self { elements, query }
    }

    /// The query that produced this result
    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    /// Number of matched elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether nothing matched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The first matched element
    #[must_use]
    pub fn first(&self) -> Option<&Element> {
        self.elements.first()
    }

    /// Element at `index`, if present
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// Iterate over matched elements in document order
    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    /// A diagnostic message describing why this result fails the query's
    /// expectations.
    #[must_use]
    pub fn failure_message(&self) -> String {
        failure_message_for(&self.query, self.elements.len())
    }
}

impl Index<usize> for QueryResult {
    type Output = Element;

    fn index(&self, index: usize) -> &Element {
        &self.elements[index]
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// Render the not-found / count-mismatch diagnostic for a query that
/// matched `actual` elements.
pub(crate) fn failure_message_for(query: &Query, actual: usize) -> String {
    let description = query.description();
    if actual == 0 {
        format!("expected to find {description} but there were no matches")
    } else {
        format!(
            "expected to find {description} {} {} but found {} {}",
            query.expected_count(),
            pluralize("time", query.expected_count()),
            actual,
            pluralize("match", actual),
        )
    }
}

fn pluralize(noun: &str, count: usize) -> String {
    if count == 1 {
        noun.to_string()
    } else if noun == "match" {
        "matches".to_string()
    } else {
        format!("{noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Selector;

    fn empty_result(query: Query) -> QueryResult {
        QueryResult::new(Vec::new(), query)
    }

    #[test]
    fn test_empty_result_state() {
        let result = empty_result(Query::new(Selector::css("#x")));
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
        assert!(result.first().is_none());
        assert!(result.get(0).is_none());
    }

    #[test]
    fn test_failure_message_no_matches() {
        let result = empty_result(Query::new(Selector::css("#foo")));
        assert_eq!(
            result.failure_message(),
            "expected to find css \"#foo\" but there were no matches"
        );
    }

    #[test]
    fn test_failure_message_includes_filters() {
        let result = empty_result(Query::new(Selector::css("li")).with_text("banana"));
        assert_eq!(
            result.failure_message(),
            "expected to find css \"li\" with text \"banana\" but there were no matches"
        );
    }
}
