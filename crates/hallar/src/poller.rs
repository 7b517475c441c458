//! The wait-and-retry query engine.
//!
//! Script-capable pages mutate the DOM asynchronously after navigation or
//! interaction, so a single synchronous query would be flaky. The poller
//! re-evaluates a [`Query`] through the driver at a fixed interval until a
//! mode-specific satisfaction predicate holds or the wait budget runs out.
//! Non-script-capable drivers have no asynchronous content to wait for and
//! get exactly one evaluation.
//!
//! The satisfaction predicate is an explicit per-call-shape decision, not
//! behavioral polymorphism:
//!
//! - [`find_one`] wants exactly the expected count. A surplus while budget
//!   remains counts as *not yet satisfied* — duplicates may settle as the
//!   page quiesces — but a surplus at the deadline is a hard
//!   `AmbiguousMatch`, reported distinctly from not-found.
//! - [`find_all`] is satisfied by any count on the first evaluation.
//! - [`satisfies`] carries a polarity: a positive assertion retries until
//!   true or timeout, a negative assertion returns as soon as it is already
//!   false and never waits out the budget for something that is absent.
//!
//! Process-wide settings are snapshotted once per invocation, so a
//! concurrent settings change cannot alter an in-flight wait. If the query
//! scope itself has died, the stale-reference signal surfaces immediately
//! (after at most one automatic scope reload) — it is not retried.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

use crate::config;
use crate::driver::{Driver, ElementHandle};
use crate::element::{Element, Scope};
use crate::query::Query;
use crate::query_result::{failure_message_for, QueryResult};
use crate::result::{HallarError, HallarResult};

/// Find exactly the expected number of matches (one, unless the query sets
/// a count) and return the first, waiting for asynchronous content.
pub(crate) fn find_one(
    driver: &Arc<dyn Driver>,
    query: &Query,
    scope: &Scope,
) -> HallarResult<Element> {
    let expected = query.expected_count();
    poll(driver, query, scope, |handles, last_chance| {
        if handles.len() == expected {
            return Some(match handles.first() {
                Some(&handle) => Ok(Element::new(
                    Arc::clone(driver),
                    scope.clone(),
                    Some(query.clone()),
                    handle,
                )),
                // A zero-count query can be satisfied, but there is no
                // element to hand back
                None => Err(HallarError::ElementNotFound {
                    message: failure_message_for(query, 0),
                }),
            });
        }
        if !last_chance {
            return None;
        }
        if handles.len() < expected {
            Some(Err(HallarError::ElementNotFound {
                message: failure_message_for(query, handles.len()),
            }))
        } else {
            Some(Err(HallarError::AmbiguousMatch {
                count: handles.len(),
                description: query.description(),
            }))
        }
    })
}

/// Evaluate the query once and return every match.
///
/// "All" has no singular ambiguity, so any count satisfies the first
/// evaluation and no retry happens. Elements in the returned collection
/// carry no re-executable query: an index into a collection is not a
/// reconstructible single-result search.
pub(crate) fn find_all(
    driver: &Arc<dyn Driver>,
    query: &Query,
    scope: &Scope,
) -> HallarResult<QueryResult> {
    poll(driver, query, scope, |handles, _last_chance| {
        let elements = handles
            .iter()
            .map(|handle| Element::new(Arc::clone(driver), scope.clone(), None, *handle))
            .collect();
        Some(Ok(QueryResult::new(elements, query.clone())))
    })
}

/// Boolean query: does the scope satisfy the query's count constraints?
///
/// With `positive` polarity the poller retries until the constraints hold;
/// with negative polarity it retries until they stop holding. Either way it
/// returns whether the assertion held by the deadline — never an error for
/// the plain not-found case.
pub(crate) fn satisfies(
    driver: &Arc<dyn Driver>,
    query: &Query,
    scope: &Scope,
    positive: bool,
) -> HallarResult<bool> {
    poll(driver, query, scope, |handles, last_chance| {
        let holds = query.matches_count(handles.len()) == positive;
        if holds {
            Some(Ok(true))
        } else if last_chance {
            Some(Ok(false))
        } else {
            None
        }
    })
}

/// The shared retry loop.
///
/// `decide` inspects one evaluation and either produces the terminal
/// outcome or asks for another round; it must produce an outcome when
/// `last_chance` is set.
fn poll<T>(
    driver: &Arc<dyn Driver>,
    query: &Query,
    scope: &Scope,
    decide: impl Fn(&[ElementHandle], bool) -> Option<HallarResult<T>>,
) -> HallarResult<T> {
    let settings = config::settings();
    let deadline = if driver.is_js_capable() {
        Some(Instant::now() + query.resolved_wait(&settings))
    } else {
        None
    };
    debug!(
        description = %query.description(),
        waiting = deadline.is_some(),
        "evaluating query"
    );

    loop {
        let handles = evaluate(driver, query, scope, settings.automatic_reload)?;
        let last_chance = deadline.map_or(true, |d| Instant::now() >= d);
        if let Some(outcome) = decide(&handles, last_chance) {
            return outcome;
        }
        trace!(matches = handles.len(), "query not yet satisfied");
        std::thread::sleep(settings.poll_interval);
    }
}

/// One driver evaluation: resolve the selector in the scope, then keep the
/// candidates that pass every filter predicate.
fn evaluate(
    driver: &Arc<dyn Driver>,
    query: &Query,
    scope: &Scope,
    automatic_reload: bool,
) -> HallarResult<Vec<ElementHandle>> {
    let handles = match driver.resolve(query.selector(), scope.handle().as_ref()) {
        Err(err) if err.is_stale() && automatic_reload => {
            // The scope node itself died; give it one chance to re-resolve
            if let Scope::Node(element) = scope {
                element.reload()?;
            }
            driver.resolve(query.selector(), scope.handle().as_ref())?
        }
        other => other?,
    };

    // No filters means no per-candidate driver reads
    if query.filters().is_empty() {
        return Ok(handles);
    }

    let mut kept = Vec::with_capacity(handles.len());
    for handle in handles {
        match passes_filters(driver.as_ref(), query, &handle) {
            Ok(true) => kept.push(handle),
            Ok(false) => {}
            // Candidate vanished between resolve and the filter read; it no
            // longer exists, so it simply is not a match
            Err(err) if err.is_stale() => {}
            Err(err) => return Err(err),
        }
    }
    Ok(kept)
}

fn passes_filters(driver: &dyn Driver, query: &Query, handle: &ElementHandle) -> HallarResult<bool> {
    let filters = query.filters();
    if let Some(expected) = &filters.text {
        let text = driver.text(handle)?;
        let matched = if query.options().exact {
            &text == expected
        } else {
            text.contains(expected)
        };
        if !matched {
            return Ok(false);
        }
    }
    for (actual, expected) in [
        (filters.visible.map(|e| (driver.is_visible(handle), e))),
        (filters.disabled.map(|e| (driver.is_disabled(handle), e))),
        (filters.checked.map(|e| (driver.is_checked(handle), e))),
        (filters.selected.map(|e| (driver.is_selected(handle), e))),
    ]
    .into_iter()
    .flatten()
    {
        if actual? != expected {
            return Ok(false);
        }
    }
    Ok(true)
}
