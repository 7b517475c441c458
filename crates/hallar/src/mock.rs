//! In-memory DOM and driver for testing the core without a browser.
//!
//! [`MockDriver`] implements [`Driver`] over a mutable element tree. Tests
//! build a document from [`NodeSpec`]s, then mutate it (replace, remove,
//! append) to simulate script-driven DOM updates; every mutation invalidates
//! the handles of the nodes it detaches, which is exactly how stale
//! references arise in a real page. The driver is cheaply clonable and
//! shares its document, so a spawned thread can mutate the DOM while the
//! poller waits on it.
//!
//! Selector support is a deliberate subset: CSS compound selectors
//! (`tag#id.class[attr='v']`) with descendant combinators, and XPath
//! location paths with `@attr` and positional predicates. Enough to exercise
//! the query engine; not a selector library.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use crate::driver::{AttrValue, Driver, ElementHandle};
use crate::query::Selector;
use crate::result::{HallarError, HallarResult};

/// Attributes that read as boolean flags rather than strings
const BOOLEAN_ATTRS: &[&str] = &[
    "checked", "disabled", "selected", "readonly", "required", "multiple", "hidden",
];

/// Declarative description of an element subtree
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    tag: String,
    attrs: Vec<(String, String)>,
    flags: Vec<String>,
    text: Option<String>,
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// Start a subtree with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Set a string attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Set a boolean attribute (checked, disabled, selected, hidden, ...)
    #[must_use]
    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.flags.push(name.into());
        self
    }

    /// Set the element's direct text content
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a child subtree
    #[must_use]
    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug)]
struct DomNode {
    tag: String,
    attrs: HashMap<String, String>,
    flags: HashSet<String>,
    text: String,
    value: Option<String>,
    parent: Option<u64>,
    children: Vec<u64>,
}

#[derive(Debug, Default)]
struct DomState {
    nodes: HashMap<u64, DomNode>,
    root: Option<u64>,
    next_id: u64,
    clicks: Vec<u64>,
}

/// In-memory DOM driver.
///
/// Clones share the same document.
#[derive(Debug, Clone)]
pub struct MockDriver {
    state: Arc<Mutex<DomState>>,
    js_capable: bool,
}

impl MockDriver {
    /// A script-capable driver: queries against it poll and wait
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DomState::default())),
            js_capable: true,
        }
    }

    /// A driver without script support: every query is a single evaluation
    #[must_use]
    pub fn without_js() -> Self {
        Self {
            js_capable: false,
            ..Self::new()
        }
    }

    /// Replace the whole document with the given tree, invalidating every
    /// previously issued handle. Returns the new root's handle.
    pub fn mount(&self, spec: NodeSpec) -> ElementHandle {
        let mut state = self.state.lock();
        state.nodes.clear();
        let root = state.insert(spec, None);
        state.root = Some(root);
        ElementHandle::new(root)
    }

    /// Append a subtree as the last child of the first CSS match
    pub fn append(&self, css: &str, spec: NodeSpec) -> HallarResult<ElementHandle> {
        let mut state = self.state.lock();
        let parent = state.first_css_match(css)?;
        let id = state.insert(spec, Some(parent));
        Ok(ElementHandle::new(id))
    }

    /// Replace the first CSS match with a new subtree at the same position.
    ///
    /// The detached subtree's handles become stale; the replacement gets
    /// fresh handles.
    pub fn replace(&self, css: &str, spec: NodeSpec) -> HallarResult<ElementHandle> {
        let mut state = self.state.lock();
        let old = state.first_css_match(css)?;
        let parent = state.nodes[&old].parent;
        let position = parent.map(|p| {
            state.nodes[&p]
                .children
                .iter()
                .position(|&c| c == old)
                .unwrap_or(0)
        });
        state.detach(old);
        let id = state.insert(spec, parent);
        if let (Some(parent), Some(position)) = (parent, position) {
            // insert() appended; move the new subtree back into place
            let children = &mut state.nodes.get_mut(&parent).unwrap().children;
            let moved = children.pop().unwrap();
            children.insert(position, moved);
        } else {
            state.root = Some(id);
        }
        Ok(ElementHandle::new(id))
    }

    /// Remove the first CSS match, invalidating its subtree's handles
    pub fn remove(&self, css: &str) -> HallarResult<()> {
        let mut state = self.state.lock();
        let id = state.first_css_match(css)?;
        state.detach(id);
        if state.root == Some(id) {
            state.root = None;
        }
        Ok(())
    }

    /// Every element clicked so far, in click order
    #[must_use]
    pub fn clicks(&self) -> Vec<ElementHandle> {
        self.state
            .lock()
            .clicks
            .iter()
            .map(|&id| ElementHandle::new(id))
            .collect()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for MockDriver {
    fn resolve(
        &self,
        selector: &Selector,
        scope: Option<&ElementHandle>,
    ) -> HallarResult<Vec<ElementHandle>> {
        let state = self.state.lock();
        let scope_id = match scope {
            Some(handle) => {
                state.alive(handle.id())?;
                Some(handle.id())
            }
            None => None,
        };
        let ids = match selector {
            Selector::Css(css) => state.match_css(css, scope_id)?,
            Selector::XPath(xpath) => state.match_xpath(xpath, scope_id)?,
            Selector::Text(text) => state.match_text(text, scope_id),
            Selector::Button(locator) => state.match_button(locator, scope_id),
            Selector::Link(locator) => state.match_link(locator, scope_id),
            Selector::Field(locator) => state.match_field(locator, scope_id),
        };
        Ok(ids.into_iter().map(ElementHandle::new).collect())
    }

    fn text(&self, element: &ElementHandle) -> HallarResult<String> {
        let state = self.state.lock();
        state.alive(element.id())?;
        Ok(state.full_text(element.id()))
    }

    fn attribute(&self, element: &ElementHandle, name: &str) -> HallarResult<Option<AttrValue>> {
        let state = self.state.lock();
        let node = state.alive(element.id())?;
        if BOOLEAN_ATTRS.contains(&name) {
            return Ok(Some(AttrValue::Flag(node.flags.contains(name))));
        }
        Ok(node.attrs.get(name).map(|v| AttrValue::Text(v.clone())))
    }

    fn value(&self, element: &ElementHandle) -> HallarResult<String> {
        let state = self.state.lock();
        let node = state.alive(element.id())?;
        let value = match node.tag.as_str() {
            // A textarea's initial value is its content, newlines intact
            "textarea" => node
                .value
                .clone()
                .unwrap_or_else(|| state.full_text(element.id())),
            "input" => node
                .value
                .clone()
                .or_else(|| node.attrs.get("value").cloned())
                .or_else(|| {
                    let kind = node.attrs.get("type").map_or("text", String::as_str);
                    // Valueless checkboxes and radios submit "on"
                    (kind == "checkbox" || kind == "radio").then(|| "on".to_string())
                })
                .unwrap_or_default(),
            "option" => node
                .attrs
                .get("value")
                .cloned()
                .unwrap_or_else(|| state.full_text(element.id())),
            "select" => state
                .descendants(Some(element.id()))
                .into_iter()
                .find(|id| {
                    let option = &state.nodes[id];
                    option.tag == "option" && option.flags.contains("selected")
                })
                .map(|id| {
                    let option = &state.nodes[&id];
                    option
                        .attrs
                        .get("value")
                        .cloned()
                        .unwrap_or_else(|| state.full_text(id))
                })
                .unwrap_or_default(),
            _ => node.attrs.get("value").cloned().unwrap_or_default(),
        };
        Ok(value)
    }

    fn tag_name(&self, element: &ElementHandle) -> HallarResult<String> {
        let state = self.state.lock();
        Ok(state.alive(element.id())?.tag.to_lowercase())
    }

    fn is_visible(&self, element: &ElementHandle) -> HallarResult<bool> {
        let state = self.state.lock();
        state.alive(element.id())?;
        let mut current = Some(element.id());
        while let Some(id) = current {
            let node = &state.nodes[&id];
            if node.flags.contains("hidden") {
                return Ok(false);
            }
            current = node.parent;
        }
        Ok(true)
    }

    fn is_disabled(&self, element: &ElementHandle) -> HallarResult<bool> {
        let state = self.state.lock();
        let node = state.alive(element.id())?;
        if node.flags.contains("disabled") {
            return Ok(true);
        }
        // Controls inside a disabled select/optgroup/fieldset are disabled
        let mut current = node.parent;
        while let Some(id) = current {
            let ancestor = &state.nodes[&id];
            if matches!(ancestor.tag.as_str(), "select" | "optgroup" | "fieldset")
                && ancestor.flags.contains("disabled")
            {
                return Ok(true);
            }
            current = ancestor.parent;
        }
        Ok(false)
    }

    fn is_checked(&self, element: &ElementHandle) -> HallarResult<bool> {
        let state = self.state.lock();
        Ok(state.alive(element.id())?.flags.contains("checked"))
    }

    fn is_selected(&self, element: &ElementHandle) -> HallarResult<bool> {
        let state = self.state.lock();
        Ok(state.alive(element.id())?.flags.contains("selected"))
    }

    fn click(&self, element: &ElementHandle) -> HallarResult<()> {
        let mut state = self.state.lock();
        state.alive(element.id())?;
        state.clicks.push(element.id());
        Ok(())
    }

    fn set_value(&self, element: &ElementHandle, value: &str) -> HallarResult<()> {
        let mut state = self.state.lock();
        state.alive(element.id())?;
        let node = state.nodes.get_mut(&element.id()).unwrap();
        node.value = Some(value.to_string());
        Ok(())
    }

    fn select_option(&self, element: &ElementHandle) -> HallarResult<()> {
        let mut state = self.state.lock();
        let node = state.alive(element.id())?;
        if node.tag != "option" {
            return Err(HallarError::driver(format!(
                "cannot select a <{}>",
                node.tag
            )));
        }
        // Deselect siblings within the owning select, then select this one
        let mut select = node.parent;
        while let Some(id) = select {
            if state.nodes[&id].tag == "select" {
                break;
            }
            select = state.nodes[&id].parent;
        }
        if let Some(select) = select {
            for id in state.descendants(Some(select)) {
                state.nodes.get_mut(&id).unwrap().flags.remove("selected");
            }
        }
        state
            .nodes
            .get_mut(&element.id())
            .unwrap()
            .flags
            .insert("selected".to_string());
        Ok(())
    }

    fn is_js_capable(&self) -> bool {
        self.js_capable
    }
}

impl DomState {
    fn insert(&mut self, spec: NodeSpec, parent: Option<u64>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            DomNode {
                tag: spec.tag,
                attrs: spec.attrs.into_iter().collect(),
                flags: spec.flags.into_iter().collect(),
                text: spec.text.unwrap_or_default(),
                value: None,
                parent,
                children: Vec::new(),
            },
        );
        if let Some(parent) = parent {
            self.nodes.get_mut(&parent).unwrap().children.push(id);
        }
        for child in spec.children {
            self.insert(child, Some(id));
        }
        id
    }

    /// Drop a subtree from the document; its ids become stale
    fn detach(&mut self, id: u64) {
        if let Some(parent) = self.nodes[&id].parent {
            self.nodes
                .get_mut(&parent)
                .unwrap()
                .children
                .retain(|&c| c != id);
        }
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                pending.extend(node.children);
            }
        }
    }

    fn alive(&self, id: u64) -> HallarResult<&DomNode> {
        self.nodes
            .get(&id)
            .ok_or_else(|| HallarError::stale(format!("element #{id} is not attached to the document")))
    }

    fn parent_of(&self, id: u64) -> Option<u64> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    /// Document-order ids under `scope` (the whole document, root included,
    /// when `scope` is `None`; strict descendants otherwise)
    fn descendants(&self, scope: Option<u64>) -> Vec<u64> {
        let mut out = Vec::new();
        match scope {
            None => {
                if let Some(root) = self.root {
                    self.dfs(root, &mut out);
                }
            }
            Some(id) => {
                if let Some(node) = self.nodes.get(&id) {
                    for &child in &node.children {
                        self.dfs(child, &mut out);
                    }
                }
            }
        }
        out
    }

    fn dfs(&self, id: u64, out: &mut Vec<u64>) {
        out.push(id);
        if let Some(node) = self.nodes.get(&id) {
            for &child in &node.children {
                self.dfs(child, out);
            }
        }
    }

    fn full_text(&self, id: u64) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: u64, out: &mut String) {
        if let Some(node) = self.nodes.get(&id) {
            out.push_str(&node.text);
            for &child in &node.children {
                self.collect_text(child, out);
            }
        }
    }

    fn first_css_match(&self, css: &str) -> HallarResult<u64> {
        self.match_css(css, None)?
            .into_iter()
            .next()
            .ok_or_else(|| HallarError::driver(format!("no element matches {css:?}")))
    }

    fn match_css(&self, css: &str, scope: Option<u64>) -> HallarResult<Vec<u64>> {
        let chain = parse_css(css)?;
        let (last, prefix) = match chain.split_last() {
            Some(split) => split,
            None => return Ok(Vec::new()),
        };
        Ok(self
            .descendants(scope)
            .into_iter()
            .filter(|&id| {
                self.matches_compound(id, last) && self.prefix_matches(self.parent_of(id), prefix)
            })
            .collect())
    }

    /// Greedy ancestor walk for descendant combinators
    fn prefix_matches(&self, start: Option<u64>, prefix: &[CompoundSelector]) -> bool {
        let mut remaining = prefix.len();
        let mut current = start;
        while remaining > 0 {
            match current {
                None => return false,
                Some(id) => {
                    if self.matches_compound(id, &prefix[remaining - 1]) {
                        remaining -= 1;
                    }
                    current = self.parent_of(id);
                }
            }
        }
        true
    }

    fn matches_compound(&self, id: u64, sel: &CompoundSelector) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        if let Some(tag) = &sel.tag {
            if !node.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(expected) = &sel.id {
            if node.attrs.get("id") != Some(expected) {
                return false;
            }
        }
        for class in &sel.classes {
            let classes = node.attrs.get("class").map_or("", String::as_str);
            if !classes.split_whitespace().any(|c| c == class) {
                return false;
            }
        }
        for (name, expected) in &sel.attrs {
            if node.attrs.get(name) != Some(expected) {
                return false;
            }
        }
        true
    }

    fn match_xpath(&self, xpath: &str, scope: Option<u64>) -> HallarResult<Vec<u64>> {
        let steps = parse_xpath(xpath)?;
        // The context set starts at a virtual node above the evaluation
        // root: the document (children = [root]) or the scope element
        let mut contexts: Vec<Option<u64>> = vec![scope];
        for step in &steps {
            let mut next: Vec<u64> = Vec::new();
            for &context in &contexts {
                let pool = if step.descendant {
                    self.descendants(context)
                } else {
                    match context {
                        None => self.root.into_iter().collect(),
                        Some(id) => self
                            .nodes
                            .get(&id)
                            .map(|n| n.children.clone())
                            .unwrap_or_default(),
                    }
                };
                let mut matched: Vec<u64> = pool
                    .into_iter()
                    .filter(|&id| self.matches_step(id, step))
                    .collect();
                if let Some(position) = step.position {
                    matched = matched
                        .get(position.saturating_sub(1))
                        .into_iter()
                        .copied()
                        .collect();
                }
                for id in matched {
                    if !next.contains(&id) {
                        next.push(id);
                    }
                }
            }
            contexts = next.into_iter().map(Some).collect();
        }
        Ok(contexts.into_iter().flatten().collect())
    }

    fn matches_step(&self, id: u64, step: &XPathStep) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        if step.name != "*" && !node.tag.eq_ignore_ascii_case(&step.name) {
            return false;
        }
        match &step.attr {
            Some((name, expected)) => {
                if BOOLEAN_ATTRS.contains(&name.as_str()) {
                    node.flags.contains(name)
                } else {
                    node.attrs.get(name) == Some(expected)
                }
            }
            None => true,
        }
    }

    /// Text selector matches descendant-or-self, so a scope whose own text
    /// contains the needle is itself a match
    fn match_text(&self, needle: &str, scope: Option<u64>) -> Vec<u64> {
        let mut pool = Vec::new();
        if let Some(id) = scope {
            pool.push(id);
        }
        pool.extend(self.descendants(scope));
        pool.retain(|&id| self.full_text(id).contains(needle));
        pool
    }

    fn match_button(&self, locator: &str, scope: Option<u64>) -> Vec<u64> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| {
                let node = &self.nodes[&id];
                let by_common = node.attrs.get("id").map(String::as_str) == Some(locator)
                    || node.attrs.get("value").map(String::as_str) == Some(locator)
                    || node.attrs.get("title").map(String::as_str) == Some(locator);
                match node.tag.as_str() {
                    "button" => by_common || self.full_text(id).contains(locator),
                    "input" => {
                        let kind = node.attrs.get("type").map_or("text", String::as_str);
                        let is_button =
                            matches!(kind, "submit" | "reset" | "image" | "button");
                        is_button
                            && (by_common
                                || (kind == "image"
                                    && node.attrs.get("alt").map(String::as_str)
                                        == Some(locator)))
                    }
                    _ => false,
                }
            })
            .collect()
    }

    fn match_link(&self, locator: &str, scope: Option<u64>) -> Vec<u64> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| {
                let node = &self.nodes[&id];
                if node.tag != "a" {
                    return false;
                }
                node.attrs.get("id").map(String::as_str) == Some(locator)
                    || node.attrs.get("title").map(String::as_str) == Some(locator)
                    || self.full_text(id).contains(locator)
                    || self.descendants(Some(id)).into_iter().any(|child| {
                        let child = &self.nodes[&child];
                        child.tag == "img"
                            && child.attrs.get("alt").map(String::as_str) == Some(locator)
                    })
            })
            .collect()
    }

    fn match_field(&self, locator: &str, scope: Option<u64>) -> Vec<u64> {
        let labelled: Vec<String> = self
            .descendants(scope)
            .into_iter()
            .filter_map(|id| {
                let node = &self.nodes[&id];
                (node.tag == "label" && self.full_text(id).contains(locator))
                    .then(|| node.attrs.get("for").cloned())
                    .flatten()
            })
            .collect();
        self.descendants(scope)
            .into_iter()
            .filter(|&id| {
                let node = &self.nodes[&id];
                if !matches!(node.tag.as_str(), "input" | "textarea" | "select") {
                    return false;
                }
                node.attrs.get("id").map(String::as_str) == Some(locator)
                    || node.attrs.get("name").map(String::as_str) == Some(locator)
                    || node
                        .attrs
                        .get("id")
                        .is_some_and(|id_attr| labelled.contains(id_attr))
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct CompoundSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
}

fn invalid(selector: &str, message: &str) -> HallarError {
    HallarError::InvalidSelector {
        selector: selector.to_string(),
        message: message.to_string(),
    }
}

fn parse_css(css: &str) -> HallarResult<Vec<CompoundSelector>> {
    css.split_whitespace()
        .map(|part| parse_compound(part).ok_or_else(|| invalid(css, "unsupported css syntax")))
        .collect()
}

fn parse_compound(part: &str) -> Option<CompoundSelector> {
    let mut sel = CompoundSelector::default();
    let mut rest = part;
    let mut universal = false;
    if rest.starts_with('*') {
        universal = true;
        rest = &rest[1..];
    } else {
        let end = rest
            .find(|c: char| !c.is_ascii_alphanumeric() && c != '-' && c != '_')
            .unwrap_or(rest.len());
        if end > 0 {
            sel.tag = Some(rest[..end].to_string());
            rest = &rest[end..];
        }
    }
    while !rest.is_empty() {
        let (marker, tail) = rest.split_at(1);
        match marker {
            "#" | "." => {
                let end = tail
                    .find(|c: char| !c.is_ascii_alphanumeric() && c != '-' && c != '_')
                    .unwrap_or(tail.len());
                if end == 0 {
                    return None;
                }
                let name = tail[..end].to_string();
                if marker == "#" {
                    sel.id = Some(name);
                } else {
                    sel.classes.push(name);
                }
                rest = &tail[end..];
            }
            "[" => {
                let close = tail.find(']')?;
                let body = &tail[..close];
                let (name, value) = body.split_once('=')?;
                let value = value.trim_matches(|c| c == '\'' || c == '"');
                sel.attrs.push((name.to_string(), value.to_string()));
                rest = &tail[close + 1..];
            }
            _ => return None,
        }
    }
    if !universal
        && sel.tag.is_none()
        && sel.id.is_none()
        && sel.classes.is_empty()
        && sel.attrs.is_empty()
    {
        return None;
    }
    Some(sel)
}

#[derive(Debug)]
struct XPathStep {
    descendant: bool,
    name: String,
    attr: Option<(String, String)>,
    position: Option<usize>,
}

fn parse_xpath(xpath: &str) -> HallarResult<Vec<XPathStep>> {
    let mut rest = xpath;
    let mut steps = Vec::new();
    while !rest.is_empty() {
        let descendant = if let Some(tail) = rest.strip_prefix("//") {
            rest = tail;
            true
        } else if let Some(tail) = rest.strip_prefix('/') {
            rest = tail;
            false
        } else {
            return Err(invalid(xpath, "expected '/' or '//'"));
        };
        let end = rest.find(|c: char| c == '/' || c == '[').unwrap_or(rest.len());
        let name = &rest[..end];
        if name.is_empty() {
            return Err(invalid(xpath, "empty step name"));
        }
        rest = &rest[end..];
        let mut step = XPathStep {
            descendant,
            name: name.to_string(),
            attr: None,
            position: None,
        };
        while rest.starts_with('[') {
            let close = rest
                .find(']')
                .ok_or_else(|| invalid(xpath, "unterminated predicate"))?;
            let body = &rest[1..close];
            rest = &rest[close + 1..];
            if let Some(attr) = body.strip_prefix('@') {
                match attr.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim_matches('\'').trim_matches('"');
                        step.attr = Some((name.to_string(), value.to_string()));
                    }
                    // Bare @attr predicate: the boolean attribute is set
                    None => step.attr = Some((attr.to_string(), attr.to_string())),
                }
            } else {
                let position = body
                    .parse::<usize>()
                    .map_err(|_| invalid(xpath, "unsupported predicate"))?;
                step.position = Some(position);
            }
        }
        steps.push(step);
    }
    if steps.is_empty() {
        return Err(invalid(xpath, "empty location path"));
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_document() -> (MockDriver, ElementHandle) {
        let driver = MockDriver::without_js();
        let root = driver.mount(
            NodeSpec::new("body")
                .child(
                    NodeSpec::new("textarea")
                        .attr("id", "normal")
                        .text("banana"),
                )
                .child(
                    NodeSpec::new("input")
                        .attr("id", "valueless_checkbox")
                        .attr("type", "checkbox"),
                )
                .child(
                    NodeSpec::new("select")
                        .attr("id", "languages")
                        .child(NodeSpec::new("option").attr("value", "en").flag("selected"))
                        .child(NodeSpec::new("option").attr("value", "sv")),
                ),
        );
        (driver, root)
    }

    fn resolve_one(driver: &MockDriver, selector: &Selector) -> ElementHandle {
        let matches = driver.resolve(selector, None).unwrap();
        assert_eq!(matches.len(), 1, "expected a single match for {selector:?}");
        matches[0]
    }

    mod selector_tests {
        use super::*;

        #[test]
        fn test_css_by_id() {
            let (driver, _) = form_document();
            let handle = resolve_one(&driver, &Selector::css("#normal"));
            assert_eq!(driver.tag_name(&handle).unwrap(), "textarea");
        }

        #[test]
        fn test_css_descendant_chain() {
            let (driver, _) = form_document();
            let matches = driver
                .resolve(&Selector::css("select option"), None)
                .unwrap();
            assert_eq!(matches.len(), 2);
        }

        #[test]
        fn test_css_attribute_selector() {
            let (driver, _) = form_document();
            let handle = resolve_one(&driver, &Selector::css("input[type='checkbox']"));
            assert_eq!(driver.tag_name(&handle).unwrap(), "input");
        }

        #[test]
        fn test_css_rejects_unsupported_syntax() {
            let (driver, _) = form_document();
            let err = driver
                .resolve(&Selector::css("ul > li"), None)
                .unwrap_err();
            assert!(matches!(err, HallarError::InvalidSelector { .. }));
        }

        #[test]
        fn test_xpath_anywhere_with_attribute() {
            let (driver, _) = form_document();
            let handle =
                resolve_one(&driver, &Selector::xpath("//textarea[@id='normal']"));
            assert_eq!(driver.tag_name(&handle).unwrap(), "textarea");
        }

        #[test]
        fn test_xpath_child_step_with_position() {
            let (driver, _) = form_document();
            let handle = resolve_one(&driver, &Selector::xpath("//select/option[2]"));
            assert_eq!(
                driver.attribute(&handle, "value").unwrap(),
                Some(AttrValue::Text("sv".into()))
            );
        }

        #[test]
        fn test_xpath_absolute_root() {
            let (driver, root) = form_document();
            let handle = resolve_one(&driver, &Selector::xpath("/body"));
            assert_eq!(handle, root);
        }

        #[test]
        fn test_text_selector_matches_scope_itself() {
            let (driver, _) = form_document();
            let scope = resolve_one(&driver, &Selector::css("#normal"));
            let matches = driver
                .resolve(&Selector::text("banana"), Some(&scope))
                .unwrap();
            assert!(matches.contains(&scope));
        }

        #[test]
        fn test_scoped_resolution_excludes_outside_elements() {
            let (driver, _) = form_document();
            let select = resolve_one(&driver, &Selector::css("#languages"));
            let matches = driver
                .resolve(&Selector::css("option"), Some(&select))
                .unwrap();
            assert_eq!(matches.len(), 2);
            let matches = driver
                .resolve(&Selector::css("textarea"), Some(&select))
                .unwrap();
            assert!(matches.is_empty());
        }
    }

    mod named_selector_tests {
        use super::*;

        fn buttons_document() -> MockDriver {
            let driver = MockDriver::without_js();
            driver.mount(
                NodeSpec::new("body")
                    .child(NodeSpec::new("button").attr("id", "save-btn").text("Save"))
                    .child(
                        NodeSpec::new("input")
                            .attr("type", "submit")
                            .attr("value", "med"),
                    )
                    .child(NodeSpec::new("a").attr("id", "home-link").text("Go home"))
                    .child(NodeSpec::new("label").attr("for", "name").text("Full Name"))
                    .child(NodeSpec::new("input").attr("id", "name").attr("type", "text")),
            );
            driver
        }

        #[test]
        fn test_button_by_text() {
            let driver = buttons_document();
            let handle = resolve_one(&driver, &Selector::button("Save"));
            assert_eq!(driver.tag_name(&handle).unwrap(), "button");
        }

        #[test]
        fn test_button_by_input_value() {
            let driver = buttons_document();
            let handle = resolve_one(&driver, &Selector::button("med"));
            assert_eq!(driver.tag_name(&handle).unwrap(), "input");
        }

        #[test]
        fn test_plain_input_is_not_a_button() {
            let driver = buttons_document();
            let matches = driver.resolve(&Selector::button("name"), None).unwrap();
            assert!(matches.is_empty());
        }

        #[test]
        fn test_link_by_text() {
            let driver = buttons_document();
            let handle = resolve_one(&driver, &Selector::link("Go home"));
            assert_eq!(driver.tag_name(&handle).unwrap(), "a");
        }

        #[test]
        fn test_field_by_label() {
            let driver = buttons_document();
            let handle = resolve_one(&driver, &Selector::field("Full Name"));
            assert_eq!(
                driver.attribute(&handle, "id").unwrap(),
                Some(AttrValue::Text("name".into()))
            );
        }

        #[test]
        fn test_field_by_id() {
            let driver = buttons_document();
            let handle = resolve_one(&driver, &Selector::field("name"));
            assert_eq!(driver.tag_name(&handle).unwrap(), "input");
        }
    }

    mod value_tests {
        use super::*;

        #[test]
        fn test_textarea_initial_value_is_content() {
            let (driver, _) = form_document();
            let handle = resolve_one(&driver, &Selector::css("#normal"));
            assert_eq!(driver.value(&handle).unwrap(), "banana");
        }

        #[test]
        fn test_textarea_set_value_preserves_newlines() {
            let (driver, _) = form_document();
            let handle = resolve_one(&driver, &Selector::css("#normal"));
            driver.set_value(&handle, "\nbanana").unwrap();
            assert_eq!(driver.value(&handle).unwrap(), "\nbanana");
        }

        #[test]
        fn test_valueless_checkbox_defaults_to_on() {
            let (driver, _) = form_document();
            let handle = resolve_one(&driver, &Selector::css("#valueless_checkbox"));
            assert_eq!(driver.value(&handle).unwrap(), "on");
        }

        #[test]
        fn test_select_value_is_selected_option() {
            let (driver, _) = form_document();
            let handle = resolve_one(&driver, &Selector::css("#languages"));
            assert_eq!(driver.value(&handle).unwrap(), "en");
        }

        #[test]
        fn test_select_option_moves_selection() {
            let (driver, _) = form_document();
            let second = resolve_one(&driver, &Selector::xpath("//select/option[2]"));
            driver.select_option(&second).unwrap();
            assert!(driver.is_selected(&second).unwrap());
            let select = resolve_one(&driver, &Selector::css("#languages"));
            assert_eq!(driver.value(&select).unwrap(), "sv");
        }
    }

    mod state_tests {
        use super::*;

        #[test]
        fn test_disabled_cascades_from_select() {
            let driver = MockDriver::without_js();
            driver.mount(
                NodeSpec::new("body").child(
                    NodeSpec::new("select")
                        .flag("disabled")
                        .child(NodeSpec::new("option").attr("value", "x")),
                ),
            );
            let option = resolve_one(&driver, &Selector::css("option"));
            assert!(driver.is_disabled(&option).unwrap());
        }

        #[test]
        fn test_hidden_flag_hides_descendants() {
            let driver = MockDriver::without_js();
            driver.mount(
                NodeSpec::new("body")
                    .child(NodeSpec::new("div").flag("hidden").child(NodeSpec::new("p"))),
            );
            let paragraph = resolve_one(&driver, &Selector::css("p"));
            assert!(!driver.is_visible(&paragraph).unwrap());
        }

        #[test]
        fn test_boolean_attribute_reads_as_flag() {
            let driver = MockDriver::without_js();
            driver.mount(
                NodeSpec::new("body").child(
                    NodeSpec::new("input")
                        .attr("id", "checked_field")
                        .attr("type", "checkbox")
                        .flag("checked"),
                ),
            );
            let field = resolve_one(&driver, &Selector::css("#checked_field"));
            assert_eq!(
                driver.attribute(&field, "checked").unwrap(),
                Some(AttrValue::Flag(true))
            );
            assert_eq!(
                driver.attribute(&field, "disabled").unwrap(),
                Some(AttrValue::Flag(false))
            );
        }
    }

    mod mutation_tests {
        use super::*;

        #[test]
        fn test_replace_invalidates_old_handles() {
            let (driver, _) = form_document();
            let old = resolve_one(&driver, &Selector::css("#normal"));
            driver
                .replace("#normal", NodeSpec::new("textarea").attr("id", "normal"))
                .unwrap();
            let err = driver.text(&old).unwrap_err();
            assert!(err.is_stale());
        }

        #[test]
        fn test_replace_keeps_document_position() {
            let (driver, _) = form_document();
            driver
                .replace(
                    "#normal",
                    NodeSpec::new("textarea").attr("id", "normal").text("kiwi"),
                )
                .unwrap();
            let fresh = resolve_one(&driver, &Selector::css("#normal"));
            assert_eq!(driver.value(&fresh).unwrap(), "kiwi");
            // Still the first child of body
            let first = resolve_one(&driver, &Selector::xpath("/body/textarea[1]"));
            assert_eq!(first, fresh);
        }

        #[test]
        fn test_remove_invalidates_subtree() {
            let (driver, _) = form_document();
            let option = resolve_one(&driver, &Selector::xpath("//select/option[1]"));
            driver.remove("#languages").unwrap();
            assert!(driver.is_selected(&option).unwrap_err().is_stale());
        }

        #[test]
        fn test_clicks_are_recorded_in_order() {
            let (driver, _) = form_document();
            let checkbox = resolve_one(&driver, &Selector::css("#valueless_checkbox"));
            let textarea = resolve_one(&driver, &Selector::css("#normal"));
            driver.click(&checkbox).unwrap();
            driver.click(&textarea).unwrap();
            assert_eq!(driver.clicks(), vec![checkbox, textarea]);
        }

        #[test]
        fn test_mount_replaces_whole_document() {
            let (driver, root) = form_document();
            driver.mount(NodeSpec::new("body"));
            assert!(driver.tag_name(&root).unwrap_err().is_stale());
        }
    }
}
