//! In-memory [`DomHost`] used by headless hosts and tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

use serde_json::Value;

use super::{DomEvent, DomHost, ElementId, EventListener};

/// Operation counters, handy for asserting how much work a patch did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DomStats {
    pub created: usize,
    pub removed: usize,
    pub text_updates: usize,
    pub listeners_added: usize,
    pub listeners_removed: usize,
}

enum Kind {
    Element(String),
    Text(String),
}

struct MemNode {
    kind: Kind,
    attrs: BTreeMap<String, String>,
    props: BTreeMap<String, Value>,
    classes: BTreeSet<String>,
    children: Vec<ElementId>,
    parent: Option<ElementId>,
    listeners: BTreeMap<String, Rc<dyn EventListener>>,
}

impl MemNode {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            attrs: BTreeMap::new(),
            props: BTreeMap::new(),
            classes: BTreeSet::new(),
            children: Vec::new(),
            parent: None,
            listeners: BTreeMap::new(),
        }
    }
}

/// Arena-backed display tree with a `body` element as its document root.
pub struct MemoryDom {
    next_id: u64,
    nodes: HashMap<ElementId, MemNode>,
    body: ElementId,
    stats: DomStats,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    pub fn new() -> Self {
        let body = ElementId(1);
        let mut nodes = HashMap::new();
        nodes.insert(body, MemNode::new(Kind::Element("body".to_string())));
        Self {
            next_id: 2,
            nodes,
            body,
            stats: DomStats::default(),
        }
    }

    pub fn body(&self) -> ElementId {
        self.body
    }

    /// Create an element and append it to `parent`; returns the new element.
    pub fn append_element(&mut self, parent: ElementId, tag: &str) -> ElementId {
        let el = self.create_element(tag);
        self.insert_before(parent, el, None);
        el
    }

    pub fn stats(&self) -> DomStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = DomStats::default();
    }

    pub fn contains(&self, node: ElementId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn children(&self, node: ElementId) -> Vec<ElementId> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn attribute(&self, element: ElementId, name: &str) -> Option<&str> {
        self.nodes
            .get(&element)
            .and_then(|n| n.attrs.get(name))
            .map(String::as_str)
    }

    pub fn property(&self, element: ElementId, name: &str) -> Option<&Value> {
        self.nodes.get(&element).and_then(|n| n.props.get(name))
    }

    pub fn has_class(&self, element: ElementId, name: &str) -> bool {
        self.nodes
            .get(&element)
            .is_some_and(|n| n.classes.contains(name))
    }

    pub fn listener(&self, element: ElementId, event: &str) -> Option<Rc<dyn EventListener>> {
        self.nodes
            .get(&element)
            .and_then(|n| n.listeners.get(event))
            .cloned()
    }

    pub fn listener_names(&self, element: ElementId) -> Vec<String> {
        self.nodes
            .get(&element)
            .map(|n| n.listeners.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self, node: ElementId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: ElementId, out: &mut String) {
        let Some(n) = self.nodes.get(&node) else {
            return;
        };
        match &n.kind {
            Kind::Text(text) => out.push_str(text),
            Kind::Element(_) => {
                for child in &n.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// First descendant of `root` (depth first, root excluded) matching a
    /// simple `tag`, `.class`, `#id` or `tag.class` selector.
    pub fn query(&self, root: ElementId, selector: &str) -> Option<ElementId> {
        self.query_all(root, selector).into_iter().next()
    }

    pub fn query_all(&self, root: ElementId, selector: &str) -> Vec<ElementId> {
        let mut out = Vec::new();
        for child in self.children(root) {
            self.collect_matches(child, selector, &mut out);
        }
        out
    }

    fn collect_matches(&self, node: ElementId, selector: &str, out: &mut Vec<ElementId>) {
        if self.matches(node, selector) {
            out.push(node);
        }
        for child in self.children(node) {
            self.collect_matches(child, selector, out);
        }
    }

    fn matches(&self, node: ElementId, selector: &str) -> bool {
        let Some(n) = self.nodes.get(&node) else {
            return false;
        };
        let Kind::Element(tag) = &n.kind else {
            return false;
        };
        if let Some(id) = selector.strip_prefix('#') {
            return n.attrs.get("id").is_some_and(|v| v == id);
        }
        let mut parts = selector.split('.');
        let wanted_tag = parts.next().unwrap_or_default();
        if !wanted_tag.is_empty() && wanted_tag != tag {
            return false;
        }
        parts.all(|class| n.classes.contains(class))
    }

    /// Serialize the subtree rooted at `node`.
    pub fn to_html(&self, node: ElementId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: ElementId, out: &mut String) {
        let Some(n) = self.nodes.get(&node) else {
            return;
        };
        match &n.kind {
            Kind::Text(text) => out.push_str(&escape(text)),
            Kind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                if !n.classes.is_empty() {
                    let classes: Vec<&str> = n.classes.iter().map(String::as_str).collect();
                    out.push_str(&format!(" class=\"{}\"", escape(&classes.join(" "))));
                }
                for (name, value) in &n.attrs {
                    out.push_str(&format!(" {}=\"{}\"", name, escape(value)));
                }
                out.push('>');
                for child in &n.children {
                    self.write_html(*child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
        }
    }

    /// Deliver `event` to the listener registered on its target.
    ///
    /// The host borrow is released before the listener runs, so handlers may
    /// drive the application (and through it, the host) freely. Returns
    /// whether a listener was found.
    pub fn dispatch(dom: &RefCell<MemoryDom>, event: &DomEvent) -> bool {
        let listener = dom.borrow().listener(event.target, &event.kind);
        match listener {
            Some(listener) => {
                listener.handle_event(event);
                true
            }
            None => false,
        }
    }

    fn alloc(&mut self, kind: Kind) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, MemNode::new(kind));
        self.stats.created += 1;
        id
    }

    fn detach(&mut self, child: ElementId) {
        let parent = self.nodes.get(&child).and_then(|n| n.parent);
        if let Some(parent) = parent {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|c| *c != child);
            }
        }
        if let Some(n) = self.nodes.get_mut(&child) {
            n.parent = None;
        }
    }

    fn drop_subtree(&mut self, node: ElementId) {
        if let Some(n) = self.nodes.remove(&node) {
            for child in n.children {
                self.drop_subtree(child);
            }
        }
    }
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl DomHost for MemoryDom {
    fn create_element(&mut self, tag: &str) -> ElementId {
        self.alloc(Kind::Element(tag.to_ascii_lowercase()))
    }

    fn create_text(&mut self, text: &str) -> ElementId {
        self.alloc(Kind::Text(text.to_string()))
    }

    fn insert_before(&mut self, parent: ElementId, child: ElementId, reference: Option<ElementId>) {
        self.detach(child);
        let Some(p) = self.nodes.get_mut(&parent) else {
            return;
        };
        let index = reference
            .and_then(|r| p.children.iter().position(|c| *c == r))
            .unwrap_or(p.children.len());
        p.children.insert(index, child);
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(parent);
        }
    }

    fn remove_child(&mut self, parent: ElementId, child: ElementId) {
        let attached = self
            .nodes
            .get(&child)
            .is_some_and(|n| n.parent == Some(parent));
        if !attached {
            return;
        }
        self.detach(child);
        self.drop_subtree(child);
        self.stats.removed += 1;
    }

    fn parent_node(&self, node: ElementId) -> Option<ElementId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn next_sibling(&self, node: ElementId) -> Option<ElementId> {
        let parent = self.parent_node(node)?;
        let siblings = &self.nodes.get(&parent)?.children;
        let index = siblings.iter().position(|c| *c == node)?;
        siblings.get(index + 1).copied()
    }

    fn tag_name(&self, node: ElementId) -> Option<String> {
        match &self.nodes.get(&node)?.kind {
            Kind::Element(tag) => Some(tag.clone()),
            Kind::Text(_) => None,
        }
    }

    fn set_text(&mut self, node: ElementId, text: &str) {
        let Some(n) = self.nodes.get_mut(&node) else {
            return;
        };
        match &mut n.kind {
            Kind::Text(current) => {
                *current = text.to_string();
            }
            Kind::Element(_) => {
                let old = std::mem::take(&mut n.children);
                let text_node = self.alloc(Kind::Text(text.to_string()));
                for child in old {
                    self.drop_subtree(child);
                }
                if let Some(n) = self.nodes.get_mut(&node) {
                    n.children.push(text_node);
                }
                if let Some(t) = self.nodes.get_mut(&text_node) {
                    t.parent = Some(node);
                }
            }
        }
        self.stats.text_updates += 1;
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(n) = self.nodes.get_mut(&element) {
            n.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&mut self, element: ElementId, name: &str) {
        if let Some(n) = self.nodes.get_mut(&element) {
            n.attrs.remove(name);
        }
    }

    fn set_property(&mut self, element: ElementId, name: &str, value: &Value) {
        if let Some(n) = self.nodes.get_mut(&element) {
            n.props.insert(name.to_string(), value.clone());
        }
    }

    fn remove_property(&mut self, element: ElementId, name: &str) {
        if let Some(n) = self.nodes.get_mut(&element) {
            n.props.remove(name);
        }
    }

    fn set_class(&mut self, element: ElementId, name: &str, enabled: bool) {
        if let Some(n) = self.nodes.get_mut(&element) {
            if enabled {
                n.classes.insert(name.to_string());
            } else {
                n.classes.remove(name);
            }
        }
    }

    fn add_listener(&mut self, element: ElementId, event: &str, listener: Rc<dyn EventListener>) {
        if let Some(n) = self.nodes.get_mut(&element) {
            n.listeners.insert(event.to_string(), listener);
            self.stats.listeners_added += 1;
        }
    }

    fn remove_listener(&mut self, element: ElementId, event: &str) {
        if let Some(n) = self.nodes.get_mut(&element) {
            if n.listeners.remove(event).is_some() {
                self.stats.listeners_removed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_before_orders_and_moves() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let a = dom.append_element(body, "a");
        let b = dom.append_element(body, "b");
        let c = dom.create_element("c");

        dom.insert_before(body, c, Some(b));
        assert_eq!(dom.children(body), vec![a, c, b]);

        dom.insert_before(body, a, None);
        assert_eq!(dom.children(body), vec![c, b, a]);
        assert_eq!(dom.next_sibling(c), Some(b));
        assert_eq!(dom.next_sibling(a), None);
    }

    #[test]
    fn html_and_query() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let ul = dom.append_element(body, "ul");
        dom.set_class(ul, "todo-list", true);
        let li = dom.append_element(ul, "li");
        dom.set_attribute(li, "id", "first");
        let text = dom.create_text("a < b");
        dom.insert_before(li, text, None);

        assert_eq!(
            dom.to_html(ul),
            "<ul class=\"todo-list\"><li id=\"first\">a &lt; b</li></ul>"
        );
        assert_eq!(dom.query(body, "ul.todo-list"), Some(ul));
        assert_eq!(dom.query(body, "#first"), Some(li));
        assert_eq!(dom.text_content(body), "a < b");
    }

    #[test]
    fn remove_child_drops_subtree() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let div = dom.append_element(body, "div");
        let span = dom.append_element(div, "span");

        dom.remove_child(body, div);
        assert!(!dom.contains(div));
        assert!(!dom.contains(span));
        assert_eq!(dom.stats().removed, 1);
    }
}
