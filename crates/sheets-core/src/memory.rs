#![forbid(unsafe_code)]

//! In-memory [`Dom`] implementation.
//!
//! `MemoryDom` is an arena-backed element tree with just enough browser
//! semantics for the overlay engine: intrinsic focusability, the `inert`
//! attribute blocking focus, removal clearing the active element, and
//! per-element scroll metrics.
//!
//! It backs the test suites and headless embeddings where no real document
//! exists.

use ahash::AHashMap;

use crate::dom::{Dom, NodeId, ScrollMetrics};

/// Tags that are keyboard-focusable without an explicit `tabindex`.
const INTRINSIC_FOCUSABLE: &[&str] = &["button", "input", "select", "textarea"];

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: AHashMap<String, String>,
    styles: AHashMap<String, String>,
    scroll: ScrollMetrics,
}

/// Arena-backed element tree.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<Node>,
    root: NodeId,
    active: Option<NodeId>,
    scroll_locked: bool,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Create a document containing only a `body` root.
    pub fn new() -> Self {
        let body = Node {
            tag: "body".to_owned(),
            ..Node::default()
        };
        Self {
            nodes: vec![body],
            root: NodeId::new(0),
            active: None,
            scroll_locked: false,
        }
    }

    /// Create an element and append it to `parent` in one step.
    pub fn append_new(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let node = self.create_element(tag);
        self.append_child(parent, node);
        node
    }

    /// Override the scroll geometry reported for `node`.
    pub fn set_scroll_metrics(&mut self, node: NodeId, metrics: ScrollMetrics) {
        if let Some(n) = self.node_mut(node) {
            n.scroll = metrics;
        }
    }

    /// Read an inline style property previously written with [`Dom::set_style`].
    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.node(node)
            .and_then(|n| n.styles.get(property))
            .map(String::as_str)
    }

    /// Whether `node` or one of its ancestors carries `inert`.
    pub fn is_inert(&self, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if self.has_attribute(current, "inert") {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Number of nodes ever created (attached or not).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: the document root always exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.get() as usize)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.get() as usize)
    }

    fn detach(&mut self, node: NodeId) {
        let parent = self.node(node).and_then(|n| n.parent);
        if let Some(parent) = parent
            && let Some(p) = self.node_mut(parent)
        {
            p.children.retain(|&c| c != node);
        }
        if let Some(n) = self.node_mut(node) {
            n.parent = None;
        }
    }
}

impl Dom for MemoryDom {
    fn document_root(&self) -> NodeId {
        self.root
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(Node {
            tag: tag.to_ascii_lowercase(),
            ..Node::default()
        });
        id
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.contains(child, parent) {
            return;
        }
        if self.node(parent).is_none() || self.node(child).is_none() {
            return;
        }
        self.detach(child);
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
    }

    fn remove(&mut self, node: NodeId) {
        if node == self.root {
            return;
        }
        if let Some(active) = self.active
            && self.contains(node, active)
        {
            self.active = None;
        }
        self.detach(node);
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn tag(&self, node: NodeId) -> Option<String> {
        self.node(node).map(|n| n.tag.clone())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.node(node).and_then(|n| n.attributes.get(name).cloned())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(n) = self.node_mut(node) {
            n.attributes.insert(name.to_owned(), value.to_owned());
        }
        if name == "inert"
            && let Some(active) = self.active
            && self.contains(node, active)
        {
            self.active = None;
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(n) = self.node_mut(node) {
            n.attributes.remove(name);
        }
    }

    fn tab_index(&self, node: NodeId) -> i32 {
        let Some(n) = self.node(node) else {
            return -1;
        };
        if n.attributes.contains_key("disabled") {
            return -1;
        }
        if let Some(raw) = n.attributes.get("tabindex") {
            return raw.trim().parse().unwrap_or(-1);
        }
        let intrinsic = INTRINSIC_FOCUSABLE.contains(&n.tag.as_str())
            || (n.tag == "a" && n.attributes.contains_key("href"));
        if intrinsic { 0 } else { -1 }
    }

    fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    fn focus(&mut self, node: NodeId) -> bool {
        if !self.is_connected(node) || self.is_inert(node) {
            tracing::trace!(target: "sheets.host", node = node.get(), "focus rejected: detached or inert");
            return false;
        }
        let programmatic = self.has_attribute(node, "tabindex");
        if self.tab_index(node) < 0 && !programmatic {
            tracing::trace!(target: "sheets.host", node = node.get(), "focus rejected: not focusable");
            return false;
        }
        self.active = Some(node);
        true
    }

    fn scroll_metrics(&self, node: NodeId) -> ScrollMetrics {
        self.node(node).map(|n| n.scroll).unwrap_or_default()
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: Option<&str>) {
        if let Some(n) = self.node_mut(node) {
            match value {
                Some(value) => {
                    n.styles.insert(property.to_owned(), value.to_owned());
                }
                None => {
                    n.styles.remove(property);
                }
            }
        }
    }

    fn set_scroll_locked(&mut self, locked: bool) {
        self.scroll_locked = locked;
    }

    fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }
}
