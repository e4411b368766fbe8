#![forbid(unsafe_code)]

//! Host tree abstraction.
//!
//! [`Dom`] is the minimal surface the overlay engine needs from a document:
//! structure (parent/children), attributes, focus, scroll metrics, and a
//! page-level scroll lock. Nodes are addressed by copyable [`NodeId`]
//! handles owned by the host.
//!
//! # Invariants
//!
//! - A `NodeId` is never reused by the same host for a different node.
//! - `children()` returns nodes in document order.
//! - `focus()` returns `true` only if the node actually became the active
//!   element.
//!
//! # Failure Modes
//!
//! - Queries on removed nodes return empty/`None` values rather than
//!   panicking.

/// Handle to a node owned by a [`Dom`] host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(u32);

impl NodeId {
    /// Wrap a raw host identifier.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw host identifier.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Scroll geometry of a single element, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollMetrics {
    /// Current vertical scroll offset.
    pub scroll_top: f64,
    /// Total scrollable content height.
    pub scroll_height: f64,
    /// Visible height of the element.
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Create metrics from raw values.
    pub const fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }

    /// Whether the element has content hidden above the viewport.
    #[inline]
    pub fn can_scroll_up(&self) -> bool {
        self.scroll_top > 0.0
    }

    /// Whether the element has content hidden below the viewport.
    #[inline]
    pub fn can_scroll_down(&self) -> bool {
        self.scroll_top + self.client_height < self.scroll_height
    }
}

/// Document operations required by the overlay engine.
pub trait Dom {
    /// The node overlays attach to when no explicit root is configured
    /// (the `<body>` of a browser document).
    fn document_root(&self) -> NodeId;

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent.
    fn append_child(&mut self, parent: NodeId, child: NodeId);

    /// Detach `node` (and its subtree) from the document.
    fn remove(&mut self, node: NodeId);

    /// Parent of `node`, if attached.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Children of `node` in document order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Lowercase tag name of `node`.
    fn tag(&self, node: NodeId) -> Option<String>;

    /// Read an attribute.
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Write an attribute.
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    /// Remove an attribute. Removing a missing attribute is a no-op.
    fn remove_attribute(&mut self, node: NodeId, name: &str);

    /// Effective tab index (DOM `tabIndex` semantics: `-1` when the element
    /// is only programmatically focusable or not focusable at all).
    fn tab_index(&self, node: NodeId) -> i32;

    /// Currently focused element.
    fn active_element(&self) -> Option<NodeId>;

    /// Move focus to `node`. Returns whether focus actually moved there.
    fn focus(&mut self, node: NodeId) -> bool;

    /// Scroll geometry of `node`.
    fn scroll_metrics(&self, node: NodeId) -> ScrollMetrics;

    /// Set (or clear, with `None`) an inline style property.
    fn set_style(&mut self, node: NodeId, property: &str, value: Option<&str>);

    /// Lock or unlock page scrolling.
    fn set_scroll_locked(&mut self, locked: bool);

    /// Whether page scrolling is currently locked.
    fn is_scroll_locked(&self) -> bool;

    /// Whether an attribute is present.
    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Whether `node` is `ancestor` or lies inside its subtree.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Whether `node` is attached to the document.
    fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.document_root(), node)
    }
}
