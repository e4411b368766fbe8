#![forbid(unsafe_code)]

//! Focus target search within a subtree.
//!
//! Both searches walk descendants depth-first in pre-order (document order)
//! and return the first match. The subtree root itself is never returned.
//! Subtrees carrying the `inert` attribute are skipped: nothing inside them
//! can receive focus.

use sheets_core::{Dom, NodeId};

use crate::inert::INERT_ATTR;

/// Attribute flagging the preferred focus target of a sheet.
pub const AUTOFOCUS_ATTR: &str = "data-autofocus";

/// First keyboard-focusable descendant of `root` (tab index `>= 0`).
pub fn first_focusable(dom: &dyn Dom, root: NodeId) -> Option<NodeId> {
    find_descendant(dom, root, &|dom, node| dom.tab_index(node) >= 0)
}

/// First descendant of `root` flagged with [`AUTOFOCUS_ATTR`].
pub fn default_focus_target(dom: &dyn Dom, root: NodeId) -> Option<NodeId> {
    find_descendant(dom, root, &|dom, node| dom.has_attribute(node, AUTOFOCUS_ATTR))
}

fn find_descendant(
    dom: &dyn Dom,
    root: NodeId,
    matches: &dyn Fn(&dyn Dom, NodeId) -> bool,
) -> Option<NodeId> {
    let mut stack: Vec<NodeId> = dom.children(root).into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        if dom.has_attribute(node, INERT_ATTR) {
            continue;
        }
        if matches(dom, node) {
            return Some(node);
        }
        stack.extend(dom.children(node).into_iter().rev());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheets_core::MemoryDom;

    /// ```text
    /// sheet
    /// ├── header
    /// │   └── h2
    /// ├── form
    /// │   ├── input        (first focusable, pre-order)
    /// │   └── button [data-autofocus]
    /// └── button
    /// ```
    fn sheet() -> (MemoryDom, NodeId, NodeId, NodeId, NodeId) {
        let mut dom = MemoryDom::new();
        let root = dom.document_root();
        let sheet = dom.append_new(root, "section");
        let header = dom.append_new(sheet, "header");
        dom.append_new(header, "h2");
        let form = dom.append_new(sheet, "form");
        let input = dom.append_new(form, "input");
        let submit = dom.append_new(form, "button");
        dom.set_attribute(submit, AUTOFOCUS_ATTR, "");
        let close = dom.append_new(sheet, "button");
        (dom, sheet, input, submit, close)
    }

    #[test]
    fn first_focusable_is_preorder() {
        let (dom, sheet, input, _, _) = sheet();
        assert_eq!(first_focusable(&dom, sheet), Some(input));
    }

    #[test]
    fn default_target_is_flagged_element() {
        let (dom, sheet, _, submit, _) = sheet();
        assert_eq!(default_focus_target(&dom, sheet), Some(submit));
    }

    #[test]
    fn root_is_never_returned() {
        let mut dom = MemoryDom::new();
        let root = dom.document_root();
        let button = dom.append_new(root, "button");
        assert_eq!(first_focusable(&dom, button), None);
    }

    #[test]
    fn inert_subtrees_are_skipped() {
        let (mut dom, sheet, _, submit, close) = sheet();
        let form = dom.parent(submit).expect("form");
        dom.set_attribute(form, INERT_ATTR, "");
        assert_eq!(first_focusable(&dom, sheet), Some(close));
        assert_eq!(default_focus_target(&dom, sheet), None);
    }

    #[test]
    fn negative_tabindex_is_not_keyboard_focusable() {
        let mut dom = MemoryDom::new();
        let root = dom.document_root();
        let sheet = dom.append_new(root, "section");
        let skipped = dom.append_new(sheet, "button");
        dom.set_attribute(skipped, "tabindex", "-1");
        let target = dom.append_new(sheet, "div");
        dom.set_attribute(target, "tabindex", "0");
        assert_eq!(first_focusable(&dom, sheet), Some(target));
    }
}
