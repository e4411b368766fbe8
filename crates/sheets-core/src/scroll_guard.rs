#![forbid(unsafe_code)]

//! Scroll vs. drag disambiguation.
//!
//! When a pointer moves inside a draggable sheet, the movement either
//! scrolls some inner scroll container or drags the sheet itself. The rule:
//! if any element between the pointer target and the sheet container can
//! still scroll in the direction the content would move, the gesture is a
//! scroll; otherwise it is a drag.
//!
//! Positive `delta_y` means the pointer moved down (content would scroll up
//! towards its start).

use crate::dom::{Dom, NodeId};

/// How an in-progress pointer movement should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementIntent {
    /// Let the content scroll.
    Scroll,
    /// Move the sheet.
    Drag,
}

/// Total vertical scroll offset of `target` relative to `container`.
///
/// Sums `scroll_top` of `target` and each ancestor up to, but excluding,
/// `container`. Returns `0.0` when `target` is not inside `container`.
pub fn scroll_offset_within(dom: &dyn Dom, target: NodeId, container: NodeId) -> f64 {
    if target == container || !dom.contains(container, target) {
        return 0.0;
    }
    let mut offset = 0.0;
    let mut cursor = Some(target);
    while let Some(node) = cursor {
        if node == container {
            break;
        }
        offset += dom.scroll_metrics(node).scroll_top;
        cursor = dom.parent(node);
    }
    offset
}

/// Decide whether a vertical pointer movement scrolls content or drags the
/// sheet rooted at `container`.
pub fn classify_movement(
    dom: &dyn Dom,
    target: NodeId,
    container: NodeId,
    delta_y: f64,
) -> MovementIntent {
    if delta_y == 0.0 || !dom.contains(container, target) {
        return MovementIntent::Drag;
    }
    let mut cursor = Some(target);
    while let Some(node) = cursor {
        if node == container {
            break;
        }
        let metrics = dom.scroll_metrics(node);
        let scrollable = if delta_y > 0.0 {
            metrics.can_scroll_up()
        } else {
            metrics.can_scroll_down()
        };
        if scrollable {
            return MovementIntent::Scroll;
        }
        cursor = dom.parent(node);
    }
    MovementIntent::Drag
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ScrollMetrics;
    use crate::memory::MemoryDom;

    fn sheet_with_list() -> (MemoryDom, NodeId, NodeId, NodeId) {
        let mut dom = MemoryDom::new();
        let root = dom.document_root();
        let sheet = dom.append_new(root, "section");
        let list = dom.append_new(sheet, "ul");
        let item = dom.append_new(list, "li");
        (dom, sheet, list, item)
    }

    #[test]
    fn offset_sums_ancestors_inside_container() {
        let (mut dom, sheet, list, item) = sheet_with_list();
        dom.set_scroll_metrics(list, ScrollMetrics::new(40.0, 400.0, 100.0));
        dom.set_scroll_metrics(item, ScrollMetrics::new(5.0, 50.0, 50.0));
        dom.set_scroll_metrics(sheet, ScrollMetrics::new(1000.0, 2000.0, 300.0));
        assert_eq!(scroll_offset_within(&dom, item, sheet), 45.0);
    }

    #[test]
    fn offset_outside_container_is_zero() {
        let (mut dom, sheet, _list, _item) = sheet_with_list();
        let root = dom.document_root();
        let other = dom.append_new(root, "div");
        dom.set_scroll_metrics(other, ScrollMetrics::new(10.0, 100.0, 50.0));
        assert_eq!(scroll_offset_within(&dom, other, sheet), 0.0);
        assert_eq!(scroll_offset_within(&dom, sheet, sheet), 0.0);
    }

    #[test]
    fn downward_move_scrolls_when_content_is_scrolled() {
        let (mut dom, sheet, list, item) = sheet_with_list();
        dom.set_scroll_metrics(list, ScrollMetrics::new(40.0, 400.0, 100.0));
        assert_eq!(
            classify_movement(&dom, item, sheet, 12.0),
            MovementIntent::Scroll
        );
    }

    #[test]
    fn downward_move_at_top_drags() {
        let (mut dom, sheet, list, item) = sheet_with_list();
        dom.set_scroll_metrics(list, ScrollMetrics::new(0.0, 400.0, 100.0));
        assert_eq!(
            classify_movement(&dom, item, sheet, 12.0),
            MovementIntent::Drag
        );
    }

    #[test]
    fn upward_move_scrolls_while_overflow_remains() {
        let (mut dom, sheet, list, item) = sheet_with_list();
        dom.set_scroll_metrics(list, ScrollMetrics::new(0.0, 400.0, 100.0));
        assert_eq!(
            classify_movement(&dom, item, sheet, -8.0),
            MovementIntent::Scroll
        );
        dom.set_scroll_metrics(list, ScrollMetrics::new(300.0, 400.0, 100.0));
        assert_eq!(
            classify_movement(&dom, item, sheet, -8.0),
            MovementIntent::Drag
        );
    }

    #[test]
    fn container_own_scroll_is_ignored() {
        let (mut dom, sheet, _list, item) = sheet_with_list();
        dom.set_scroll_metrics(sheet, ScrollMetrics::new(50.0, 400.0, 100.0));
        assert_eq!(
            classify_movement(&dom, item, sheet, 12.0),
            MovementIntent::Drag
        );
    }
}
