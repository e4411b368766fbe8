#![forbid(unsafe_code)]

//! Tag-counted non-interactive marking.
//!
//! Several overlay instances can mark the same background element as
//! non-interactive at the same time. A boolean attribute cannot express that:
//! the first instance to close would clear it while the others still need it.
//! [`InertRegistry`] instead keeps, per node, a count per tagging instance and
//! mirrors the *effective* state into the DOM (`inert` + `aria-hidden`).
//!
//! # Stacking
//!
//! Instances are ranked by the order they opened ([`InertRegistry::raise`]).
//! A tag placed by a lower-ranked instance does not apply to the container of
//! a higher-ranked instance: when a second overlay opens on top of a first,
//! the first one's "siblings are inert" marking must not disable the second.
//!
//! # Invariants
//!
//! 1. A node is effectively non-interactive iff at least one applicable tag
//!    has a positive count.
//! 2. `unmark` by one instance never removes another instance's tag.
//! 3. After `release_all(id)`, no node carries a tag from `id`.
//! 4. The DOM attributes of every touched node match its effective state.

use ahash::AHashMap;
use sheets_core::{Dom, InstanceId, NodeId};

/// DOM attribute mirroring effective non-interactive state.
pub const INERT_ATTR: &str = "inert";
/// Assistive-technology counterpart of [`INERT_ATTR`].
pub const ARIA_HIDDEN_ATTR: &str = "aria-hidden";

/// Reference-counted non-interactive tags shared by all instances of one
/// document.
#[derive(Debug, Default)]
pub struct InertRegistry {
    tags: AHashMap<NodeId, AHashMap<InstanceId, u32>>,
    owners: AHashMap<NodeId, InstanceId>,
    order: Vec<InstanceId>,
}

impl InertRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Ownership & stacking ---

    /// Declare `container` as the overlay host of `instance`.
    pub fn register_owner(&mut self, container: NodeId, instance: InstanceId) {
        self.owners.insert(container, instance);
    }

    /// Forget the owner of `container`.
    pub fn forget_owner(&mut self, container: NodeId) {
        self.owners.remove(&container);
    }

    /// Move `instance` to the top of the stacking order.
    pub fn raise(&mut self, dom: &mut dyn Dom, instance: InstanceId) {
        self.order.retain(|&i| i != instance);
        self.order.push(instance);
        self.sync_owned(dom);
    }

    /// Remove `instance` from the stacking order.
    pub fn lower(&mut self, dom: &mut dyn Dom, instance: InstanceId) {
        let before = self.order.len();
        self.order.retain(|&i| i != instance);
        if self.order.len() != before {
            self.sync_owned(dom);
        }
    }

    /// Position of `instance` in the stacking order (higher is on top).
    pub fn rank(&self, instance: InstanceId) -> Option<usize> {
        self.order.iter().position(|&i| i == instance)
    }

    /// The top-most stacked instance.
    pub fn top(&self) -> Option<InstanceId> {
        self.order.last().copied()
    }

    // --- Tagging ---

    /// Add one tag from `by` to `node`.
    pub fn mark(&mut self, dom: &mut dyn Dom, node: NodeId, by: InstanceId) {
        *self.tags.entry(node).or_default().entry(by).or_insert(0) += 1;
        self.sync(dom, node);
    }

    /// Remove one tag from `by` on `node`. Returns `false` if `by` had none.
    pub fn unmark(&mut self, dom: &mut dyn Dom, node: NodeId, by: InstanceId) -> bool {
        let Some(per_node) = self.tags.get_mut(&node) else {
            return false;
        };
        let Some(count) = per_node.get_mut(&by) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            per_node.remove(&by);
        }
        if per_node.is_empty() {
            self.tags.remove(&node);
        }
        self.sync(dom, node);
        true
    }

    /// Remove every tag placed by `by`. Returns the number of nodes touched.
    pub fn release_all(&mut self, dom: &mut dyn Dom, by: InstanceId) -> usize {
        let touched: Vec<NodeId> = self
            .tags
            .iter()
            .filter(|(_, per_node)| per_node.contains_key(&by))
            .map(|(&node, _)| node)
            .collect();
        for &node in &touched {
            if let Some(per_node) = self.tags.get_mut(&node) {
                per_node.remove(&by);
                if per_node.is_empty() {
                    self.tags.remove(&node);
                }
            }
            self.sync(dom, node);
        }
        touched.len()
    }

    // --- Queries ---

    /// Whether `by` currently tags `node`.
    pub fn is_tagged_by(&self, node: NodeId, by: InstanceId) -> bool {
        self.tags
            .get(&node)
            .is_some_and(|per_node| per_node.contains_key(&by))
    }

    /// Number of distinct instances tagging `node`.
    pub fn tag_count(&self, node: NodeId) -> usize {
        self.tags.get(&node).map_or(0, |per_node| per_node.len())
    }

    /// Whether `node` itself is effectively non-interactive (ignoring
    /// ancestors).
    pub fn applies(&self, node: NodeId) -> bool {
        let Some(per_node) = self.tags.get(&node) else {
            return false;
        };
        let owner_rank = self
            .owners
            .get(&node)
            .and_then(|&owner| self.rank(owner));
        per_node.keys().any(|&tagger| match owner_rank {
            Some(owner_rank) => self.rank(tagger).is_none_or(|r| r > owner_rank),
            None => true,
        })
    }

    /// Whether `node` or any ancestor is effectively non-interactive.
    pub fn is_inert(&self, dom: &dyn Dom, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if self.applies(current) {
                return true;
            }
            cursor = dom.parent(current);
        }
        false
    }

    fn sync(&self, dom: &mut dyn Dom, node: NodeId) {
        if self.applies(node) {
            dom.set_attribute(node, INERT_ATTR, "");
            dom.set_attribute(node, ARIA_HIDDEN_ATTR, "true");
        } else {
            dom.remove_attribute(node, INERT_ATTR);
            dom.remove_attribute(node, ARIA_HIDDEN_ATTR);
        }
    }

    fn sync_owned(&self, dom: &mut dyn Dom) {
        let owned: Vec<NodeId> = self
            .owners
            .keys()
            .copied()
            .filter(|node| self.tags.contains_key(node))
            .collect();
        for node in owned {
            self.sync(dom, node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sheets_core::MemoryDom;

    fn setup() -> (MemoryDom, NodeId, NodeId) {
        let mut dom = MemoryDom::new();
        let root = dom.document_root();
        let app = dom.append_new(root, "main");
        let aside = dom.append_new(root, "aside");
        (dom, app, aside)
    }

    #[test]
    fn mark_sets_attributes() {
        let (mut dom, app, _) = setup();
        let mut reg = InertRegistry::new();
        let a = InstanceId::next();

        reg.mark(&mut dom, app, a);
        assert!(dom.has_attribute(app, INERT_ATTR));
        assert_eq!(dom.attribute(app, ARIA_HIDDEN_ATTR).as_deref(), Some("true"));
        assert!(reg.applies(app));
    }

    #[test]
    fn overlapping_tags_are_counted() {
        let (mut dom, app, _) = setup();
        let mut reg = InertRegistry::new();
        let a = InstanceId::next();
        let b = InstanceId::next();

        reg.mark(&mut dom, app, a);
        reg.mark(&mut dom, app, b);
        assert_eq!(reg.tag_count(app), 2);

        assert!(reg.unmark(&mut dom, app, a));
        assert!(dom.has_attribute(app, INERT_ATTR), "b still tags the node");

        assert!(reg.unmark(&mut dom, app, b));
        assert!(!dom.has_attribute(app, INERT_ATTR));
        assert!(!dom.has_attribute(app, ARIA_HIDDEN_ATTR));
    }

    #[test]
    fn unmark_without_tag_is_rejected() {
        let (mut dom, app, _) = setup();
        let mut reg = InertRegistry::new();
        let a = InstanceId::next();
        let b = InstanceId::next();
        reg.mark(&mut dom, app, a);
        assert!(!reg.unmark(&mut dom, app, b));
        assert!(reg.applies(app));
    }

    #[test]
    fn release_all_only_touches_own_tags() {
        let (mut dom, app, aside) = setup();
        let mut reg = InertRegistry::new();
        let a = InstanceId::next();
        let b = InstanceId::next();

        reg.mark(&mut dom, app, a);
        reg.mark(&mut dom, aside, a);
        reg.mark(&mut dom, aside, b);

        assert_eq!(reg.release_all(&mut dom, a), 2);
        assert!(!dom.has_attribute(app, INERT_ATTR));
        assert!(dom.has_attribute(aside, INERT_ATTR));
        assert!(!reg.is_tagged_by(aside, a));
        assert!(reg.is_tagged_by(aside, b));
    }

    #[test]
    fn lower_ranked_tag_does_not_disable_higher_container() {
        let (mut dom, first, second) = setup();
        let mut reg = InertRegistry::new();
        let a = InstanceId::next();
        let b = InstanceId::next();
        reg.register_owner(first, a);
        reg.register_owner(second, b);

        reg.raise(&mut dom, a);
        reg.mark(&mut dom, second, a);
        assert!(reg.applies(second), "b is closed, a's tag applies");

        reg.raise(&mut dom, b);
        assert!(!reg.applies(second), "b now stacks above a");
        assert!(!dom.has_attribute(second, INERT_ATTR));

        reg.mark(&mut dom, first, b);
        assert!(reg.applies(first));

        reg.lower(&mut dom, b);
        assert!(reg.applies(second), "b closed again");
    }

    #[test]
    fn inert_ancestor_blocks_descendants() {
        let (mut dom, app, _) = setup();
        let nested = dom.append_new(app, "div");
        let mut reg = InertRegistry::new();
        let a = InstanceId::next();
        assert!(!reg.is_inert(&dom, nested));
        reg.mark(&mut dom, app, a);
        assert!(reg.is_inert(&dom, nested));
        assert!(!reg.applies(nested));
    }

    #[test]
    fn rank_follows_open_order() {
        let mut dom = MemoryDom::new();
        let mut reg = InertRegistry::new();
        let a = InstanceId::next();
        let b = InstanceId::next();
        reg.raise(&mut dom, a);
        reg.raise(&mut dom, b);
        assert_eq!(reg.rank(a), Some(0));
        assert_eq!(reg.rank(b), Some(1));
        assert_eq!(reg.top(), Some(b));
        reg.raise(&mut dom, a);
        assert_eq!(reg.top(), Some(a));
        reg.lower(&mut dom, a);
        assert_eq!(reg.rank(a), None);
    }

    proptest! {
        #[test]
        fn effective_state_matches_net_counts(
            ops in proptest::collection::vec((0usize..3, any::<bool>()), 0..64)
        ) {
            let (mut dom, app, _) = setup();
            let mut reg = InertRegistry::new();
            let ids = [InstanceId::next(), InstanceId::next(), InstanceId::next()];
            let mut counts = [0u32; 3];

            for (who, add) in ops {
                if add {
                    reg.mark(&mut dom, app, ids[who]);
                    counts[who] += 1;
                } else if reg.unmark(&mut dom, app, ids[who]) {
                    counts[who] -= 1;
                } else {
                    prop_assert_eq!(counts[who], 0);
                }
                let expected = counts.iter().any(|&c| c > 0);
                prop_assert_eq!(reg.applies(app), expected);
                prop_assert_eq!(dom.has_attribute(app, INERT_ATTR), expected);
            }
        }
    }
}
