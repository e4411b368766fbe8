#![forbid(unsafe_code)]

//! Key → instance registry.
//!
//! Handles are created before (or without) an instance being bound, so a
//! handle never stores the instance itself. It stores a [`ModalRef`], an
//! indirection cell that is read when a queued call executes.
//!
//! # Invariants
//!
//! 1. One [`ModalRef`] per key while anything holds it; rebinding a key
//!    swaps the cell's content, never the cell.
//! 2. An unbound cell holds `None`.
//! 3. [`ModalRegistry::prune`] drops only cells that are unbound and held by
//!    the registry alone, so no handle can observe the cell changing.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use sheets_modal::ModalInstance;

/// Key used when none is given.
pub const DEFAULT_KEY: &str = "default";

/// Shared slot holding the instance bound to one key, if any.
#[derive(Clone, Default)]
pub struct ModalRef {
    slot: Rc<RefCell<Option<ModalInstance>>>,
}

impl std::fmt::Debug for ModalRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalRef")
            .field("instance", &self.get().map(|m| m.id()))
            .finish()
    }
}

impl ModalRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently bound instance.
    pub fn get(&self) -> Option<ModalInstance> {
        self.slot.borrow().clone()
    }

    pub fn is_bound(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Bind `instance`, returning the one it replaced.
    pub fn replace(&self, instance: ModalInstance) -> Option<ModalInstance> {
        self.slot.borrow_mut().replace(instance)
    }

    /// Unbind, returning the instance that was bound.
    pub fn take(&self) -> Option<ModalInstance> {
        self.slot.borrow_mut().take()
    }

    /// Whether the registry holds the only reference to this slot.
    fn is_unshared(&self) -> bool {
        Rc::strong_count(&self.slot) == 1
    }

    /// Whether both refs share one slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

/// Registry of named slots.
#[derive(Debug, Default)]
pub struct ModalRegistry {
    slots: AHashMap<String, ModalRef>,
}

impl ModalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for `key`, created unbound on first use.
    pub fn slot(&mut self, key: &str) -> ModalRef {
        self.slots.entry(key.to_owned()).or_default().clone()
    }

    /// The instance bound to `key`.
    pub fn get(&self, key: &str) -> Option<ModalInstance> {
        self.slots.get(key).and_then(ModalRef::get)
    }

    pub fn is_bound(&self, key: &str) -> bool {
        self.slots.get(key).is_some_and(ModalRef::is_bound)
    }

    /// Every bound instance with its key, sorted by key.
    pub fn bound(&self) -> Vec<(String, ModalInstance)> {
        let mut out: Vec<(String, ModalInstance)> = self
            .slots
            .iter()
            .filter_map(|(key, slot)| slot.get().map(|m| (key.clone(), m)))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Drop unbound slots no handle refers to. Returns how many went.
    pub fn prune(&mut self) -> usize {
        let before = self.slots.len();
        self.slots
            .retain(|_, slot| slot.is_bound() || !slot.is_unshared());
        before - self.slots.len()
    }

    /// Number of slots, bound or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Keys with a bound instance, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.bound().into_iter().map(|(key, _)| key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheets_core::MemoryDom;
    use sheets_modal::{DeferredRenderer, ModalConfig, Stage};

    fn instance(stage: &Stage) -> ModalInstance {
        ModalInstance::new(stage, ModalConfig::default(), DeferredRenderer)
    }

    #[test]
    fn slot_is_stable_per_key() {
        let mut registry = ModalRegistry::new();
        let a = registry.slot("a");
        let again = registry.slot("a");
        let b = registry.slot("b");
        assert!(a.ptr_eq(&again));
        assert!(!a.ptr_eq(&b));
        assert!(!registry.is_bound("a"));
        assert!(registry.keys().is_empty());
    }

    #[test]
    fn bind_replace_and_take() {
        let stage = Stage::new(MemoryDom::new());
        let mut registry = ModalRegistry::new();
        let slot = registry.slot(DEFAULT_KEY);

        let first = instance(&stage);
        assert!(slot.replace(first.clone()).is_none());
        assert!(registry.is_bound(DEFAULT_KEY));
        assert_eq!(registry.get(DEFAULT_KEY).map(|m| m.id()), Some(first.id()));

        let second = instance(&stage);
        let replaced = slot.replace(second.clone());
        assert_eq!(replaced.map(|m| m.id()), Some(first.id()));

        assert_eq!(slot.take().map(|m| m.id()), Some(second.id()));
        assert!(registry.get(DEFAULT_KEY).is_none());
    }

    #[test]
    fn bound_is_sorted() {
        let stage = Stage::new(MemoryDom::new());
        let mut registry = ModalRegistry::new();
        registry.slot("zeta").replace(instance(&stage));
        registry.slot("alpha").replace(instance(&stage));
        registry.slot("unbound");
        assert_eq!(registry.keys(), ["alpha", "zeta"]);
    }

    #[test]
    fn prune_keeps_bound_and_held_slots() {
        let stage = Stage::new(MemoryDom::new());
        let mut registry = ModalRegistry::new();
        registry.slot("bound").replace(instance(&stage));
        let held = registry.slot("held");
        registry.slot("dropped");
        assert_eq!(registry.len(), 3);

        assert_eq!(registry.prune(), 1);
        assert_eq!(registry.len(), 2);
        assert!(held.ptr_eq(&registry.slot("held")));

        drop(held);
        assert_eq!(registry.prune(), 1);
        assert_eq!(registry.keys(), ["bound"]);
    }
}
