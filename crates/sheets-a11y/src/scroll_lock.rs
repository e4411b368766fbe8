#![forbid(unsafe_code)]

//! Page scroll lock shared by all overlay instances.
//!
//! The page stays locked while at least one instance holds the lock; only
//! the last release unlocks it.

use ahash::AHashSet;
use sheets_core::{Dom, InstanceId};

/// Set of instances currently holding the page scroll lock.
#[derive(Debug, Default)]
pub struct ScrollLock {
    holders: AHashSet<InstanceId>,
}

impl ScrollLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock for `instance`. Re-acquiring is a no-op.
    pub fn acquire(&mut self, dom: &mut dyn Dom, instance: InstanceId) {
        if self.holders.insert(instance) && self.holders.len() == 1 {
            dom.set_scroll_locked(true);
        }
    }

    /// Release `instance`'s hold. Returns whether the page was unlocked.
    pub fn release(&mut self, dom: &mut dyn Dom, instance: InstanceId) -> bool {
        if self.holders.remove(&instance) && self.holders.is_empty() {
            dom.set_scroll_locked(false);
            return true;
        }
        false
    }

    pub fn is_held_by(&self, instance: InstanceId) -> bool {
        self.holders.contains(&instance)
    }

    pub fn holders(&self) -> usize {
        self.holders.len()
    }
}
