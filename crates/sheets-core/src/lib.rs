#![forbid(unsafe_code)]

//! Core primitives for the sheets overlay engine.
//!
//! The engine never talks to a browser directly. Everything it needs from the
//! host environment goes through the [`Dom`] trait, and everything the host
//! observes (transition ends, focus changes, key presses, pointer movement)
//! comes back in as a [`DomEvent`]. This keeps the engine:
//!
//! - **Host-driven**: the embedding layer pushes events and advances time.
//! - **Deterministic**: time only moves when the host says so ([`Timers`]).
//! - **Single-threaded**: shared state is `Rc`/`RefCell`, no locks.
//!
//! [`MemoryDom`] is a complete in-memory host used by tests and headless
//! embeddings.

pub mod clock;
pub mod dom;
pub mod error;
pub mod event;
pub mod memory;
pub mod pending;
pub mod scroll_guard;
pub mod timer;

pub use clock::{Clock, DeterministicClock, WebClock};
pub use dom::{Dom, NodeId, ScrollMetrics};
pub use error::{Direction, ErrorKind, ModalError, Result};
pub use event::{DomEvent, Key, PointerEvent, PointerPhase};
pub use memory::MemoryDom;
pub use pending::{Pending, Resolver};
pub use scroll_guard::{MovementIntent, classify_movement, scroll_offset_within};
pub use timer::{Sleep, Timers};

use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for instance identifiers.
static INSTANCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Stable identifier of one bound overlay host.
///
/// Identifiers are process-unique and never reused, which lets shared
/// bookkeeping (non-interactive tags, scroll locks) attribute state to the
/// instance that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Allocate a fresh identifier.
    pub fn next() -> Self {
        Self(INSTANCE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "modal-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_ids_are_unique() {
        let a = InstanceId::next();
        let b = InstanceId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn instance_id_display() {
        let id = InstanceId(7);
        assert_eq!(id.to_string(), "modal-7");
    }
}
