#![forbid(unsafe_code)]

//! Accessibility plumbing for stacked overlays.
//!
//! Everything here is document-wide state shared by every overlay instance
//! mounted on the same [`Dom`](sheets_core::Dom):
//!
//! - [`InertRegistry`] keeps reference-counted non-interactive tags.
//! - [`ScrollLock`] locks page scroll while any instance holds it.
//! - [`FocusCoordinator`] drives one instance's focus lifecycle against both.
//!
//! The registries are plain values; the owner decides how they are shared
//! (the modal engine keeps one [`FocusEnvironment`] per document behind a
//! `RefCell`).

pub mod coordinator;
pub mod focus_search;
pub mod inert;
pub mod scroll_lock;

pub use coordinator::{FocusCoordinator, FocusPhase};
pub use focus_search::{AUTOFOCUS_ATTR, default_focus_target, first_focusable};
pub use inert::{ARIA_HIDDEN_ATTR, INERT_ATTR, InertRegistry};
pub use scroll_lock::ScrollLock;

/// Document-wide accessibility state.
#[derive(Debug, Default)]
pub struct FocusEnvironment {
    pub inert: InertRegistry,
    pub scroll: ScrollLock,
}

impl FocusEnvironment {
    pub fn new() -> Self {
        Self::default()
    }
}
