#![forbid(unsafe_code)]

//! Stacked overlay engine.
//!
//! `sheets` presents modal content as a stack of *sheets* inside one overlay
//! host: a floating dialog, a full page or a draggable bottom sheet. Control
//! calls are serialized and settle once the host reports that the CSS
//! transition they started has ended. While an overlay is open the rest of
//! the document is non-interactive and focus stays inside the active sheet.
//!
//! # Crates
//!
//! | Crate | Provides |
//! |-------|----------|
//! | [`host`] | `Dom` host abstraction, events, timers, pending results, errors |
//! | [`a11y`] | Non-interactive marking, scroll lock, focus coordination |
//! | [`modal`] | Sheet stack, transitions, instance engine, drag |
//! | [`runtime`] | Key registry, call queue, host-driven runtime |
//!
//! # Example
//!
//! ```
//! use sheets::prelude::*;
//!
//! fn render(dom: &mut dyn Dom, host: NodeId, _sheet: &Sheet) -> Option<NodeId> {
//!     let element = dom.create_element("section");
//!     dom.append_child(host, element);
//!     Some(element)
//! }
//!
//! let runtime = ModalRuntime::new(MemoryDom::new(), RuntimeConfig::default());
//! let modal = runtime.bind(DEFAULT_KEY, ModalConfig::default(), render).unwrap();
//!
//! let mut pushed = modal.push("settings", CallOptions::new());
//! runtime.run_until_stalled();
//! assert!(pushed.try_take().is_none()); // waiting for the overlay transition
//!
//! for target in runtime.pending_transitions() {
//!     runtime.dispatch(&DomEvent::TransitionEnd { target });
//! }
//! assert!(pushed.try_take().unwrap().is_ok());
//! ```

pub use sheets_a11y as a11y;
pub use sheets_core as host;
pub use sheets_modal as modal;
pub use sheets_runtime as runtime;

pub use sheets_core::{
    Direction, Dom, DomEvent, ErrorKind, Key, MemoryDom, ModalError, NodeId, Pending, Result,
};
pub use sheets_modal::{
    AnimationConfig, AnimationKind, BottomSheetDragConfig, CallOptions, ConfigError, Content,
    ModalAction, ModalConfig, ModalInstance, ModalKind, ModalPosition, Sheet, SheetId,
    SheetRenderer,
};
pub use sheets_runtime::{
    AnimationHandle, DEFAULT_KEY, ModalHandle, ModalRuntime, QueueScope, RuntimeConfig,
};

/// Everything a host embedding needs.
pub mod prelude {
    pub use sheets_core::{
        Clock, DeterministicClock, Dom, DomEvent, Key, MemoryDom, ModalError, NodeId, Pending,
        PointerEvent, PointerPhase, WebClock,
    };
    pub use sheets_modal::{
        AnimationConfig, AnimationKind, BottomSheetDragConfig, CallOptions, Content, ModalAction,
        ModalConfig, ModalKind, ModalPosition, Sheet, SheetRenderer,
    };
    pub use sheets_runtime::{DEFAULT_KEY, ModalHandle, ModalRuntime, QueueScope, RuntimeConfig};
}
