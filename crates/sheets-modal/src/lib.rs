#![forbid(unsafe_code)]

//! Sheet stack engine.
//!
//! A [`ModalInstance`] owns an ordered stack of [`Sheet`]s rendered inside a
//! host shell (container, overlay, sheets host). Control operations are
//! async and settle when the CSS transition they trigger has ended, which
//! the host reports through [`ModalInstance::dispatch`].
//!
//! # Example
//!
//! ```
//! use futures::executor::block_on;
//! use sheets_core::{Dom, MemoryDom, NodeId};
//! use sheets_modal::{AnimationConfig, CallOptions, Content, ModalConfig, ModalInstance, Sheet, Stage};
//!
//! let stage = Stage::new(MemoryDom::new());
//! let config = ModalConfig::default().animation(AnimationConfig::off());
//! fn render(dom: &mut dyn Dom, host: NodeId, _sheet: &Sheet) -> Option<NodeId> {
//!     let element = dom.create_element("section");
//!     dom.append_child(host, element);
//!     Some(element)
//! }
//! let modal = ModalInstance::new(&stage, config, render);
//!
//! block_on(modal.push(Content::from("settings"), CallOptions::new())).unwrap();
//! assert!(modal.is_open());
//! ```

pub mod config;
pub mod content;
pub mod drag;
pub mod instance;
pub mod renderer;
pub mod stack;
pub mod stage;
pub mod transition;

pub use config::{
    AnimationConfig, AnimationKind, BottomSheetDragConfig, ConfigError, DEFAULT_STACK_SIZE,
    ModalAction, ModalConfig, ModalKind, ModalPosition, UnknownAction,
};
pub use content::Content;
pub use drag::{BottomSheetDrag, DragOutcome, OFFSET_PROPERTY};
pub use instance::{ModalInstance, Shell};
pub use renderer::{DeferredRenderer, SheetRenderer};
pub use stack::{Sheet, SheetId, SheetStack};
pub use stage::Stage;
pub use transition::{AnimationOverride, CallOptions, TransitionResolver, run_transition};
