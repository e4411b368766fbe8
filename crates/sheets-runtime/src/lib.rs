#![forbid(unsafe_code)]

//! Instance registry and call queue.
//!
//! Binds string keys to [`ModalInstance`](sheets_modal::ModalInstance)s and
//! serializes every control call through [`CallQueue`] lanes, so a call
//! never starts mutating the document before the previous call's
//! transition has resolved.

pub mod config;
pub mod handle;
pub mod queue;
pub mod registry;
pub mod runtime;

pub use config::{DEFAULT_CALL_GAP, QueueScope, RuntimeConfig};
pub use handle::{AnimationHandle, ModalHandle};
pub use queue::{CallQueue, ErrorHandler};
pub use registry::{DEFAULT_KEY, ModalRef, ModalRegistry};
pub use runtime::ModalRuntime;
