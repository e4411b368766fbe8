#![forbid(unsafe_code)]

//! Control facades.
//!
//! A [`ModalHandle`] never holds an instance. Each method queues a job that
//! reads the key's [`ModalRef`] when it runs, so a handle obtained before
//! binding (or across a rebind) always reaches the instance that is live at
//! execution time. An unbound key rejects asynchronously with
//! [`ModalError::Unbound`]; no method fails synchronously.

use std::future::Future;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use sheets_core::{ModalError, Pending, Result};
use sheets_modal::{AnimationKind, CallOptions, Content, ModalInstance, Sheet};

use crate::queue::CallQueue;
use crate::registry::ModalRef;

/// Queued control surface of one key.
#[derive(Clone, Debug)]
pub struct ModalHandle {
    key: String,
    slot: ModalRef,
    queue: CallQueue,
}

impl ModalHandle {
    pub(crate) fn new(key: impl Into<String>, slot: ModalRef, queue: CallQueue) -> Self {
        Self {
            key: key.into(),
            slot,
            queue,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether an instance is bound right now.
    pub fn is_bound(&self) -> bool {
        self.slot.is_bound()
    }

    /// The instance bound right now, bypassing the queue.
    pub fn instance(&self) -> Option<ModalInstance> {
        self.slot.get()
    }

    pub fn push(&self, content: impl Into<Content>, options: CallOptions) -> Pending<Sheet> {
        let content = content.into();
        self.call(move |m| async move { m.push(content, options).await })
    }

    pub fn transit(&self, content: impl Into<Content>, options: CallOptions) -> Pending<Sheet> {
        let content = content.into();
        self.call(move |m| async move { m.transit(content, options).await })
    }

    pub fn pop(&self, options: CallOptions) -> Pending<Sheet> {
        self.call(move |m| async move { m.pop(options).await })
    }

    pub fn empty(&self, options: CallOptions) -> Pending<Vec<Sheet>> {
        self.call(move |m| async move { m.empty(options).await })
    }

    pub fn next(&self, options: CallOptions) -> Pending<Sheet> {
        self.call(move |m| async move { m.next(options).await })
    }

    pub fn back(&self, options: CallOptions) -> Pending<Sheet> {
        self.call(move |m| async move { m.back(options).await })
    }

    pub fn hide(&self, options: CallOptions) -> Pending<()> {
        self.call(move |m| async move { m.hide(options).await })
    }

    pub fn show(&self, content: Option<Content>, options: CallOptions) -> Pending<Sheet> {
        self.call(move |m| async move { m.show(content, options).await })
    }

    /// Animation controls of this key.
    pub fn animation(&self) -> AnimationHandle {
        AnimationHandle {
            key: self.key.clone(),
            slot: self.slot.clone(),
            queue: self.queue.clone(),
        }
    }

    fn call<T, F, Fut>(&self, op: F) -> Pending<T>
    where
        T: 'static,
        F: FnOnce(ModalInstance) -> Fut + 'static,
        Fut: Future<Output = Result<T>> + 'static,
    {
        let slot = self.slot.clone();
        let key = self.key.clone();
        self.queue
            .enqueue(&self.key, move || -> LocalBoxFuture<'static, Result<T>> {
                match slot.get() {
                    Some(instance) => op(instance).boxed_local(),
                    None => future::ready(Err(ModalError::unbound(key))).boxed_local(),
                }
            })
    }
}

/// Animation settings of one key.
///
/// Getters and setters apply immediately. `pause`/`resume` apply after an
/// optional timeout measured on the runtime's timers; they do not go
/// through the call queue.
#[derive(Clone, Debug)]
pub struct AnimationHandle {
    key: String,
    slot: ModalRef,
    queue: CallQueue,
}

impl AnimationHandle {
    fn instance(&self) -> Result<ModalInstance> {
        self.slot
            .get()
            .ok_or_else(|| ModalError::unbound(self.key.clone()))
    }

    pub fn disabled(&self) -> Result<bool> {
        Ok(self.instance()?.animation_disabled())
    }

    pub fn set_disabled(&self, disabled: bool) -> Result<()> {
        self.instance()?.set_animation_disabled(disabled);
        Ok(())
    }

    pub fn kind(&self) -> Result<AnimationKind> {
        Ok(self.instance()?.animation_kind())
    }

    pub fn set_kind(&self, kind: AnimationKind) -> Result<()> {
        self.instance()?.set_animation_kind(kind);
        Ok(())
    }

    pub fn is_paused(&self) -> Result<bool> {
        Ok(self.instance()?.is_animation_paused())
    }

    /// Pause running animations, after `timeout` if given.
    pub fn pause(&self, timeout: Option<Duration>) -> Pending<()> {
        self.set_paused_after(true, timeout)
    }

    /// Resume paused animations, after `timeout` if given.
    pub fn resume(&self, timeout: Option<Duration>) -> Pending<()> {
        self.set_paused_after(false, timeout)
    }

    fn set_paused_after(&self, paused: bool, timeout: Option<Duration>) -> Pending<()> {
        let slot = self.slot.clone();
        let key = self.key.clone();
        self.queue
            .schedule(timeout.unwrap_or(Duration::ZERO), move || {
                let instance = slot.get().ok_or_else(|| ModalError::unbound(key))?;
                instance.set_animation_paused(paused);
                tracing::debug!(
                    target: "sheets.queue",
                    instance = %instance.id(),
                    paused,
                    "animation pause toggled"
                );
                Ok(())
            })
    }
}
