#![forbid(unsafe_code)]

//! Host-driven runtime.
//!
//! [`ModalRuntime`] owns the shared [`Stage`], a single-threaded executor,
//! the call queue and the key registry. The host drives it explicitly:
//!
//! - [`ModalRuntime::dispatch`] delivers a host event (transition end,
//!   focus, key, click, pointer) and runs whatever became ready.
//! - [`ModalRuntime::advance`] moves timer time forward (call gaps,
//!   animation pause timeouts) and runs whatever became ready.
//! - [`ModalRuntime::run_until_stalled`] runs ready work without new input.
//!
//! Nothing runs in the background; between host calls the runtime is inert.

use std::cell::RefCell;
use std::time::Duration;

use futures::executor::LocalPool;
use sheets_core::{Clock, Dom, DomEvent, ModalError, NodeId, Timers};
use sheets_modal::{
    CallOptions, ConfigError, ModalAction, ModalConfig, ModalInstance, SheetRenderer, Stage,
};

use crate::config::RuntimeConfig;
use crate::handle::ModalHandle;
use crate::queue::CallQueue;
use crate::registry::{DEFAULT_KEY, ModalRegistry};

/// Registry, call queue and executor for one document.
pub struct ModalRuntime {
    stage: Stage,
    pool: RefCell<LocalPool>,
    queue: CallQueue,
    registry: RefCell<ModalRegistry>,
}

impl std::fmt::Debug for ModalRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalRuntime")
            .field("keys", &self.keys())
            .field("queue", &self.queue)
            .field("now", &self.now())
            .finish()
    }
}

impl ModalRuntime {
    pub fn new(dom: impl Dom + 'static, config: RuntimeConfig) -> Self {
        let timers = Timers::new();
        let stage = Stage::with_timers(dom, timers.clone());
        let pool = LocalPool::new();
        let queue = CallQueue::new(pool.spawner(), timers, config);
        Self {
            stage,
            pool: RefCell::new(pool),
            queue,
            registry: RefCell::new(ModalRegistry::new()),
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn config(&self) -> RuntimeConfig {
        self.queue.config()
    }

    /// Run `f` with the host tree.
    pub fn with_dom<R>(&self, f: impl FnOnce(&mut dyn Dom) -> R) -> R {
        self.stage.with_dom(f)
    }

    // --- Binding ---

    /// Bind a new instance to `key`, replacing (and tearing down) any
    /// instance bound before.
    pub fn bind(
        &self,
        key: &str,
        config: ModalConfig,
        renderer: impl SheetRenderer + 'static,
    ) -> Result<ModalHandle, ConfigError> {
        let config = config.validated()?;
        let slot = self.registry.borrow_mut().slot(key);
        let instance = ModalInstance::new(&self.stage, config, renderer);
        tracing::debug!(target: "sheets.queue", key, instance = %instance.id(), "modal bound");
        if let Some(previous) = slot.replace(instance) {
            tracing::debug!(
                target: "sheets.queue",
                key,
                instance = %previous.id(),
                "replaced bound modal"
            );
            previous.teardown();
            self.run_until_stalled();
        }
        Ok(ModalHandle::new(key, slot, self.queue.clone()))
    }

    /// Tear down the instance bound to `key`. Returns whether one was bound.
    pub fn unbind(&self, key: &str) -> bool {
        let taken = {
            let mut registry = self.registry.borrow_mut();
            let taken = registry.is_bound(key).then(|| registry.slot(key).take());
            registry.prune();
            taken.flatten()
        };
        let Some(instance) = taken else {
            return false;
        };
        instance.teardown();
        tracing::debug!(target: "sheets.queue", key, instance = %instance.id(), "modal unbound");
        self.run_until_stalled();
        self.registry.borrow_mut().prune();
        true
    }

    /// Queued facade for `key`. Works whether or not `key` is bound yet.
    pub fn get_modal(&self, key: &str) -> ModalHandle {
        let slot = {
            let mut registry = self.registry.borrow_mut();
            registry.prune();
            registry.slot(key)
        };
        ModalHandle::new(key, slot, self.queue.clone())
    }

    /// Facade for [`DEFAULT_KEY`].
    pub fn default_modal(&self) -> ModalHandle {
        self.get_modal(DEFAULT_KEY)
    }

    /// The instance bound to `key`.
    pub fn instance(&self, key: &str) -> Option<ModalInstance> {
        self.registry.borrow().get(key)
    }

    /// Bound keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.registry.borrow().keys()
    }

    /// Keys the registry tracks: bound ones plus unbound ones a live
    /// handle still refers to.
    pub fn slot_count(&self) -> usize {
        self.registry.borrow().len()
    }

    // --- Errors ---

    /// Deliver failures of queued calls to `handler` instead of the caller.
    pub fn set_error_handler(&self, handler: impl Fn(&ModalError) + 'static) {
        self.queue.set_error_handler(handler);
    }

    pub fn clear_error_handler(&self) -> bool {
        self.queue.clear_error_handler()
    }

    // --- Driving ---

    /// Deliver a host event to every bound instance.
    ///
    /// Input actions (Escape, overlay click, closing drag) are queued like
    /// any other call; callback actions run immediately. Returns the number
    /// of actions triggered.
    pub fn dispatch(&self, event: &DomEvent) -> usize {
        let bound = self.registry.borrow().bound();
        let mut triggered = 0;
        for (key, instance) in bound {
            if let Some(action) = instance.dispatch(event) {
                triggered += 1;
                self.perform(&key, action);
            }
        }
        self.run_until_stalled();
        triggered
    }

    /// Advance timer time by `dt` and run what became ready.
    pub fn advance(&self, dt: Duration) {
        let timers = self.stage.timers();
        timers.advance_to(timers.now().saturating_add(dt));
        self.run_until_stalled();
    }

    /// Advance timer time to `clock`'s reading.
    pub fn sync_clock(&self, clock: &dyn Clock) {
        self.stage.timers().advance_to(clock.now());
        self.run_until_stalled();
    }

    pub fn now(&self) -> Duration {
        self.stage.timers().now()
    }

    /// Run every task that can make progress.
    pub fn run_until_stalled(&self) {
        match self.pool.try_borrow_mut() {
            Ok(mut pool) => pool.run_until_stalled(),
            Err(_) => {
                tracing::trace!(target: "sheets.queue", "re-entrant run ignored");
            }
        }
    }

    /// Whether no queued call is waiting or running.
    pub fn is_idle(&self) -> bool {
        self.queue.is_idle()
    }

    /// Elements whose transition any bound instance is waiting for.
    pub fn pending_transitions(&self) -> Vec<NodeId> {
        self.registry
            .borrow()
            .bound()
            .into_iter()
            .flat_map(|(_, instance)| instance.pending_transitions())
            .collect()
    }

    fn perform(&self, key: &str, action: ModalAction) {
        tracing::debug!(target: "sheets.queue", key, action = action.name(), "input action");
        let handle = self.get_modal(key);
        let options = CallOptions::new();
        match action {
            ModalAction::None => {}
            ModalAction::Pop => {
                let _ = handle.pop(options);
            }
            ModalAction::Empty => {
                let _ = handle.empty(options);
            }
            ModalAction::Hide => {
                let _ = handle.hide(options);
            }
            ModalAction::Back => {
                let _ = handle.back(options);
            }
            ModalAction::Next => {
                let _ = handle.next(options);
            }
            ModalAction::Callback(callback) => callback(),
        }
    }
}
