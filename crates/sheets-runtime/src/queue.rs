#![forbid(unsafe_code)]

//! Serialized call lanes.
//!
//! Every control call is a job appended to a lane. A lane runs one job at a
//! time on the runtime's local executor: a job starts only after the
//! previous job's future (and therefore its transition) has completed, and
//! at least [`RuntimeConfig::call_gap`] after it finished.
//!
//! # Invariants
//!
//! 1. Jobs of one lane start in enqueue order and never overlap.
//! 2. A failing job never stops its lane; the next job runs as usual.
//! 3. A failure reaches either the installed error handler (the caller then
//!    sees [`ModalError::Handled`]) or the caller, never both. Without a
//!    handler the failure is also logged at `warn`.
//!
//! # Failure Modes
//!
//! - A job whose transition never ends blocks its lane indefinitely.
//! - If the executor is gone, queued jobs are dropped and their callers see
//!   [`ModalError::Abandoned`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Duration;

use ahash::AHashMap;
use futures::executor::LocalSpawner;
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use sheets_core::{ModalError, Pending, Result, Timers};

use crate::config::{QueueScope, RuntimeConfig};

/// Receives failures of queued calls.
pub type ErrorHandler = Rc<dyn Fn(&ModalError)>;

type Job = Box<dyn FnOnce() -> LocalBoxFuture<'static, ()>>;

const GLOBAL_LANE: &str = "global";

#[derive(Default)]
struct Lane {
    jobs: VecDeque<Job>,
    running: bool,
    last_finished: Option<Duration>,
}

struct QueueInner {
    spawner: LocalSpawner,
    timers: Timers,
    config: RuntimeConfig,
    lanes: RefCell<AHashMap<String, Lane>>,
    handler: RefCell<Option<ErrorHandler>>,
}

/// Handle to the call lanes of one runtime. Clones share lanes.
#[derive(Clone)]
pub struct CallQueue {
    inner: Rc<QueueInner>,
}

impl std::fmt::Debug for CallQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallQueue")
            .field("config", &self.inner.config)
            .field("queued", &self.queued())
            .field("has_error_handler", &self.has_error_handler())
            .finish()
    }
}

impl CallQueue {
    pub fn new(spawner: LocalSpawner, timers: Timers, config: RuntimeConfig) -> Self {
        Self {
            inner: Rc::new(QueueInner {
                spawner,
                timers,
                config,
                lanes: RefCell::new(AHashMap::new()),
                handler: RefCell::new(None),
            }),
        }
    }

    pub fn config(&self) -> RuntimeConfig {
        self.inner.config
    }

    pub fn timers(&self) -> &Timers {
        &self.inner.timers
    }

    // --- Error handler ---

    /// Route failures of queued calls to `handler`.
    pub fn set_error_handler(&self, handler: impl Fn(&ModalError) + 'static) {
        *self.inner.handler.borrow_mut() = Some(Rc::new(handler));
    }

    /// Remove the error handler. Returns whether one was installed.
    pub fn clear_error_handler(&self) -> bool {
        self.inner.handler.borrow_mut().take().is_some()
    }

    pub fn has_error_handler(&self) -> bool {
        self.inner.handler.borrow().is_some()
    }

    // --- Lanes ---

    /// Jobs waiting to start, across all lanes.
    pub fn queued(&self) -> usize {
        self.inner.lanes.borrow().values().map(|l| l.jobs.len()).sum()
    }

    /// Whether no lane has a job queued or running.
    pub fn is_idle(&self) -> bool {
        self.inner.lanes.borrow().values().all(|l| !l.running)
    }

    /// Lanes currently tracked, idle ones included until pruned.
    pub fn lane_count(&self) -> usize {
        self.inner.lanes.borrow().len()
    }

    /// Forget lanes that are stopped, empty and past their call gap. Such a
    /// lane would start its next job immediately, same as a fresh one.
    fn prune_idle_lanes(&self) {
        let now = self.inner.timers.now();
        let gap = self.inner.config.call_gap;
        self.inner.lanes.borrow_mut().retain(|_, lane| {
            lane.running
                || !lane.jobs.is_empty()
                || lane.last_finished.is_some_and(|last| last.saturating_add(gap) > now)
        });
    }

    fn lane_for(&self, key: &str) -> String {
        match self.inner.config.queue_scope {
            QueueScope::Global => GLOBAL_LANE.to_owned(),
            QueueScope::PerKey => key.to_owned(),
        }
    }

    /// Append a call for `key`.
    ///
    /// `op` is invoked only when the call reaches the front of its lane, so
    /// whatever it looks up is resolved at execution time.
    pub fn enqueue<T: 'static>(
        &self,
        key: &str,
        op: impl FnOnce() -> LocalBoxFuture<'static, Result<T>> + 'static,
    ) -> Pending<T> {
        let (resolver, pending) = Pending::channel();
        let queue = Rc::downgrade(&self.inner);
        let call_key = key.to_owned();
        let job: Job = Box::new(move || -> LocalBoxFuture<'static, ()> {
            Box::pin(async move {
                let outcome = match op().await {
                    Ok(value) => Ok(value),
                    Err(error) => Err(match queue.upgrade() {
                        Some(inner) => report(&inner, &call_key, error),
                        None => error,
                    }),
                };
                resolver.settle(outcome);
            })
        });

        let lane = self.lane_for(key);
        self.prune_idle_lanes();
        let start = {
            let mut lanes = self.inner.lanes.borrow_mut();
            let entry = lanes.entry(lane.clone()).or_default();
            entry.jobs.push_back(job);
            tracing::trace!(
                target: "sheets.queue",
                key,
                lane = lane.as_str(),
                queued = entry.jobs.len(),
                "call queued"
            );
            !std::mem::replace(&mut entry.running, true)
        };
        if start {
            self.start_lane(lane);
        }
        pending
    }

    /// Run `f` after `delay` of timer time, outside any lane.
    pub fn schedule<T: 'static>(
        &self,
        delay: Duration,
        f: impl FnOnce() -> Result<T> + 'static,
    ) -> Pending<T> {
        if delay.is_zero() {
            return Pending::settled(f());
        }
        let (resolver, pending) = Pending::channel();
        let sleep = self.inner.timers.sleep(delay);
        let spawned = self.inner.spawner.spawn_local(async move {
            sleep.await;
            resolver.settle(f());
        });
        if let Err(error) = spawned {
            tracing::warn!(target: "sheets.queue", %error, "executor gone; scheduled call dropped");
        }
        pending
    }

    fn start_lane(&self, lane: String) {
        let driver = drive(Rc::downgrade(&self.inner), lane.clone());
        if let Err(error) = self.inner.spawner.spawn_local(driver) {
            tracing::warn!(
                target: "sheets.queue",
                lane = lane.as_str(),
                %error,
                "executor gone; dropping queued calls"
            );
            if let Some(entry) = self.inner.lanes.borrow_mut().get_mut(&lane) {
                entry.jobs.clear();
                entry.running = false;
            }
        }
    }
}

fn report(inner: &QueueInner, key: &str, error: ModalError) -> ModalError {
    let handler = inner.handler.borrow().clone();
    match handler {
        Some(handler) => {
            tracing::debug!(
                target: "sheets.queue",
                key,
                %error,
                "queued call failed; delivered to error handler"
            );
            handler(&error);
            ModalError::Handled
        }
        None => {
            tracing::warn!(target: "sheets.queue", key, %error, "queued call failed");
            error
        }
    }
}

/// Lane driver: runs jobs until the lane is empty.
async fn drive(queue: Weak<QueueInner>, lane: String) {
    loop {
        let Some(inner) = queue.upgrade() else {
            return;
        };
        let next = {
            let mut lanes = inner.lanes.borrow_mut();
            let Some(entry) = lanes.get_mut(&lane) else {
                return;
            };
            match entry.jobs.pop_front() {
                Some(job) => (job, entry.last_finished),
                None => {
                    entry.running = false;
                    return;
                }
            }
        };
        let (job, last_finished) = next;
        let timers = inner.timers.clone();
        let gap = inner.config.call_gap;
        drop(inner);

        if let Some(last) = last_finished {
            let ready_at = last.saturating_add(gap);
            if timers.now() < ready_at {
                timers.sleep_until(ready_at).await;
            }
        }
        job().await;

        if let Some(inner) = queue.upgrade()
            && let Some(entry) = inner.lanes.borrow_mut().get_mut(&lane)
        {
            entry.last_finished = Some(timers.now());
        }
    }
}
