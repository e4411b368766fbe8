#![forbid(unsafe_code)]

//! Per-instance focus state machine.
//!
//! State machine: `Closed → Opening → Open → Closing → Closed`
//!
//! | Transition | Effect |
//! |------------|--------|
//! | `begin_opening` | Save active element, mark container siblings non-interactive, lock page scroll (skipped when blocked) |
//! | `opened` | Un-mark the active sheet, mark the others, focus into the active sheet |
//! | `activate_sheet` | Same sheet-level effect while staying open |
//! | `begin_closing` | Park focus on the container so key presses no longer reach the disappearing sheet |
//! | `closed` | Release every tag this instance placed, release scroll lock, restore saved focus |
//!
//! # Invariants
//!
//! 1. `closed` is idempotent: a second invocation (unmount racing the close
//!    transition) does nothing.
//! 2. A blocked instance (its container sits inside a non-interactive region
//!    at open time) never saves or restores focus, never tags siblings, and
//!    never takes the scroll lock.
//! 3. Focus restoration only targets an element that is still connected.

use sheets_core::{Dom, InstanceId, NodeId};

use crate::FocusEnvironment;
use crate::focus_search::{default_focus_target, first_focusable};

/// Phase of an instance's focus lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusPhase {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

impl FocusPhase {
    /// Whether the instance is visible in any form.
    #[inline]
    pub fn is_visible(self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// Focus bookkeeping for one overlay instance.
#[derive(Debug)]
pub struct FocusCoordinator {
    instance: InstanceId,
    phase: FocusPhase,
    previous_active: Option<NodeId>,
    blocked: bool,
}

impl FocusCoordinator {
    pub fn new(instance: InstanceId) -> Self {
        Self {
            instance,
            phase: FocusPhase::Closed,
            previous_active: None,
            blocked: false,
        }
    }

    #[inline]
    pub fn phase(&self) -> FocusPhase {
        self.phase
    }

    /// Whether another overlay was blocking this one when it opened.
    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Element focused before the instance opened.
    pub fn previous_active(&self) -> Option<NodeId> {
        self.previous_active
    }

    /// Whether focus changes outside the active sheet should be redirected.
    pub fn intercepts_focus(&self) -> bool {
        self.phase == FocusPhase::Open && !self.blocked
    }

    /// `Closed → Opening`.
    ///
    /// The blocking check runs here, synchronously, because other instances
    /// may be opening in overlapping animation windows.
    pub fn begin_opening(&mut self, dom: &mut dyn Dom, env: &mut FocusEnvironment, container: NodeId) {
        if self.phase.is_visible() {
            self.phase = FocusPhase::Opening;
            return;
        }
        env.inert.register_owner(container, self.instance);
        env.inert.raise(dom, self.instance);
        self.blocked = env.inert.is_inert(dom, container);
        self.phase = FocusPhase::Opening;

        if self.blocked {
            tracing::debug!(
                target: "sheets.focus",
                instance = %self.instance,
                "opening inside a non-interactive region; focus left untouched"
            );
            return;
        }

        self.previous_active = dom.active_element();
        let root = dom.document_root();
        let mut cursor = container;
        while cursor != root {
            let Some(parent) = dom.parent(cursor) else {
                break;
            };
            for sibling in dom.children(parent) {
                if sibling != cursor && !env.inert.is_tagged_by(sibling, self.instance) {
                    env.inert.mark(dom, sibling, self.instance);
                }
            }
            cursor = parent;
        }
        env.scroll.acquire(dom, self.instance);
    }

    /// `Opening → Open`, then focus into `active`.
    pub fn opened(
        &mut self,
        dom: &mut dyn Dom,
        env: &mut FocusEnvironment,
        active: NodeId,
        others: &[NodeId],
        remembered: Option<NodeId>,
    ) -> Option<NodeId> {
        self.phase = FocusPhase::Open;
        self.activate_sheet(dom, env, active, others, remembered)
    }

    /// Make `active` the interactive sheet and move focus into it.
    ///
    /// Focus preference: `remembered` (if still inside the sheet), then the
    /// default-focus target, then the first focusable descendant. Returns the
    /// element that received focus.
    pub fn activate_sheet(
        &mut self,
        dom: &mut dyn Dom,
        env: &mut FocusEnvironment,
        active: NodeId,
        others: &[NodeId],
        remembered: Option<NodeId>,
    ) -> Option<NodeId> {
        while env.inert.unmark(dom, active, self.instance) {}
        for &other in others {
            if other != active && !env.inert.is_tagged_by(other, self.instance) {
                env.inert.mark(dom, other, self.instance);
            }
        }
        if self.blocked {
            return None;
        }

        let candidates = [
            remembered.filter(|&r| r != active && dom.contains(active, r)),
            default_focus_target(dom, active),
            first_focusable(dom, active),
        ];
        for candidate in candidates.into_iter().flatten() {
            if dom.focus(candidate) {
                tracing::debug!(
                    target: "sheets.focus",
                    instance = %self.instance,
                    node = candidate.get(),
                    "focused sheet element"
                );
                return Some(candidate);
            }
        }
        None
    }

    /// Focus the first element of `active` if focus sits outside it.
    ///
    /// Returns the element focus was redirected to.
    pub fn contain_focus(
        &self,
        dom: &mut dyn Dom,
        active: NodeId,
        target: NodeId,
        remembered: Option<NodeId>,
    ) -> Option<NodeId> {
        if !self.intercepts_focus() || dom.contains(active, target) {
            return None;
        }
        let candidates = [
            remembered.filter(|&r| r != active && dom.contains(active, r)),
            default_focus_target(dom, active),
            first_focusable(dom, active),
        ];
        candidates
            .into_iter()
            .flatten()
            .find(|&candidate| dom.focus(candidate))
    }

    /// `Open → Closing`.
    pub fn begin_closing(&mut self, dom: &mut dyn Dom, container: NodeId) {
        if self.phase == FocusPhase::Closed {
            return;
        }
        self.phase = FocusPhase::Closing;
        if !self.blocked {
            dom.focus(container);
        }
    }

    /// `* → Closed`. Returns `false` if the instance was already closed.
    pub fn closed(&mut self, dom: &mut dyn Dom, env: &mut FocusEnvironment) -> bool {
        if self.phase == FocusPhase::Closed {
            return false;
        }
        self.phase = FocusPhase::Closed;

        let released = env.inert.release_all(dom, self.instance);
        env.inert.lower(dom, self.instance);
        env.scroll.release(dom, self.instance);

        if let Some(previous) = self.previous_active.take()
            && !self.blocked
            && dom.is_connected(previous)
        {
            dom.focus(previous);
        }
        tracing::debug!(
            target: "sheets.focus",
            instance = %self.instance,
            released,
            "focus coordinator closed"
        );
        self.blocked = false;
        true
    }
}
