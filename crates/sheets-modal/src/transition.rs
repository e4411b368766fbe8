#![forbid(unsafe_code)]

//! Transition resolver.
//!
//! A state change that starts a CSS transition is wrapped in a
//! [`Pending<()>`] that settles when the host reports the end (or
//! cancellation) of that element's transition.
//!
//! # Invariants
//!
//! 1. The listener is registered *before* the trigger runs, so a transition
//!    finishing synchronously inside the trigger is never missed.
//! 2. Only events whose target is exactly the observed element resolve it.
//!    Bubbled events from descendants are ignored.
//! 3. Each listener resolves exactly once, even if both `transitionend` and
//!    `transitioncancel` fire.
//! 4. With animation disabled the trigger still runs, and the returned
//!    pending result is already settled.
//!
//! # Failure Modes
//!
//! - A transition that never reports completion leaves its pending result
//!   unsettled forever. There is deliberately no timeout.
//! - [`TransitionResolver::abandon_all`] drops every listener; awaiting
//!   operations observe [`ModalError::Abandoned`](sheets_core::ModalError).

use sheets_core::{Dom, DomEvent, NodeId, Pending, Resolver};

use crate::config::{AnimationConfig, AnimationKind};

/// Per-call animation override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationOverride {
    /// Animate even if the instance has animation disabled.
    Enabled,
    /// Skip transition listening for this call.
    Disabled,
    /// Animate with a specific kind for this call.
    Kind(AnimationKind),
}

/// Options accepted by every control call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    pub animation: Option<AnimationOverride>,
    /// After the push settles, also remove the sheet that was on top before.
    pub pop_last: bool,
    /// Host attributes applied to a pushed sheet's element.
    pub attributes: Vec<(String, String)>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with animation switched off for the call.
    pub fn instant() -> Self {
        Self::new().animated(false)
    }

    /// Force animation on or off for this call.
    pub fn animated(mut self, animate: bool) -> Self {
        self.animation = Some(if animate {
            AnimationOverride::Enabled
        } else {
            AnimationOverride::Disabled
        });
        self
    }

    /// Animate this call with `kind`.
    pub fn animation_kind(mut self, kind: AnimationKind) -> Self {
        self.animation = Some(AnimationOverride::Kind(kind));
        self
    }

    pub fn pop_last(mut self, pop_last: bool) -> Self {
        self.pop_last = pop_last;
        self
    }

    /// Add a host attribute for the pushed sheet.
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Whether this call waits for a transition.
    ///
    /// A per-call override wins over the instance setting.
    pub fn animates(&self, config: &AnimationConfig) -> bool {
        match self.animation {
            Some(AnimationOverride::Enabled | AnimationOverride::Kind(_)) => true,
            Some(AnimationOverride::Disabled) => false,
            None => !config.disabled,
        }
    }

    /// Animation kind in effect for this call.
    pub fn kind(&self, config: &AnimationConfig) -> AnimationKind {
        match self.animation {
            Some(AnimationOverride::Kind(kind)) => kind,
            _ => config.kind,
        }
    }
}

#[derive(Debug)]
struct Listener {
    element: NodeId,
    resolver: Resolver<()>,
}

/// Transition listeners of one instance.
#[derive(Debug, Default)]
pub struct TransitionResolver {
    listeners: Vec<Listener>,
}

impl TransitionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start listening for the end of `element`'s transition.
    pub fn observe(&mut self, element: NodeId) -> Pending<()> {
        let (resolver, pending) = Pending::channel();
        self.listeners.push(Listener { element, resolver });
        tracing::debug!(
            target: "sheets.stack",
            element = element.get(),
            "awaiting transition"
        );
        pending
    }

    /// Route a host event. Returns `true` if it resolved a transition.
    pub fn handle(&mut self, event: &DomEvent) -> bool {
        let (DomEvent::TransitionEnd { target } | DomEvent::TransitionCancel { target }) = *event
        else {
            return false;
        };
        if !self.is_observing(target) {
            if !self.listeners.is_empty() {
                tracing::trace!(
                    target: "sheets.stack",
                    node = target.get(),
                    "ignoring transition event from unobserved node"
                );
            }
            return false;
        }
        let (done, rest): (Vec<Listener>, Vec<Listener>) = std::mem::take(&mut self.listeners)
            .into_iter()
            .partition(|l| l.element == target);
        self.listeners = rest;
        for listener in done {
            listener.resolver.resolve(());
        }
        tracing::debug!(
            target: "sheets.stack",
            element = target.get(),
            canceled = matches!(event, DomEvent::TransitionCancel { .. }),
            "transition resolved"
        );
        true
    }

    pub fn is_observing(&self, element: NodeId) -> bool {
        self.listeners.iter().any(|l| l.element == element)
    }

    /// Elements with an unresolved transition, in registration order.
    pub fn pending_elements(&self) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = Vec::with_capacity(self.listeners.len());
        for listener in &self.listeners {
            if !out.contains(&listener.element) {
                out.push(listener.element);
            }
        }
        out
    }

    /// Drop every listener. Returns how many were dropped.
    pub fn abandon_all(&mut self) -> usize {
        let dropped = self.listeners.len();
        self.listeners.clear();
        dropped
    }
}

/// Apply `trigger` and return a pending result for `element`'s transition.
///
/// With `animate == false` the result is already settled.
pub fn run_transition(
    dom: &mut dyn Dom,
    resolver: &mut TransitionResolver,
    element: NodeId,
    animate: bool,
    trigger: impl FnOnce(&mut dyn Dom),
) -> Pending<()> {
    if !animate {
        trigger(dom);
        return Pending::ready(());
    }
    let pending = resolver.observe(element);
    trigger(dom);
    pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheets_core::{MemoryDom, ModalError};

    fn end(target: NodeId) -> DomEvent {
        DomEvent::TransitionEnd { target }
    }

    #[test]
    fn disabled_resolves_immediately_and_still_triggers() {
        let mut dom = MemoryDom::new();
        let root = dom.document_root();
        let el = dom.append_new(root, "div");
        let mut resolver = TransitionResolver::new();

        let mut pending = run_transition(&mut dom, &mut resolver, el, false, |dom| {
            dom.set_attribute(el, "data-open", "");
        });
        assert!(dom.has_attribute(el, "data-open"));
        assert_eq!(pending.try_take(), Some(Ok(())));
        assert!(resolver.pending_elements().is_empty());
    }

    #[test]
    fn resolves_only_on_exact_target() {
        let mut dom = MemoryDom::new();
        let root = dom.document_root();
        let el = dom.append_new(root, "div");
        let child = dom.append_new(el, "span");
        let mut resolver = TransitionResolver::new();

        let mut pending = run_transition(&mut dom, &mut resolver, el, true, |_| {});
        assert_eq!(resolver.pending_elements(), vec![el]);

        assert!(!resolver.handle(&end(child)));
        assert_eq!(pending.try_take(), None);

        assert!(resolver.handle(&end(el)));
        assert_eq!(pending.try_take(), Some(Ok(())));
    }

    #[test]
    fn end_then_cancel_resolves_once() {
        let el = NodeId::new(3);
        let mut resolver = TransitionResolver::new();
        let mut pending = resolver.observe(el);

        assert!(resolver.handle(&DomEvent::TransitionCancel { target: el }));
        assert!(!resolver.handle(&end(el)));
        assert_eq!(pending.try_take(), Some(Ok(())));
        assert_eq!(pending.try_take(), None);
    }

    #[test]
    fn listener_registered_before_trigger() {
        let mut dom = MemoryDom::new();
        let root = dom.document_root();
        let el = dom.append_new(root, "div");
        let mut resolver = TransitionResolver::new();
        let mut seen = false;
        let _pending = run_transition(&mut dom, &mut resolver, el, true, |_| {
            seen = true;
        });
        assert!(seen);
        assert!(resolver.is_observing(el));
    }

    #[test]
    fn abandon_rejects_waiters() {
        let mut resolver = TransitionResolver::new();
        let mut pending = resolver.observe(NodeId::new(1));
        assert_eq!(resolver.abandon_all(), 1);
        assert_eq!(pending.try_take(), Some(Err(ModalError::Abandoned)));
    }

    #[test]
    fn non_transition_events_are_ignored() {
        let el = NodeId::new(2);
        let mut resolver = TransitionResolver::new();
        let _pending = resolver.observe(el);
        assert!(!resolver.handle(&DomEvent::Click { target: el }));
        assert!(resolver.is_observing(el));
    }

    #[test]
    fn override_beats_instance_setting() {
        let on = AnimationConfig::default();
        let off = AnimationConfig::off();
        assert!(CallOptions::new().animates(&on));
        assert!(!CallOptions::new().animates(&off));
        assert!(!CallOptions::instant().animates(&on));
        assert!(CallOptions::new().animated(true).animates(&off));
        let slide = CallOptions::new().animation_kind(AnimationKind::Slide);
        assert!(slide.animates(&off));
        assert_eq!(slide.kind(&on), AnimationKind::Slide);
        assert_eq!(CallOptions::new().kind(&on), on.kind);
    }
}
